//! HTTP client factory for talking to the console backend.
//!
//! The backend keeps the login in an http-only `session` cookie, so every
//! client built here carries a cookie store: the cookie set by
//! `/auth/login` is replayed on `/auth/me` and cleared by `/auth/logout`.

use reqwest::Client;
use std::time::Duration;

/// User-Agent string for all HTTP requests
pub const USER_AGENT: &str = concat!("abatedouro-console/", env!("CARGO_PKG_VERSION"));

/// Default timeout for API requests (30 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connect timeout; the hosted backend sleeps when idle and takes a while to wake.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection pool idle timeout so DNS is re-resolved periodically.
pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Creates a client builder with the standard configuration.
pub fn create_client_builder() -> reqwest::ClientBuilder {
    Client::builder()
        .user_agent(USER_AGENT)
        .cookie_store(true)
        .timeout(DEFAULT_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .tcp_nodelay(true)
        .pool_idle_timeout(POOL_IDLE_TIMEOUT)
        .pool_max_idle_per_host(4)
}
