//! Constants for the abate-session crate.

/// Guest-only entry destination (the login screen).
pub const ENTRY_PATH: &str = "/";

/// Authenticated landing destination.
pub const HOME_PATH: &str = "/home";

/// Identity lookup endpoint, relative to the API base URL.
pub const ME_ENDPOINT: &str = "/auth/me";

/// Login endpoint; sets the session cookie on success.
pub const LOGIN_ENDPOINT: &str = "/auth/login";

/// Logout endpoint; clears the session cookie.
pub const LOGOUT_ENDPOINT: &str = "/auth/logout";

/// Account registration endpoint.
pub const REGISTER_ENDPOINT: &str = "/auth/register";

/// Name of the cookie the backend keeps the login in.
pub const SESSION_COOKIE: &str = "session";

/// Guard redirects followed by one navigation before giving up.
pub const MAX_GUARD_REDIRECTS: usize = 8;
