//! Common utilities shared across the Abatedouro console crates.

pub mod config;
pub mod dirs;
pub mod format;
pub mod http_client;

pub use config::{
    ConfigError, ConsoleConfig, DEVELOPMENT_API_URL, Environment, ExportSettings, GuardTimings,
    PRODUCTION_API_URL,
};
pub use dirs::AppDirs;
pub use format::{
    ZERO_CURRENCY, ZERO_WEIGHT, format_currency, format_date, format_date_time, format_number,
    format_weight,
};
pub use http_client::{DEFAULT_TIMEOUT, USER_AGENT, create_client_builder};
