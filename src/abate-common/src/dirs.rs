//! Application directories for the console.
//!
//! Everything lives under `~/.abatedouro` unless `ABATE_HOME` points
//! somewhere else.

use std::path::PathBuf;

/// Primary home directory name.
pub const HOME_DIR_NAME: &str = ".abatedouro";

/// Environment variable overriding the home directory.
pub const HOME_ENV_VAR: &str = "ABATE_HOME";

/// Application directories structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDirs {
    /// Root directory; holds `config.toml`.
    pub home: PathBuf,
    /// Console state that must survive restarts (pending redirect, ...).
    pub state_dir: PathBuf,
    /// Default destination for exported artifacts.
    pub exports_dir: PathBuf,
}

impl AppDirs {
    /// Resolve the directories, honoring `ABATE_HOME`.
    ///
    /// A relative override is resolved against the current directory.
    pub fn new() -> Option<Self> {
        if let Ok(home) = std::env::var(HOME_ENV_VAR) {
            let home = PathBuf::from(home);
            let home = if home.is_relative() {
                std::env::current_dir().ok()?.join(home)
            } else {
                home
            };
            return Some(Self::rooted_at(home));
        }
        Some(Self::rooted_at(dirs::home_dir()?.join(HOME_DIR_NAME)))
    }

    /// Lay the directories out under `home`.
    pub fn rooted_at(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        Self {
            state_dir: home.join("state"),
            exports_dir: home.join("exports"),
            home,
        }
    }

    /// Path of the configuration file.
    pub fn config_file(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    /// Path of the persisted pending-redirect slot.
    pub fn redirect_slot_file(&self) -> PathBuf {
        self.state_dir.join("redirect_after_login")
    }

    /// Path of the persisted backend session cookie.
    pub fn session_cookie_file(&self) -> PathBuf {
        self.state_dir.join("session_cookie")
    }

    /// Create the directories that must exist before the console runs.
    pub fn ensure(&self) -> std::io::Result<()> {
        for dir in [&self.home, &self.state_dir] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}
