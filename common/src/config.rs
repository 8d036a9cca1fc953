//! Global process configuration.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton holding the
//! settings that come from `.env` and the environment. Grading inputs live in the
//! run configuration file instead (see `util::config`).

use once_cell::sync::OnceCell;
use std::env;
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub project_name: String,
    /// An `EnvFilter` directive such as `info` or `marker=debug,info`.
    pub log_level: String,
    pub log_file: String,
    pub log_dir: String,
    pub log_to_stdout: bool,
}

static CONFIG_INSTANCE: OnceCell<RwLock<AppConfig>> = OnceCell::new();

fn flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    /// Unset variables fall back to defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            project_name: env::var("PROJECT_NAME").unwrap_or_else(|_| "grade-runner".into()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "grade_runner.log".into()),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".into()),
            log_to_stdout: env::var("LOG_TO_STDOUT").map(|v| flag(&v)).unwrap_or(true),
        }
    }

    /// Returns a shared reference to the global configuration.
    pub fn global() -> RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Reloads the configuration from the environment, dropping any overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            let mut guard = lock.write().unwrap_or_else(PoisonError::into_inner);
            *guard = AppConfig::from_env();
        }
    }

    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock.write().unwrap_or_else(PoisonError::into_inner);
        setter(&mut guard);
    }

    /// Overrides `LOG_LEVEL` for the rest of the process.
    pub fn set_log_level(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.log_level = value.into());
    }

    pub fn set_log_file(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.log_file = value.into());
    }

    pub fn set_log_dir(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.log_dir = value.into());
    }

    pub fn set_log_to_stdout(value: bool) {
        AppConfig::set_field(|cfg| cfg.log_to_stdout = value);
    }
}
