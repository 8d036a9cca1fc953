//! Process-wide plumbing shared by the grading crates: environment configuration
//! and logging setup.

pub mod config;
pub mod logger;

pub use config::AppConfig;
pub use logger::{LoggingError, init_logging};
