//! Process-level plumbing for the console: layered configuration, logging
//! setup and home directory resolution.

pub mod config;
pub mod logging;
pub mod paths;

pub use config::{
    default_logging_config, ApiConfig, CliArgs, ConsoleConfig, ListsConfig, LoggingConfig, Section,
    TypeaheadConfig,
};
pub use logging::init_logging_from_config;
