// mod.rs - CLI module

use thiserror::Error;

pub mod args;
pub mod config;
pub mod merge;
pub mod validation;

// Re-export main types for convenience
pub use args::Args;
pub use config::Config;
pub use validation::{validate_args, RunMode, ValidationResult};

/// Problems with the requested run itself, as opposed to I/O or compute failures
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{0} is required")]
    MissingArgument(&'static str),
}
