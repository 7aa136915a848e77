// validation.rs - Input validation utilities

use regex::Regex;

use crate::cli::args::Args;
use crate::cli::CliError;
use crate::core::DEFAULT_PROGRESS_EVERY;
use crate::metrics::MetricRegistry;
use crate::output::OutputFormat;

/// Which builder a run dispatches to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Full symmetric matrix of one sequence set
    SelfDense,
    /// Positive self-distances only
    SelfSparse,
    /// Rectangular input x cross-input matrix
    Cross,
}

#[derive(Debug)]
pub struct ValidationResult {
    pub mode: RunMode,
    pub format: OutputFormat,
    pub progress_every: usize,
    pub include_regex: Option<Regex>,
    pub exclude_regex: Option<Regex>,
}

fn invalid(message: impl Into<String>) -> CliError {
    CliError::Configuration(message.into())
}

fn compile(pattern: Option<&str>, what: &str) -> Result<Option<Regex>, CliError> {
    pattern
        .map(|p| Regex::new(p).map_err(|e| invalid(format!("Invalid {} regex: {}", what, e))))
        .transpose()
}

/// Validate all command line arguments
pub fn validate_args(args: &Args) -> Result<ValidationResult, CliError> {
    // Validate metric
    let registry = MetricRegistry::new();
    if !registry.has(&args.metric) {
        return Err(invalid(format!(
            "Invalid metric '{}'. Available: {}",
            args.metric,
            registry.names().join(", ")
        )));
    }

    let format: OutputFormat = args.format.parse().map_err(invalid)?;

    let mode = match (&args.cross_input, args.sparse) {
        (Some(_), true) => {
            return Err(invalid("--sparse is not compatible with --cross-input (sparse output covers self-distances only)"));
        }
        (Some(_), false) => RunMode::Cross,
        (None, true) => RunMode::SelfSparse,
        (None, false) => RunMode::SelfDense,
    };

    if format.is_sparse() && mode != RunMode::SelfSparse {
        return Err(invalid(format!("--format {} requires --sparse", format)));
    }
    if mode == RunMode::Cross && format.requires_square() {
        return Err(invalid(format!(
            "--format {} describes a square self-distance matrix; use tsv, csv or json with --cross-input",
            format
        )));
    }

    if args.threads == Some(0) {
        return Err(invalid("--threads must be at least 1"));
    }
    let progress_every = args.progress_every.unwrap_or(DEFAULT_PROGRESS_EVERY);
    if progress_every == 0 {
        return Err(invalid("--progress-every must be at least 1"));
    }

    Ok(ValidationResult {
        mode,
        format,
        progress_every,
        include_regex: compile(args.include.as_deref(), "include")?,
        exclude_regex: compile(args.exclude.as_deref(), "exclude")?,
    })
}
