// config.rs - Configuration file support

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::CliError;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    // Input/Output
    pub input: Option<String>,
    pub cross_input: Option<String>,
    pub output: Option<String>,

    // Core settings
    pub metric: Option<String>,
    pub format: Option<String>,
    pub sparse: Option<bool>,

    // Performance
    pub threads: Option<usize>,
    pub progress_every: Option<usize>,
    pub quiet: Option<bool>,

    // Filtering
    pub include: Option<String>,
    pub exclude: Option<String>,

    // Flags
    pub dry_run: Option<bool>,
}

impl Config {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;

        let config: Config = toml::from_str(&content).map_err(|e| {
            CliError::Configuration(format!("Failed to parse config file '{}': {}", path.display(), e))
        })?;

        println!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file '{}'", path.display()))?;

        println!("📄 Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Generate a sample configuration file with comments
    pub fn generate_sample() -> String {
        r#"# pairdist.toml - Configuration file for pairdist
# Command line arguments will override these settings

# =============================================================================
# INPUT/OUTPUT
# =============================================================================

# Sequences: FASTA, or one sequence per line (ids become seq_1, seq_2, ...)
input = "/path/to/sequences.fasta"

# Second sequence set; when present the output is the input x cross_input matrix
# cross_input = "/path/to/queries.fasta"

# Output distance matrix file
output = "distances.tsv"

# =============================================================================
# CORE SETTINGS
# =============================================================================

# Distance metric: hamming, p-distance, levenshtein, normalized-levenshtein
metric = "levenshtein"

# Output format: tsv, csv, phylip, condensed, json, coo
format = "tsv"

# Keep only strictly positive distances (self mode only; pairs with format = "coo")
sparse = false

# =============================================================================
# PERFORMANCE
# =============================================================================

# Worker threads (omit to use every core)
# threads = 8

# Progress report granularity in rows or pairs
progress_every = 100

# Hide the progress bar
quiet = false

# =============================================================================
# FILTERING
# =============================================================================

# Include only sequences whose id matches this regex
# include = "^IGHV"

# Exclude sequences whose id matches this regex
# exclude = "_partial$"

# =============================================================================
# FLAGS
# =============================================================================

# Validate inputs without computation (dry run)
dry_run = false
"#
        .to_string()
    }
}
