// merge.rs - Merge configuration file with CLI arguments

use anyhow::Result;

use crate::cli::args::{DEFAULT_FORMAT, DEFAULT_METRIC};
use crate::cli::{Args, Config};

impl Args {
    /// Merge with configuration from file
    /// CLI arguments take precedence over config file values
    pub fn merge_with_config(mut self, config: Config) -> Self {
        // Input/Output
        if self.input.is_none() {
            self.input = config.input;
        }
        if self.cross_input.is_none() {
            self.cross_input = config.cross_input;
        }
        if self.output.is_none() {
            self.output = config.output;
        }

        // Core settings (only override defaults, not explicit CLI values)
        if let Some(metric) = config.metric {
            if self.metric == DEFAULT_METRIC {
                self.metric = metric;
            }
        }
        if let Some(format) = config.format {
            if self.format == DEFAULT_FORMAT {
                self.format = format;
            }
        }

        // Performance
        if self.threads.is_none() {
            self.threads = config.threads;
        }
        if self.progress_every.is_none() {
            self.progress_every = config.progress_every;
        }

        // Filtering
        if self.include.is_none() {
            self.include = config.include;
        }
        if self.exclude.is_none() {
            self.exclude = config.exclude;
        }

        // Flags (config can only switch them on)
        if !self.sparse && config.sparse.unwrap_or(false) {
            self.sparse = true;
        }
        if !self.quiet && config.quiet.unwrap_or(false) {
            self.quiet = true;
        }
        if !self.dry_run && config.dry_run.unwrap_or(false) {
            self.dry_run = true;
        }

        self
    }

    /// Load configuration and merge with CLI args
    pub fn with_config_file(self, config_path: &str) -> Result<Self> {
        let config = Config::from_file(config_path)?;
        Ok(self.merge_with_config(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli() -> Args {
        Args {
            metric: DEFAULT_METRIC.to_string(),
            format: DEFAULT_FORMAT.to_string(),
            ..Args::default()
        }
    }

    #[test]
    fn test_config_fills_gaps() {
        let config = Config {
            input: Some("seqs.fa".to_string()),
            metric: Some("hamming".to_string()),
            threads: Some(6),
            sparse: Some(true),
            ..Config::new()
        };
        let args = cli().merge_with_config(config);
        assert_eq!(args.input.as_deref(), Some("seqs.fa"));
        assert_eq!(args.metric, "hamming");
        assert_eq!(args.threads, Some(6));
        assert!(args.sparse);
        assert_eq!(args.format, DEFAULT_FORMAT);
    }

    #[test]
    fn test_cli_wins() {
        let mut args = cli();
        args.input = Some("cli.fa".to_string());
        args.format = "json".to_string();
        args.threads = Some(2);

        let config = Config {
            input: Some("config.fa".to_string()),
            format: Some("csv".to_string()),
            threads: Some(16),
            quiet: Some(false),
            ..Config::new()
        };
        let args = args.merge_with_config(config);
        assert_eq!(args.input.as_deref(), Some("cli.fa"));
        assert_eq!(args.format, "json");
        assert_eq!(args.threads, Some(2));
        assert!(!args.quiet);
    }
}
