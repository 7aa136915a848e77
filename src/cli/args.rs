// args.rs - Command line arguments definition

use argh::FromArgs;

pub const DEFAULT_METRIC: &str = "levenshtein";
pub const DEFAULT_FORMAT: &str = "tsv";

#[derive(FromArgs, Debug, Default)]
/// pairdist - Parallel pairwise distance matrix calculator
pub struct Args {
    /// input sequences (FASTA, or one sequence per line)
    #[argh(option)]
    pub input: Option<String>,

    /// second sequence file; computes the rectangular input x cross-input matrix
    #[argh(option)]
    pub cross_input: Option<String>,

    /// output distance matrix file
    #[argh(option)]
    pub output: Option<String>,

    /// distance metric: hamming, p-distance, levenshtein, normalized-levenshtein (default: levenshtein)
    #[argh(option, default = "String::from(DEFAULT_METRIC)")]
    pub metric: String,

    /// output format: tsv, csv, phylip, condensed, json, coo (default: tsv)
    #[argh(option, default = "String::from(DEFAULT_FORMAT)")]
    pub format: String,

    /// keep only strictly positive distances (sparse builder, self mode only)
    #[argh(switch)]
    pub sparse: bool,

    /// number of worker threads (default: auto-detect)
    #[argh(option)]
    pub threads: Option<usize>,

    /// report progress every N rows or pairs (default: 100)
    #[argh(option)]
    pub progress_every: Option<usize>,

    /// hide the progress bar
    #[argh(switch)]
    pub quiet: bool,

    /// include only sequences whose id matches this regex
    #[argh(option)]
    pub include: Option<String>,

    /// exclude sequences whose id matches this regex
    #[argh(option)]
    pub exclude: Option<String>,

    /// validate inputs without computation (dry run)
    #[argh(switch)]
    pub dry_run: bool,

    /// list available metrics and exit
    #[argh(switch)]
    pub list_metrics: bool,

    /// path to TOML configuration file
    #[argh(option)]
    pub config: Option<String>,

    /// generate sample configuration file and exit
    #[argh(switch)]
    pub generate_config: bool,
}
