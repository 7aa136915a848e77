// main.rs - CLI entry point

use std::path::Path;
use std::process;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use pairdist::cli::{validate_args, Args, CliError, Config, RunMode, ValidationResult};
use pairdist::core::{
    dense_cross, dense_self, is_worker_thread, pair_count, sparse_self, DispatchOptions, EngineError,
    InterruptHandle,
};
use pairdist::data::{filter_records, load_sequences, SequenceRecord};
use pairdist::metrics::{MetricRegistry, SequenceMetric};
use pairdist::output::{write_matrix, write_sparse};

fn main() {
    init_logging();
    install_panic_hook();

    if let Err(e) = run_main() {
        if !already_reported(&e) {
            eprintln!("❌ ERROR: {:#}", e);
        }
        process::exit(exit_code(&e));
    }
}

/// Panics inside pool workers come back as `WorkerFailure`; keep the default
/// hook for every other thread.
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let in_worker = std::thread::current().name().is_some_and(is_worker_thread);
        if !in_worker {
            default_hook(info);
        }
    }));
}

/// Engine failures were logged once by the builder that stopped.
fn already_reported(err: &anyhow::Error) -> bool {
    err.downcast_ref::<EngineError>().is_some()
}

/// `PAIRDIST_LOG`, then `RUST_LOG`, then `info`
fn init_logging() {
    let level = std::env::var("PAIRDIST_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(engine_error) = err.downcast_ref::<EngineError>() {
        return match engine_error {
            EngineError::InvalidInput(_) => 2,
            EngineError::WorkerFailure { .. } => 4,
            EngineError::Interrupted => 130,
            EngineError::ThreadPool(_) => 1,
        };
    }
    if err.downcast_ref::<CliError>().is_some() {
        return 2;
    }
    if err.chain().any(|cause| cause.downcast_ref::<std::io::Error>().is_some()) {
        return 3;
    }
    1
}

fn run_main() -> Result<()> {
    let mut args: Args = argh::from_env();
    let command_line = std::env::args().collect::<Vec<String>>().join(" ");

    // Handle generate config first
    if args.generate_config {
        println!("{}", Config::generate_sample());
        println!("\n💡 Save this content to a .toml file and use --config /path/to/config.toml");
        return Ok(());
    }

    if let Some(config_path) = args.config.clone() {
        args = args.with_config_file(&config_path)?;
    }

    let registry = MetricRegistry::new();
    if args.list_metrics {
        println!("📐 Available metrics:");
        for (name, description) in registry.list() {
            println!("  - {}: {}", name, description);
        }
        return Ok(());
    }

    let validation = validate_args(&args)?;
    let input = args.input.as_deref().ok_or(CliError::MissingArgument("--input"))?;
    let metric = registry
        .get(&args.metric)
        .ok_or_else(|| CliError::Configuration(format!("Invalid metric '{}'", args.metric)))?;

    println!("🚀 pairdist v{}", pairdist::VERSION);
    match args.threads {
        Some(n) => println!("🧵 Threads: {}", n),
        None => println!("🧵 Threads: {} (auto-detected)", num_cpus::get()),
    }
    println!("📐 Metric: {} ({})", args.metric, metric.description());

    let total_start = Instant::now();

    let left = load_filtered(Path::new(input), &validation)?;
    let right = match &args.cross_input {
        Some(path) => Some(load_filtered(Path::new(path), &validation)?),
        None => None,
    };
    check_lengths(metric, &left, right.as_deref())?;

    // every builder hands out rows of the first input
    let units = left.len();
    let pairs = planned_evaluations(left.len(), right.as_ref().map(Vec::len));

    if args.dry_run {
        println!("✅ Dry run completed successfully");
        println!(
            "📊 Planned: {:?}, {} distance evaluations, output format {}",
            validation.mode, pairs, validation.format
        );
        return Ok(());
    }
    let output = args
        .output
        .as_deref()
        .map(Path::new)
        .ok_or(CliError::MissingArgument("--output"))?;

    let interrupt = InterruptHandle::new();
    interrupt
        .install_signal_handler()
        .context("Failed to install signal handler")?;

    let progress = progress_bar(units, args.quiet)?;
    let mut options = DispatchOptions::default().with_interrupt(interrupt);
    if let Some(n) = args.threads {
        options = options.with_workers(n);
    }
    options.progress_every = validation.progress_every;
    if let Some(pb) = &progress {
        let pb = pb.clone();
        options = options.with_progress(
            validation.progress_every,
            Arc::new(move |claimed: usize, _total: usize| {
                let position = claimed as u64;
                if position > pb.position() {
                    pb.set_position(position);
                }
            }),
        );
    }

    println!("🎯 Computing {} distances ({:?})", pairs, validation.mode);
    let compute_start = Instant::now();
    let distance = |a: &SequenceRecord, b: &SequenceRecord| metric.distance(&a.seq, &b.seq);
    let left_labels = labels(&left);

    match (validation.mode, &right) {
        (RunMode::Cross, Some(right)) => {
            let matrix = dense_cross(&left, right, distance, &options);
            finish_progress(&progress);
            let matrix = matrix?;
            report_compute(pairs, compute_start);
            write_matrix(output, validation.format, &left_labels, &labels(right), &matrix, &command_line)?;
        }
        (RunMode::SelfSparse, _) => {
            let matrix = sparse_self(&left, distance, &options);
            finish_progress(&progress);
            let matrix = matrix?;
            report_compute(pairs, compute_start);
            println!("🔍 Kept {} positive pairs", matrix.nnz() / 2);
            write_sparse(output, validation.format, &left_labels, &matrix, &command_line)?;
        }
        _ => {
            let matrix = dense_self(&left, distance, &options);
            finish_progress(&progress);
            let matrix = matrix?;
            report_compute(pairs, compute_start);
            write_matrix(output, validation.format, &left_labels, &left_labels, &matrix, &command_line)?;
        }
    }

    println!("⏱️ Total time: {:.2}s", total_start.elapsed().as_secs_f64());
    Ok(())
}

fn load_filtered(path: &Path, validation: &ValidationResult) -> Result<Vec<SequenceRecord>> {
    let records = load_sequences(path).with_context(|| format!("Failed to load sequences from {}", path.display()))?;
    let total = records.len();
    let kept = filter_records(
        records,
        validation.include_regex.as_ref(),
        validation.exclude_regex.as_ref(),
    );
    println!(
        "🧬 Loaded {} sequences from {} ({} after filtering)",
        total,
        path.display(),
        kept.len()
    );
    Ok(kept)
}

/// Length-sensitive metrics fail on the first unequal pair; catch that before spawning workers.
fn check_lengths(metric: &dyn SequenceMetric, left: &[SequenceRecord], right: Option<&[SequenceRecord]>) -> Result<()> {
    if !metric.requires_equal_length() {
        return Ok(());
    }
    let mut all = left.iter().chain(right.unwrap_or_default());
    if let Some(first) = all.next() {
        if let Some(other) = all.find(|r| r.len() != first.len()) {
            return Err(CliError::Configuration(format!(
                "{} needs equal-length sequences: '{}' has length {}, '{}' has length {}",
                metric.name(),
                first.id,
                first.len(),
                other.id,
                other.len()
            ))
            .into());
        }
    }
    Ok(())
}

fn planned_evaluations(left: usize, right: Option<usize>) -> usize {
    match right {
        Some(right) => left.saturating_mul(right),
        None => pair_count(left),
    }
}

fn labels(records: &[SequenceRecord]) -> Vec<String> {
    records.iter().map(|r| r.id.clone()).collect()
}

fn progress_bar(units: usize, quiet: bool) -> Result<Option<ProgressBar>> {
    if quiet || units == 0 {
        return Ok(None);
    }
    let pb = ProgressBar::new(units as u64);
    pb.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
            .context("Invalid progress bar template")?,
    );
    Ok(Some(pb))
}

fn finish_progress(progress: &Option<ProgressBar>) {
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
}

fn report_compute(pairs: usize, start: Instant) {
    let elapsed = start.elapsed().as_secs_f64();
    debug!("{} distance evaluations in {:.3}s", pairs, elapsed);
    println!("✅ Distances computed in {:.2}s", elapsed);
}
