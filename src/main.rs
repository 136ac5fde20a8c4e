use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{info, warn};

use dqi_engine::aggregate::AggregationLevel;
use dqi_engine::utils::logging::{create_level_progress_bar, finish_progress_bar};
use dqi_engine::{
    DqiEngine, EngineConfig, RunReport, WeightRegistry, generate_subject_table,
    read_subject_table_async, write_outputs,
};

#[global_allocator]
static ALLOC: snmalloc_rs::SnMalloc = snmalloc_rs::SnMalloc;

/// Score, classify and roll up a clinical trial subject table
#[derive(Debug, Parser)]
#[command(name = "dqi-engine", version, about)]
struct Args {
    /// Subject table in Parquet format
    #[arg(long, conflicts_with = "synthetic")]
    input: Option<PathBuf>,

    /// Directory the output tables and report are written to
    #[arg(long, default_value = "dqi-output")]
    output_dir: PathBuf,

    /// Engine configuration (JSON); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Weight registry (JSON); the built-in registry is used when omitted
    #[arg(long)]
    weights: Option<PathBuf>,

    /// Generate this many synthetic subjects instead of reading `--input`
    #[arg(long)]
    synthetic: Option<usize>,

    /// Seed for synthetic generation
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Worker threads for scoring and aggregation (0 = all cores)
    #[arg(long, default_value_t = 0)]
    threads: usize,
}

fn configure_thread_pool(threads: usize) {
    let threads = if threads == 0 { num_cpus::get() } else { threads };
    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
    {
        warn!("Thread pool already configured: {e}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    configure_thread_pool(args.threads);

    let config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let registry = match &args.weights {
        Some(path) => WeightRegistry::from_json_file(path, config.weight_tolerance)
            .with_context(|| format!("loading weights from {}", path.display()))?,
        None => WeightRegistry::default(),
    };
    info!("{config}");
    let engine = DqiEngine::new(registry, config)?;

    let subjects = match (&args.input, args.synthetic) {
        (Some(path), _) => read_subject_table_async(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?,
        (None, Some(n)) => generate_subject_table(n, args.seed, engine.registry())?,
        (None, None) => bail!("either --input or --synthetic is required"),
    };

    let start = Instant::now();
    let pb = create_level_progress_bar(AggregationLevel::ALL.len() as u64, Some("scoring"));
    let worker_pb = pb.clone();
    let worker_engine = engine.clone();
    let result = tokio::task::spawn_blocking(move || {
        worker_engine.run_with_progress(&subjects, |level| {
            worker_pb.set_message(format!("aggregating {level}"));
            worker_pb.inc(1);
        })
    })
    .await
    .context("scoring task panicked")??;
    finish_progress_bar(&pb, Some("done"));

    let report = RunReport::new(&engine, &result);
    let written = write_outputs(&args.output_dir, &result, &report)
        .with_context(|| format!("writing outputs to {}", args.output_dir.display()))?;

    for (level, rows) in &report.level_rows {
        info!("{level}: {rows} rows");
    }
    info!(
        "Scored {} subjects ({} overridden to High, {} issues) in {:?}; wrote {} files to {}",
        report.subject_count,
        report.override_count,
        report.issues.len(),
        start.elapsed(),
        written.len(),
        args.output_dir.display()
    );

    Ok(())
}
