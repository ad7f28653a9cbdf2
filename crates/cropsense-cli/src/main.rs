//! CropSense CLI
//!
//! Loads the model registry once, reads an input record as JSON and prints
//! a robustness evaluation report.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cropsense_eval::EvaluationRunner;
use cropsense_models::ModelRegistry;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::process::ExitCode;
use tracing::{error, info};

mod config;

#[derive(Parser, Debug)]
#[command(name = "cropsense")]
#[command(about = "Crop recommendation robustness evaluation", long_about = None)]
pub struct Cli {
    /// Model registry configuration file
    #[arg(short, long, env = "CROPSENSE_MODELS", default_value = "models.yaml")]
    models: String,

    /// Evaluation configuration file
    #[arg(short, long, env = "CROPSENSE_CONFIG")]
    config: Option<String>,

    /// Input record as JSON (`-` for stdin)
    #[arg(short, long, default_value = "-")]
    input: String,

    /// Override the number of noise runs
    #[arg(short, long)]
    runs: Option<usize>,

    /// Seed for reproducible noise
    #[arg(short, long)]
    seed: Option<u64>,

    /// Override the base model (rf, xgb, svm, mlp)
    #[arg(short, long)]
    base_model: Option<String>,

    /// Print a Prometheus snapshot of the run's metrics to stderr
    #[arg(long)]
    metrics: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Stability under N/P/K noise
    Noise,

    /// Stability at each configured noise level
    NoiseLevels,

    /// Sensitivity to missing inputs
    Missing,

    /// Agreement across all models
    Agreement,

    /// All axes plus aggregated confidence
    Full,
}

/// Structured error printed for rejected input
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<cropsense_core::Error>() {
            Some(core) if core.is_client_error() => {
                let body = ErrorBody {
                    error: core.code(),
                    message: core.to_string(),
                };
                match serde_json::to_string_pretty(&body) {
                    Ok(json) => println!("{}", json),
                    Err(_) => eprintln!("{}", core),
                }
                ExitCode::from(2)
            }
            _ => {
                error!("{:#}", e);
                ExitCode::FAILURE
            }
        },
    }
}

async fn run(cli: Cli) -> Result<()> {
    info!("Starting CropSense evaluation");

    let metrics_handle = if cli.metrics {
        Some(init_metrics()?)
    } else {
        None
    };

    // Load configuration
    let config = config::load_evaluation_config(&cli)?;
    info!(
        "Configuration loaded: base model {}, {} noise runs, {}ms axis budget",
        config.base_model, config.noise.runs, config.timeout_ms
    );

    // Registry loads once; any missing or incompatible artifact aborts here
    let registry = ModelRegistry::from_file(&cli.models)
        .with_context(|| format!("Failed to load model registry from {}", cli.models))?
        .into_shared();

    let record = config::read_input(&cli.input)?;
    let runner = EvaluationRunner::new(registry, config)?;

    let output = match cli.command {
        Command::Noise => serde_json::to_string_pretty(&runner.noise(&record).await?)?,
        Command::NoiseLevels => {
            serde_json::to_string_pretty(&runner.noise_levels(&record).await?)?
        }
        Command::Missing => serde_json::to_string_pretty(&runner.missing(&record).await?)?,
        Command::Agreement => serde_json::to_string_pretty(&runner.agreement(&record).await?)?,
        Command::Full => serde_json::to_string_pretty(&runner.full(&record).await?)?,
    };
    println!("{}", output);

    if let Some(handle) = metrics_handle {
        eprintln!("{}", handle.render());
    }

    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("cropsense=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cropsense=info"))
    };

    // stdout carries the report
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Install an in-process recorder whose snapshot is printed after the run
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "cropsense_evaluations_total",
        "Total number of evaluations by operation"
    );
    metrics::describe_counter!(
        "cropsense_axis_failures_total",
        "Evaluation axes that failed or timed out, by axis and error code"
    );
    metrics::describe_histogram!(
        "cropsense_evaluation_latency_us",
        metrics::Unit::Microseconds,
        "Evaluation latency in microseconds by operation"
    );
    metrics::describe_counter!(
        "cropsense_inferences_total",
        "Model inferences by model id"
    );

    info!("Metrics recorder initialized");
    Ok(handle)
}
