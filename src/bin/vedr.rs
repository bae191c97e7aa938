//! vedr: run an ambiguity evaluation against a chat model.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use vedrfolnir::config::{Config, Secrets};
use vedrfolnir::{Evaluator, PositionalClassifier, SelectionClient, dataset};

/// Evaluate an LLM's ability to resolve linguistic ambiguity in function selection
#[derive(Parser)]
#[command(name = "vedr")]
#[command(version)]
#[command(about = "Evaluate LLM function selection on ambiguous prompts")]
struct Args {
    /// Path to the CSV file containing ambiguous prompts
    #[arg(long)]
    csv: PathBuf,

    /// Directory to save evaluation reports
    #[arg(long, default_value = "results")]
    output_dir: PathBuf,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model to query (overrides config)
    #[arg(short, long, env = "VEDR_MODEL")]
    model: Option<String>,

    /// Selection calls in flight at once (overrides config)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Sampling seed sent with every request (overrides config)
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: info; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // A missing .env file is fine; the key may already be in the environment.
    dotenv::dotenv().ok();
    let api_key = Secrets::load()?.require_api_key()?;

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(model) = args.model {
        config.provider.model = model;
    }
    if let Some(concurrency) = args.concurrency {
        config.evaluation.concurrency = concurrency;
    }
    if args.seed.is_some() {
        config.provider.seed = args.seed;
    }

    let provider = config.build_provider(&api_key)?;
    let client = SelectionClient::new(provider).with_options(config.chat_options());
    let evaluator = Evaluator::with_settings(client, config.settings());

    let records = dataset::load_path(&args.csv, &config.columns(), &PositionalClassifier)?;
    info!(
        records = records.len(),
        model = %config.provider.model,
        "starting evaluation"
    );

    evaluator.run(&records).await;

    let report = evaluator.report();
    println!("\n{report}");
    let path = report.save(&args.output_dir)?;
    println!("\nReport saved to: {}", path.display());

    Ok(())
}
