//! Iris regression trainer CLI
//!
//! Trains a random forest on the transformed iris data, writes the model
//! artifact and its run metadata.

use anyhow::{Context, Result};
use clap::Parser;
use iris_trainer::{train, Settings, TrainingParams};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "iris-train")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train the petal length regressor and record run metadata", long_about = None)]
struct Args {
    /// Model file stem (without extension); also names the metadata file
    #[arg(short, long, default_value = "iris_rf")]
    model_name: String,

    /// Input data file name, inside the transformed-data directory
    #[arg(short, long, default_value = "iris.csv")]
    input: String,

    /// TOML file with data_transformed_dir / model_dir / metadata_dir
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of trees in the forest
    #[arg(long, default_value = "20")]
    trees: usize,

    /// Number of cross-validation folds
    #[arg(long, default_value = "5")]
    folds: usize,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins over --verbose
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!(
        "Iris trainer v{} (metadata v{})",
        iris_trainer::VERSION,
        iris_metadata::VERSION
    );

    let settings = Settings::load(args.config.as_deref()).context("Failed to load settings")?;
    info!(
        data = %settings.data_transformed_dir.display(),
        models = %settings.model_dir.display(),
        metadata = %settings.metadata_dir.display(),
        "resolved directories"
    );

    let mut params = TrainingParams::default();
    params.forest.n_estimators = args.trees;
    params.kfold.n_splits = args.folds;

    let outcome = train(&settings, &args.model_name, &args.input, &params)
        .with_context(|| format!("Training run '{}' failed", args.model_name))?;

    info!("✓ Training completed successfully");
    info!("  R² (cv): {:.4}", outcome.r2_cv);
    info!("  MSE (cv): {:.4}", outcome.mse_cv);
    info!("  Model: {} ({})", outcome.model_path.display(), outcome.model_hash);
    info!("  Metadata: {}", outcome.metadata_path.display());

    Ok(())
}
