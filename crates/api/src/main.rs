//! Nature Scene Classifier - Web UI Entry Point

use anyhow::Context;
use clap::Parser;
use scene_classifier::Predictor;
use scene_classifier_api::{init_logging, run_server, settings::Settings};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "scene-classifier-ui")]
#[command(version, about = "Web UI for the nature scene classifier")]
struct Args {
    /// Settings file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides the settings file
    #[arg(short, long)]
    bind: Option<String>,

    /// Model bundle directory, overrides the settings file
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        settings.server.bind_addr = bind;
    }
    if let Some(model_dir) = args.model_dir {
        settings.model.model_dir = model_dir;
    }
    settings.validate()?;

    info!("=== Nature Scene Classifier v{} ===", env!("CARGO_PKG_VERSION"));

    let predictor = Predictor::load(&settings.model).with_context(|| {
        format!(
            "Cannot serve without a model (looked in {})",
            settings.model.model_dir.display()
        )
    })?;

    run_server(settings, predictor).await
}
