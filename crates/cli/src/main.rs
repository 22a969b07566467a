//! Nature Scene Classifier - Terminal Entry Point

use clap::Parser;
use scene_classifier::{ModelConfig, Predictor};
use scene_classifier_cli::{classify_image, render_error, render_results, Cli};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let predictor = match Predictor::load(&ModelConfig::with_model_dir(&cli.model_dir)) {
        Ok(predictor) => predictor,
        Err(e) => {
            print!("{}", render_error(&e));
            return ExitCode::FAILURE;
        }
    };

    match classify_image(&predictor, &cli.image_path) {
        Ok(prediction) => {
            print!("{}", render_results(&prediction));
            println!();
            ExitCode::SUCCESS
        }
        Err(e) => {
            print!("{}", render_error(&e));
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr so stdout only carries results
fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}
