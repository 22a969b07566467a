//! Terminal adapter for the nature scene classifier
//!
//! Resolves an image path, decodes it and renders the prediction as aligned
//! `label: probability` lines.

use clap::Parser;
use scene_classifier::{ClassifierError, Prediction, Predictor, DEFAULT_MODEL_DIR};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Header printed above the results
pub const RESULTS_HEADER: &str = "🌿 Nature Scene Classifier — Prediction Results:";

/// CLI errors
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Image not found: {}", .0.display())]
    ImageNotFound(PathBuf),

    #[error("Could not open image: {0}")]
    OpenImage(String),

    #[error(transparent)]
    Classifier(#[from] ClassifierError),
}

#[derive(Parser, Debug)]
#[command(name = "classify")]
#[command(
    version,
    about = "Classify a nature image into one of the following categories: forest, beach, bird, fish."
)]
pub struct Cli {
    /// Path to the image file to classify.
    pub image_path: PathBuf,

    /// Model bundle directory
    #[arg(long, env = "SCENE_CLASSIFIER_MODEL_DIR", default_value = DEFAULT_MODEL_DIR)]
    pub model_dir: PathBuf,

    /// Enable verbose logging (stderr)
    #[arg(short, long)]
    pub verbose: bool,
}

/// Load an image from disk and return prediction probabilities
pub fn classify_image(predictor: &Predictor, image_path: &Path) -> Result<Prediction, CliError> {
    if !image_path.exists() {
        return Err(CliError::ImageNotFound(image_path.to_path_buf()));
    }

    let image = image::open(image_path).map_err(|e| CliError::OpenImage(e.to_string()))?;
    debug!(
        "Decoded {} ({}x{})",
        image_path.display(),
        image.width(),
        image.height()
    );

    Ok(predictor.predict(&image)?)
}

/// Render results as printed on success
pub fn render_results(prediction: &Prediction) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{}\n", RESULTS_HEADER);
    for (label, probability) in prediction.iter() {
        let _ = writeln!(out, "  {:<10}: {:.4}", label, probability);
    }
    out
}

/// Render an error as printed on failure
pub fn render_error(err: &dyn std::error::Error) -> String {
    format!("\nError: {}\n\n", err)
}
