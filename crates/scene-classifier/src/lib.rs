//! Nature Scene Classifier
//!
//! Loads a pre-trained ONNX image classifier once and exposes its output as a
//! probability distribution over the model's label vocabulary:
//! - Model bundle loading (manifest + ONNX graph)
//! - Image preprocessing (resize, normalize, tensor layout)
//! - Prediction as an ordered label -> probability mapping

pub mod bundle;
pub mod config;
pub mod heuristic;
pub mod model;
pub mod onnx;
pub mod prediction;
pub mod predictor;
pub mod preprocess;

pub use bundle::{BundleManifest, InputSpec, ModelBundle, OutputKind, TensorLayout};
pub use config::{ModelConfig, DEFAULT_MODEL_DIR};
pub use heuristic::HeuristicModel;
pub use model::{ClassificationModel, ModelOutput};
pub use onnx::OnnxModel;
pub use prediction::Prediction;
pub use predictor::{decode_image, Predictor};

use std::path::PathBuf;
use thiserror::Error;

/// Classifier error types
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Model file not found at: {}", .0.display())]
    ModelNotFound(PathBuf),

    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Prediction failed: {0}")]
    PredictionFailed(String),
}

/// Coarse error taxonomy shared by every adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Model artifact missing or undeserializable (fatal at startup)
    ModelLoadFailure,
    /// Supplied image is absent or not a usable image
    InvalidInput,
    /// The model invocation itself failed
    PredictionFailure,
}

impl ErrorKind {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ModelLoadFailure => "model_load_failure",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::PredictionFailure => "prediction_failure",
        }
    }
}

impl ClassifierError {
    /// Error raised when no image was supplied at all
    pub fn missing_image() -> Self {
        ClassifierError::InvalidInput("Input image is None.".to_string())
    }

    /// Map this error onto the adapter-facing taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClassifierError::ModelNotFound(_) | ClassifierError::ModelLoad(_) => {
                ErrorKind::ModelLoadFailure
            }
            ClassifierError::InvalidInput(_) => ErrorKind::InvalidInput,
            ClassifierError::PredictionFailed(_) => ErrorKind::PredictionFailure,
        }
    }
}
