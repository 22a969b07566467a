//! Classifier configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default location of the model bundle, relative to the working directory
pub const DEFAULT_MODEL_DIR: &str = "models/nature_scene_classifier";

/// Model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory holding `manifest.json` and the ONNX graph
    pub model_dir: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
        }
    }
}

impl ModelConfig {
    /// Create config pointing at a specific bundle directory
    pub fn with_model_dir(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
        }
    }
}
