//! Model bundle: manifest plus ONNX graph on disk
//!
//! A bundle is a directory laid out as:
//!
//! ```text
//! models/nature_scene_classifier/
//!   manifest.json
//!   model.onnx
//! ```
//!
//! The manifest is the source of the label vocabulary. Its order defines the
//! positional correspondence with the model's output vector.

use crate::ClassifierError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Manifest file name inside a bundle directory
pub const MANIFEST_FILE: &str = "manifest.json";

/// Memory layout of the input tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TensorLayout {
    /// 1 x 3 x H x W (PyTorch / fastai exports)
    #[default]
    Nchw,
    /// 1 x H x W x 3 (TensorFlow exports)
    Nhwc,
}

/// What the graph's first output holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// Already a probability distribution
    #[default]
    Probabilities,
    /// Raw scores, softmax is applied after inference
    Logits,
}

/// Input geometry and normalization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSpec {
    pub width: u32,
    pub height: u32,
    pub layout: TensorLayout,
    /// Per-channel mean (RGB, in 0..1 units)
    pub mean: Vec<f32>,
    /// Per-channel standard deviation (RGB, in 0..1 units)
    pub std: Vec<f32>,
}

impl Default for InputSpec {
    fn default() -> Self {
        // ImageNet statistics, as applied by fastai vision learners
        Self {
            width: 224,
            height: 224,
            layout: TensorLayout::Nchw,
            mean: vec![0.485, 0.456, 0.406],
            std: vec![0.229, 0.224, 0.225],
        }
    }
}

fn default_model_file() -> String {
    "model.onnx".to_string()
}

/// Bundle manifest (`manifest.json`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleManifest {
    /// Model name, used in logs and the health endpoint
    pub name: String,
    /// Ordered label vocabulary
    pub labels: Vec<String>,
    #[serde(default)]
    pub input: InputSpec,
    #[serde(default)]
    pub output: OutputKind,
    /// Graph file name, relative to the bundle directory
    #[serde(default = "default_model_file")]
    pub model_file: String,
}

impl BundleManifest {
    /// Check the invariants the predictor relies on
    pub fn validate(&self) -> Result<(), ClassifierError> {
        if self.labels.is_empty() {
            return Err(ClassifierError::ModelLoad(
                "manifest declares no labels".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(self.labels.len());
        for label in &self.labels {
            if !seen.insert(label.as_str()) {
                return Err(ClassifierError::ModelLoad(format!(
                    "duplicate label in manifest: {}",
                    label
                )));
            }
        }

        if self.input.width == 0 || self.input.height == 0 {
            return Err(ClassifierError::ModelLoad(format!(
                "invalid input size {}x{}",
                self.input.width, self.input.height
            )));
        }

        if self.input.mean.len() != 3 || self.input.std.len() != 3 {
            return Err(ClassifierError::ModelLoad(
                "normalization mean and std must have 3 channels".to_string(),
            ));
        }

        if self.input.std.iter().any(|s| *s <= 0.0) {
            return Err(ClassifierError::ModelLoad(
                "normalization std must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// A validated bundle on disk
#[derive(Debug, Clone)]
pub struct ModelBundle {
    dir: PathBuf,
    manifest: BundleManifest,
}

impl ModelBundle {
    /// Open a bundle directory and read its manifest
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        let dir = dir.as_ref();
        let manifest_path = dir.join(MANIFEST_FILE);

        if !manifest_path.is_file() {
            return Err(ClassifierError::ModelNotFound(manifest_path));
        }

        let raw = std::fs::read_to_string(&manifest_path).map_err(|e| {
            ClassifierError::ModelLoad(format!("{}: {}", manifest_path.display(), e))
        })?;

        let manifest: BundleManifest = serde_json::from_str(&raw).map_err(|e| {
            ClassifierError::ModelLoad(format!("{}: {}", manifest_path.display(), e))
        })?;
        manifest.validate()?;

        let bundle = Self {
            dir: dir.to_path_buf(),
            manifest,
        };

        let graph = bundle.model_path();
        if !graph.is_file() {
            return Err(ClassifierError::ModelNotFound(graph));
        }

        Ok(bundle)
    }

    /// Bundle directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Parsed manifest
    pub fn manifest(&self) -> &BundleManifest {
        &self.manifest
    }

    /// Full path of the ONNX graph
    pub fn model_path(&self) -> PathBuf {
        self.dir.join(&self.manifest.model_file)
    }
}
