//! Predictor: validate an image, run the model, reshape the output

use crate::bundle::ModelBundle;
use crate::config::ModelConfig;
use crate::model::ClassificationModel;
use crate::onnx::OnnxModel;
use crate::prediction::Prediction;
use crate::ClassifierError;
use image::DynamicImage;
use std::sync::Arc;

/// Handle to a loaded, read-only classification model.
///
/// Cloning is cheap; every clone shares the same model.
#[derive(Clone)]
pub struct Predictor {
    model: Arc<dyn ClassificationModel>,
}

impl std::fmt::Debug for Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predictor")
            .field("model", &self.model.name())
            .field("labels", &self.model.labels())
            .finish()
    }
}

impl Predictor {
    /// Load the ONNX bundle named by the configuration
    pub fn load(config: &ModelConfig) -> Result<Self, ClassifierError> {
        let bundle = ModelBundle::open(&config.model_dir)?;
        let model = OnnxModel::from_bundle(&bundle)?;
        Ok(Self::from_model(model))
    }

    /// Wrap an already constructed model
    pub fn from_model(model: impl ClassificationModel + 'static) -> Self {
        Self {
            model: Arc::new(model),
        }
    }

    /// Model name
    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Ordered label vocabulary
    pub fn labels(&self) -> &[String] {
        self.model.labels()
    }

    /// Predict the probability of every label for one image.
    ///
    /// Accepts `&DynamicImage` or `None`; a missing or empty image is rejected
    /// with [`ClassifierError::InvalidInput`] before the model is touched.
    pub fn predict<'a>(
        &self,
        image: impl Into<Option<&'a DynamicImage>>,
    ) -> Result<Prediction, ClassifierError> {
        let image = image.into().ok_or_else(ClassifierError::missing_image)?;

        if image.width() == 0 || image.height() == 0 {
            return Err(ClassifierError::InvalidInput(format!(
                "Expected a non-empty image, got {}x{}",
                image.width(),
                image.height()
            )));
        }

        let output = self.model.infer(image).map_err(|e| match e {
            ClassifierError::PredictionFailed(_) => e,
            other => ClassifierError::PredictionFailed(other.to_string()),
        })?;

        let labels = self.model.labels();
        if output.probabilities.len() != labels.len() {
            return Err(ClassifierError::PredictionFailed(format!(
                "model produced {} scores for {} labels",
                output.probabilities.len(),
                labels.len()
            )));
        }

        Ok(Prediction::from_parts(labels, &output.probabilities))
    }
}

/// Decode an encoded image (PNG, JPEG, ...) into a pixel grid
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, ClassifierError> {
    if bytes.is_empty() {
        return Err(ClassifierError::missing_image());
    }

    image::load_from_memory(bytes)
        .map_err(|e| ClassifierError::InvalidInput(format!("Could not decode image: {}", e)))
}
