//! Classification model abstraction

use crate::ClassifierError;
use image::DynamicImage;

/// Raw output of a single-image inference
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutput {
    /// Most probable label
    pub top_label: String,
    /// Index of the most probable label in the vocabulary
    pub top_index: usize,
    /// Probability for each vocabulary label, in vocabulary order
    pub probabilities: Vec<f32>,
}

impl ModelOutput {
    /// Build an output from a probability vector, picking the argmax as top class
    pub fn from_probabilities(
        labels: &[String],
        probabilities: Vec<f32>,
    ) -> Result<Self, ClassifierError> {
        if labels.is_empty() {
            return Err(ClassifierError::PredictionFailed(
                "model has an empty label vocabulary".to_string(),
            ));
        }

        if probabilities.len() != labels.len() {
            return Err(ClassifierError::PredictionFailed(format!(
                "model produced {} scores for {} labels",
                probabilities.len(),
                labels.len()
            )));
        }

        let mut top_index = 0;
        for (i, p) in probabilities.iter().enumerate() {
            if *p > probabilities[top_index] {
                top_index = i;
            }
        }

        Ok(Self {
            top_label: labels[top_index].clone(),
            top_index,
            probabilities,
        })
    }
}

/// A loaded, immutable image classifier.
///
/// Implementations must be safe to share across threads for read-only
/// inference; the predictor holds them behind an `Arc`.
pub trait ClassificationModel: Send + Sync {
    /// Model name
    fn name(&self) -> &str;

    /// Ordered label vocabulary
    fn labels(&self) -> &[String];

    /// Run inference on one decoded image
    fn infer(&self, image: &DynamicImage) -> Result<ModelOutput, ClassifierError>;
}
