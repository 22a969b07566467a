//! Rule-based nature scene model
//!
//! Scores an image from its mean colour. It needs no model file, which makes
//! it the stand-in model for development and tests.

use crate::model::{ClassificationModel, ModelOutput};
use crate::preprocess::softmax;
use crate::ClassifierError;
use image::imageops::FilterType;
use image::DynamicImage;

/// Labels of the nature scene vocabulary, in model order
pub const NATURE_LABELS: [&str; 4] = ["beach", "bird", "fish", "forest"];

/// Side length images are reduced to before averaging
const SAMPLE_SIZE: u32 = 32;

/// Softmax sharpness applied to the colour scores
const TEMPERATURE: f32 = 0.15;

/// Colour heuristic over the four nature classes
#[derive(Debug, Clone)]
pub struct HeuristicModel {
    labels: Vec<String>,
}

impl Default for HeuristicModel {
    fn default() -> Self {
        Self::new()
    }
}

impl HeuristicModel {
    pub fn new() -> Self {
        Self {
            labels: NATURE_LABELS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Mean RGB in 0..1 units
    fn mean_color(image: &DynamicImage) -> [f32; 3] {
        let small = image
            .resize_exact(SAMPLE_SIZE, SAMPLE_SIZE, FilterType::Triangle)
            .to_rgb8();

        let mut sum = [0.0f32; 3];
        for pixel in small.pixels() {
            for c in 0..3 {
                sum[c] += pixel[c] as f32 / 255.0;
            }
        }

        let n = (SAMPLE_SIZE * SAMPLE_SIZE) as f32;
        [sum[0] / n, sum[1] / n, sum[2] / n]
    }

    /// Raw per-class scores in label order
    fn scores([r, g, b]: [f32; 3]) -> [f32; 4] {
        let brightness = (r + g + b) / 3.0;
        let saturation = r.max(g).max(b) - r.min(g).min(b);

        let beach = (r + g) / 2.0 - b + 0.25 * brightness;
        let bird = brightness - 2.0 * saturation;
        let fish = b - (r + g) / 2.0;
        let forest = g - (r + b) / 2.0;

        [beach, bird, fish, forest]
    }
}

impl ClassificationModel for HeuristicModel {
    fn name(&self) -> &str {
        "nature_scene_heuristic"
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn infer(&self, image: &DynamicImage) -> Result<ModelOutput, ClassifierError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(ClassifierError::PredictionFailed("empty image".into()));
        }

        let scores: Vec<f32> = Self::scores(Self::mean_color(image))
            .iter()
            .map(|s| s / TEMPERATURE)
            .collect();

        ModelOutput::from_probabilities(&self.labels, softmax(&scores))
    }
}
