//! Image preprocessing and output normalization

use crate::bundle::{InputSpec, TensorLayout};
use image::imageops::FilterType;
use image::DynamicImage;
use tract_onnx::prelude::*;

/// Resize, normalize and lay out an image as a 4-D `f32` tensor
pub fn image_to_tensor(image: &DynamicImage, spec: &InputSpec) -> Tensor {
    let (w, h) = (spec.width as usize, spec.height as usize);
    let resized = image
        .resize_exact(spec.width, spec.height, FilterType::Triangle)
        .to_rgb8();

    let value = |x: usize, y: usize, c: usize| -> f32 {
        let pixel = resized.get_pixel(x as u32, y as u32);
        (pixel[c] as f32 / 255.0 - spec.mean[c]) / spec.std[c]
    };

    match spec.layout {
        TensorLayout::Nchw => {
            tract_ndarray::Array4::<f32>::from_shape_fn((1, 3, h, w), |(_, c, y, x)| {
                value(x, y, c)
            })
            .into()
        }
        TensorLayout::Nhwc => {
            tract_ndarray::Array4::<f32>::from_shape_fn((1, h, w, 3), |(_, y, x, c)| {
                value(x, y, c)
            })
            .into()
        }
    }
}

/// Shape of the tensor produced by [`image_to_tensor`]
pub fn input_shape(spec: &InputSpec) -> [usize; 4] {
    let (w, h) = (spec.width as usize, spec.height as usize);
    match spec.layout {
        TensorLayout::Nchw => [1, 3, h, w],
        TensorLayout::Nhwc => [1, h, w, 3],
    }
}

/// Numerically stable softmax
pub fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();

    if sum > 0.0 && sum.is_finite() {
        exps.iter().map(|e| e / sum).collect()
    } else {
        vec![1.0 / scores.len() as f32; scores.len()]
    }
}
