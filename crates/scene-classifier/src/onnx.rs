//! ONNX model backed by tract

use crate::bundle::{InputSpec, ModelBundle, OutputKind};
use crate::model::{ClassificationModel, ModelOutput};
use crate::preprocess::{image_to_tensor, input_shape, softmax};
use crate::ClassifierError;
use image::DynamicImage;
use std::path::Path;
use tracing::{debug, info};
use tract_onnx::prelude::*;

type Plan = TypedRunnableModel<TypedModel>;

/// Classifier running an optimized tract plan
pub struct OnnxModel {
    name: String,
    labels: Vec<String>,
    input: InputSpec,
    output: OutputKind,
    plan: Plan,
}

impl OnnxModel {
    /// Load the graph described by a bundle
    pub fn from_bundle(bundle: &ModelBundle) -> Result<Self, ClassifierError> {
        let manifest = bundle.manifest();
        let path = bundle.model_path();
        info!("Loading ONNX model from {}", path.display());

        let plan = Self::build_plan(&path, &manifest.input)?;

        info!(
            "Model {} loaded: {} labels, input {}x{} ({:?})",
            manifest.name,
            manifest.labels.len(),
            manifest.input.width,
            manifest.input.height,
            manifest.input.layout
        );

        Ok(Self {
            name: manifest.name.clone(),
            labels: manifest.labels.clone(),
            input: manifest.input.clone(),
            output: manifest.output,
            plan,
        })
    }

    fn build_plan(path: &Path, input: &InputSpec) -> Result<Plan, ClassifierError> {
        let load_err = |e: TractError| ClassifierError::ModelLoad(format!("{}: {}", path.display(), e));

        tract_onnx::onnx()
            .model_for_path(path)
            .map_err(load_err)?
            .with_input_fact(0, f32::fact(input_shape(input)).into())
            .map_err(load_err)?
            .into_optimized()
            .map_err(load_err)?
            .into_runnable()
            .map_err(load_err)
    }

    /// Input geometry the graph was compiled for
    pub fn input_spec(&self) -> &InputSpec {
        &self.input
    }
}

impl ClassificationModel for OnnxModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn infer(&self, image: &DynamicImage) -> Result<ModelOutput, ClassifierError> {
        let start = std::time::Instant::now();
        let tensor = image_to_tensor(image, &self.input);

        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| ClassifierError::PredictionFailed(e.to_string()))?;

        let first = outputs
            .first()
            .ok_or_else(|| ClassifierError::PredictionFailed("model produced no outputs".into()))?;
        let scores: Vec<f32> = first
            .to_array_view::<f32>()
            .map_err(|e| ClassifierError::PredictionFailed(format!("output is not f32: {}", e)))?
            .iter()
            .copied()
            .collect();

        let probabilities = match self.output {
            OutputKind::Probabilities => scores,
            OutputKind::Logits => softmax(&scores),
        };

        debug!("Inference completed in {}ms", start.elapsed().as_millis());
        ModelOutput::from_probabilities(&self.labels, probabilities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::MANIFEST_FILE;
    use crate::{ModelConfig, Predictor};
    use image::{Rgb, RgbImage};
    use prost::Message;
    use std::fs;
    use tract_onnx::pb::{
        attribute_proto::AttributeType, tensor_proto::DataType, tensor_shape_proto::dimension,
        tensor_shape_proto::Dimension, type_proto, AttributeProto, GraphProto, ModelProto,
        NodeProto, OperatorSetIdProto, TensorProto, TensorShapeProto, TypeProto, ValueInfoProto,
    };

    fn float_value(name: &str, dims: &[i64]) -> ValueInfoProto {
        ValueInfoProto {
            name: name.to_string(),
            r#type: Some(TypeProto {
                value: Some(type_proto::Value::TensorType(type_proto::Tensor {
                    elem_type: DataType::Float as i32,
                    shape: Some(TensorShapeProto {
                        dim: dims
                            .iter()
                            .map(|d| Dimension {
                                value: Some(dimension::Value::DimValue(*d)),
                                ..Default::default()
                            })
                            .collect(),
                    }),
                })),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Per-channel mean over a 4x4 NCHW image, then a 3x4 projection.
    /// Green drives `forest` and blue drives `fish` with a score of 3.
    fn channel_projection_graph() -> Vec<u8> {
        let weights = TensorProto {
            name: "weights".to_string(),
            dims: vec![3, 4],
            data_type: DataType::Float as i32,
            float_data: vec![
                0.0, 0.0, 0.0, 0.0, // r
                0.0, 0.0, 0.0, 3.0, // g
                0.0, 0.0, 3.0, 0.0, // b
            ],
            ..Default::default()
        };

        let reduce = NodeProto {
            input: vec!["image".to_string()],
            output: vec!["channel_means".to_string()],
            name: "reduce".to_string(),
            op_type: "ReduceMean".to_string(),
            attribute: vec![
                AttributeProto {
                    name: "axes".to_string(),
                    r#type: AttributeType::Ints as i32,
                    ints: vec![2, 3],
                    ..Default::default()
                },
                AttributeProto {
                    name: "keepdims".to_string(),
                    r#type: AttributeType::Int as i32,
                    i: 0,
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        let project = NodeProto {
            input: vec!["channel_means".to_string(), "weights".to_string()],
            output: vec!["scores".to_string()],
            name: "project".to_string(),
            op_type: "MatMul".to_string(),
            ..Default::default()
        };

        ModelProto {
            ir_version: 7,
            opset_import: vec![OperatorSetIdProto {
                domain: String::new(),
                version: 13,
            }],
            graph: Some(GraphProto {
                name: "channel_projection".to_string(),
                node: vec![reduce, project],
                initializer: vec![weights],
                input: vec![float_value("image", &[1, 3, 4, 4])],
                output: vec![float_value("scores", &[1, 4])],
                ..Default::default()
            }),
            ..Default::default()
        }
        .encode_to_vec()
    }

    fn write_bundle(dir: &Path, output: &str) {
        let manifest = serde_json::json!({
            "name": "channel_projection",
            "labels": ["beach", "bird", "fish", "forest"],
            "input": {
                "width": 4,
                "height": 4,
                "layout": "nchw",
                "mean": [0.0, 0.0, 0.0],
                "std": [1.0, 1.0, 1.0]
            },
            "output": output
        });
        fs::write(dir.join(MANIFEST_FILE), manifest.to_string()).unwrap();
        fs::write(dir.join("model.onnx"), channel_projection_graph()).unwrap();
    }

    fn solid(color: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, Rgb(color)))
    }

    #[test]
    fn test_logits_graph_predicts_distribution() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path(), "logits");
        let predictor = Predictor::load(&ModelConfig::with_model_dir(dir.path())).unwrap();
        assert_eq!(predictor.model_name(), "channel_projection");

        let green = solid([0, 255, 0]);
        let prediction = predictor.predict(&green).unwrap();
        assert_eq!(prediction.len(), 4);
        assert_eq!(prediction.top().unwrap().0, "forest");
        assert!((prediction.total() - 1.0).abs() < 1e-3);

        // softmax([0, 0, 0, 3])
        let forest = prediction.get("forest").unwrap();
        assert!((forest - 0.8700).abs() < 1e-3);
        for label in ["beach", "bird", "fish"] {
            assert!((prediction.get(label).unwrap() - 0.0433).abs() < 1e-3);
        }

        let again = predictor.predict(&green).unwrap();
        assert_eq!(
            prediction.iter().collect::<Vec<_>>(),
            again.iter().collect::<Vec<_>>()
        );

        let blue = predictor.predict(&solid([0, 0, 255])).unwrap();
        assert_eq!(blue.top().unwrap().0, "fish");
    }

    #[test]
    fn test_probabilities_graph_passes_scores_through() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path(), "probabilities");
        let predictor = Predictor::load(&ModelConfig::with_model_dir(dir.path())).unwrap();

        let prediction = predictor.predict(&solid([0, 255, 0])).unwrap();
        assert!((prediction.get("forest").unwrap() - 3.0).abs() < 1e-5);
        assert!(prediction.get("fish").unwrap().abs() < 1e-5);
        assert!((prediction.total() - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_corrupt_graph_is_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(MANIFEST_FILE),
            r#"{"name": "broken", "labels": ["beach", "bird", "fish", "forest"]}"#,
        )
        .unwrap();
        fs::write(dir.path().join("model.onnx"), b"this is not an onnx graph").unwrap();

        let bundle = ModelBundle::open(dir.path()).unwrap();
        match OnnxModel::from_bundle(&bundle) {
            Err(ClassifierError::ModelLoad(msg)) => assert!(msg.contains("model.onnx")),
            Err(other) => panic!("expected ModelLoad, got {:?}", other),
            Ok(_) => panic!("corrupt graph must not load"),
        }
    }
}
