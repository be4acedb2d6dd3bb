//! ONNX Runtime image classifier.
//!
//! Expects a timm/mobilenet style graph: one `1x3xHxW` float input and one
//! logits (or probabilities) output over the class vocabulary.

use ort::{
    inputs,
    session::{Session, builder::GraphOptimizationLevel},
    value::Value,
};
use sightline_types::{
    DeviceMode, Result, ScoreDistribution, anyhow, async_trait, bail, image::DynamicImage, softmax,
};

use crate::classifier::{ClassifierOptions, ImageClassifierLogic, ModelLoader};
use crate::execution_providers::{ExecutionProviderInfo, accelerated_dispatch};
use crate::image::to_nchw_tensor;
use crate::labels::parse_labels;

pub struct OnnxImageClassifier {
    session: Session,
    model_id: String,
    labels: Vec<String>,
    input_name: String,
    output_name: String,
    input_width: u32,
    input_height: u32,
    top_n: usize,
}

impl OnnxImageClassifier {
    /// Build a session on `device`. Accelerated builds fail when no
    /// accelerator is compiled in or none can be registered.
    pub fn build(
        model: &[u8],
        labels: Vec<String>,
        options: &ClassifierOptions,
        device: DeviceMode,
    ) -> Result<Self> {
        let mut builder =
            Session::builder()?.with_optimization_level(GraphOptimizationLevel::Level3)?;

        if device.is_accelerated() {
            let eps = accelerated_dispatch();
            if eps.is_empty() {
                bail!("No accelerated execution provider compiled into this build");
            }
            builder = builder.with_execution_providers(eps)?;
        }

        let session = builder.commit_from_memory(model)?;

        let input = session
            .inputs
            .first()
            .ok_or_else(|| anyhow!("Model has no inputs"))?;
        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| anyhow!("Model has no outputs"))?;
        let input_name = input.name.clone();

        // Static spatial dims win over the configured size; dynamic ones are -1.
        let (input_width, input_height) = match input.input_type.tensor_shape() {
            Some(dims) if dims.len() >= 2 && dims[dims.len() - 1] > 0 && dims[dims.len() - 2] > 0 => {
                let d = dims.len();
                (dims[d - 1] as u32, dims[d - 2] as u32)
            }
            _ => (options.input_width, options.input_height),
        };

        tracing::info!(
            model = %options.model_id,
            device = %device,
            providers = ?ExecutionProviderInfo::for_device(device).active_providers,
            input = %input_name,
            output = %output_name,
            width = input_width,
            height = input_height,
            "ONNX session ready"
        );

        Ok(Self {
            session,
            model_id: options.model_id.clone(),
            labels,
            input_name,
            output_name,
            input_width,
            input_height,
            top_n: options.top_n.max(1),
        })
    }
}

#[async_trait]
impl ImageClassifierLogic for OnnxImageClassifier {
    async fn classify(&mut self, image: &DynamicImage) -> Result<ScoreDistribution> {
        let tensor = to_nchw_tensor(image, self.input_width, self.input_height);
        let value = Value::from_array(tensor)?;

        // Widen once here; everything downstream works in f64.
        let raw: Vec<f64> = {
            let outputs = self
                .session
                .run(inputs![self.input_name.as_str() => value])?;
            let output = outputs[self.output_name.as_str()].try_extract_array::<f32>()?;
            output.iter().map(|&v| f64::from(v)).collect()
        };

        if raw.is_empty() {
            bail!("Model returned an empty output tensor");
        }

        let probabilities = if is_probability_vector(&raw) {
            raw
        } else {
            softmax(&raw)
        };

        Ok(ScoreDistribution::from_scores(
            &self.labels,
            &probabilities,
            self.top_n,
        ))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Some exports already end in a softmax node.
fn is_probability_vector(values: &[f64]) -> bool {
    let sum: f64 = values.iter().sum();
    values.iter().all(|v| (0.0..=1.0).contains(v)) && (sum - 1.0).abs() < 1e-3
}

/// Loads the configured ONNX file once per acquisition attempt.
pub struct OnnxModelLoader {
    options: ClassifierOptions,
}

impl OnnxModelLoader {
    pub fn new(options: ClassifierOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl ModelLoader for OnnxModelLoader {
    async fn load(&self, device: DeviceMode) -> Result<Box<dyn ImageClassifierLogic>> {
        let path = self.options.model_path.clone().ok_or_else(|| {
            anyhow!("No model path configured for '{}'", self.options.model_id)
        })?;

        let model = tokio::fs::read(&path)
            .await
            .map_err(|e| anyhow!("Failed to read model '{}': {}", path.display(), e))?;
        if model.is_empty() {
            bail!("Model file '{}' is empty", path.display());
        }

        let labels = match &self.options.labels_path {
            Some(labels_path) => {
                let contents = tokio::fs::read_to_string(labels_path).await.map_err(|e| {
                    anyhow!("Failed to read labels '{}': {}", labels_path.display(), e)
                })?;
                parse_labels(&contents)
            }
            None => Vec::new(),
        };

        let options = self.options.clone();
        let classifier = tokio::task::spawn_blocking(move || {
            OnnxImageClassifier::build(&model, labels, &options, device)
        })
        .await??;

        Ok(Box::new(classifier))
    }
}
