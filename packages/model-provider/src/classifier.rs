use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sightline_types::{
    DeviceMode, Result, ScoreDistribution, async_trait, image::DynamicImage,
};

/// A loaded image classification model.
///
/// Implementations may keep mutable runtime state (ONNX sessions need `&mut`
/// to run), so callers must hold exclusive access for the duration of a call.
#[async_trait]
pub trait ImageClassifierLogic: Send + Sync {
    /// Run the model once and return the ranked distribution, highest score
    /// first.
    async fn classify(&mut self, image: &DynamicImage) -> Result<ScoreDistribution>;

    /// Identifier of the underlying model, used in logs.
    fn model_id(&self) -> &str;
}

/// Acquires a classifier for a specific execution backend.
#[async_trait]
pub trait ModelLoader: Send + Sync {
    /// Build a classifier on `device`. Any error means "not available on this
    /// device"; the caller decides whether to try another one.
    async fn load(&self, device: DeviceMode) -> Result<Box<dyn ImageClassifierLogic>>;
}

/// Backend-agnostic model settings.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq)]
pub struct ClassifierOptions {
    /// Hub identifier of the model, informational for local files
    pub model_id: String,
    /// Path to the model artefact
    #[serde(default)]
    pub model_path: Option<PathBuf>,
    /// Optional newline separated label file
    #[serde(default)]
    pub labels_path: Option<PathBuf>,
    /// Number of ranked entries returned per classification
    pub top_n: usize,
    pub input_width: u32,
    pub input_height: u32,
}

impl Default for ClassifierOptions {
    fn default() -> Self {
        Self {
            model_id: "onnx-community/mobilenetv4_conv_small.e2400_r224_in1k".to_string(),
            model_path: None,
            labels_path: None,
            top_n: 5,
            input_width: 224,
            input_height: 224,
        }
    }
}
