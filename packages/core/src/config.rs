use serde::{Deserialize, Serialize};
use sightline_model_provider::ClassifierOptions;
use std::path::{Path, PathBuf};

use crate::error::{SightlineError, SightlineResult};

/// Runtime configuration for a Sightline instance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SightlineConfig {
    /// Hub identifier of the classification model
    #[serde(default = "default_model_id")]
    pub model_id: String,
    /// Local model artefact, required by the ONNX backend
    #[serde(default)]
    pub model_path: Option<PathBuf>,
    /// Newline separated class labels
    #[serde(default)]
    pub labels_path: Option<PathBuf>,
    /// Entries kept per classification (at least 1)
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_input_size")]
    pub input_width: u32,
    #[serde(default = "default_input_size")]
    pub input_height: u32,
    /// Uploads above this size are rejected before decoding
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
    /// Fallback `EnvFilter` directive when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_model_id() -> String {
    ClassifierOptions::default().model_id
}
fn default_top_n() -> usize {
    5
}
fn default_input_size() -> u32 {
    224
}
fn default_max_image_bytes() -> usize {
    20 * 1024 * 1024
}
fn default_log_filter() -> String {
    "warn".to_string()
}

impl Default for SightlineConfig {
    fn default() -> Self {
        Self {
            model_id: default_model_id(),
            model_path: None,
            labels_path: None,
            top_n: default_top_n(),
            input_width: default_input_size(),
            input_height: default_input_size(),
            max_image_bytes: default_max_image_bytes(),
            log_filter: default_log_filter(),
        }
    }
}

impl SightlineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unset or unparsable values
    /// fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            model_id: lookup("SIGHTLINE_MODEL_ID").unwrap_or_else(default_model_id),
            model_path: lookup("SIGHTLINE_MODEL_PATH").map(PathBuf::from),
            labels_path: lookup("SIGHTLINE_LABELS_PATH").map(PathBuf::from),
            top_n: lookup("SIGHTLINE_TOP_N")
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_top_n),
            input_width: lookup("SIGHTLINE_INPUT_WIDTH")
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_input_size),
            input_height: lookup("SIGHTLINE_INPUT_HEIGHT")
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_input_size),
            max_image_bytes: lookup("SIGHTLINE_MAX_IMAGE_BYTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_max_image_bytes),
            log_filter: lookup("SIGHTLINE_LOG").unwrap_or_else(default_log_filter),
        };
        config.normalized()
    }

    pub fn from_toml_str(contents: &str) -> SightlineResult<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config.normalized())
    }

    pub fn load(path: impl AsRef<Path>) -> SightlineResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            SightlineError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    fn validate(&self) -> SightlineResult<()> {
        if self.input_width == 0 || self.input_height == 0 {
            return Err(SightlineError::Config(format!(
                "Input size must be non-zero, got {}x{}",
                self.input_width, self.input_height
            )));
        }
        if self.max_image_bytes == 0 {
            return Err(SightlineError::Config(
                "max_image_bytes must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    fn normalized(mut self) -> Self {
        self.top_n = self.top_n.max(1);
        if self.input_width == 0 {
            self.input_width = default_input_size();
        }
        if self.input_height == 0 {
            self.input_height = default_input_size();
        }
        if self.max_image_bytes == 0 {
            self.max_image_bytes = default_max_image_bytes();
        }
        self
    }

    pub fn classifier_options(&self) -> ClassifierOptions {
        ClassifierOptions {
            model_id: self.model_id.clone(),
            model_path: self.model_path.clone(),
            labels_path: self.labels_path.clone(),
            top_n: self.top_n,
            input_width: self.input_width,
            input_height: self.input_height,
        }
    }
}
