use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sightline_model_provider::ImageInputError;
use thiserror::Error;

pub type SightlineResult<T> = std::result::Result<T, SightlineError>;

#[derive(Debug, Error)]
pub enum SightlineError {
    /// Neither the accelerated nor the fallback device produced a model
    #[error("Model unavailable: {reason}")]
    ModelUnavailable { reason: String },

    /// The model was invoked and failed
    #[error("Classification failed: {message}")]
    ClassificationFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The upload was rejected before reaching the model
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Cannot summarize an empty distribution")]
    EmptyDistribution,

    #[error("Config error: {0}")]
    Config(String),
}

/// Payload-free discriminant, safe to serialize into notices.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ModelUnavailable,
    ClassificationFailed,
    InvalidInput,
    EmptyDistribution,
    Config,
}

impl SightlineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SightlineError::ModelUnavailable { .. } => ErrorKind::ModelUnavailable,
            SightlineError::ClassificationFailed { .. } => ErrorKind::ClassificationFailed,
            SightlineError::InvalidInput(_) => ErrorKind::InvalidInput,
            SightlineError::EmptyDistribution => ErrorKind::EmptyDistribution,
            SightlineError::Config(_) => ErrorKind::Config,
        }
    }

    pub fn classification_failed(message: impl Into<String>) -> Self {
        SightlineError::ClassificationFailed {
            message: message.into(),
            source: None,
        }
    }
}

impl From<sightline_types::Error> for SightlineError {
    fn from(e: sightline_types::Error) -> Self {
        SightlineError::ClassificationFailed {
            message: e.to_string(),
            source: Some(e.into()),
        }
    }
}

impl From<ImageInputError> for SightlineError {
    fn from(e: ImageInputError) -> Self {
        SightlineError::InvalidInput(e.to_string())
    }
}

impl From<toml::de::Error> for SightlineError {
    fn from(e: toml::de::Error) -> Self {
        SightlineError::Config(e.to_string())
    }
}
