//! Shared value types for Sightline.
//!
//! Holds the score distribution every other crate passes around, the device
//! mode vocabulary, and the re-exports the backend crates build on so that the
//! whole workspace agrees on one `Result`, one async runtime and one image
//! library.

pub mod device;
pub mod score;

pub use anyhow::{Error, Result, anyhow, bail};
pub use async_trait::async_trait;
pub use futures;
pub use image;
pub use schemars::JsonSchema;
pub use tokio;

pub use device::DeviceMode;
pub use score::{
    ClassificationResult, ConfidenceLevel, RankedScore, ScoreDistribution, percentage, softmax,
};

pub mod json {
    pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
    pub use serde_json::{Value, from_slice, from_str, from_value, json, to_string, to_value, to_vec};
}

pub mod sync {
    pub use tokio::sync::{Mutex, MutexGuard, RwLock, mpsc};
}
