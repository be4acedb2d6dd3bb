use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sightline_model_provider::decode_image;
use sightline_types::ScoreDistribution;
use std::time::Instant;

use crate::config::SightlineConfig;
use crate::error::{SightlineError, SightlineResult};
use crate::lifecycle::ModelHandle;

/// Raw outcome of one inference call
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
pub struct Classification {
    pub distribution: ScoreDistribution,
    pub latency_ms: u64,
}

/// Runs a single image through a loaded model.
///
/// Never touches lifecycle state: a failing inference leaves the handle
/// usable for the next request.
#[derive(Debug, Clone)]
pub struct ClassificationExecutor {
    max_image_bytes: usize,
}

impl ClassificationExecutor {
    pub fn new(max_image_bytes: usize) -> Self {
        Self { max_image_bytes }
    }

    pub fn from_config(config: &SightlineConfig) -> Self {
        Self::new(config.max_image_bytes)
    }

    /// Decode `image`, invoke the model exactly once and time that call.
    ///
    /// Bytes that do not decode are rejected as `InvalidInput` before the
    /// model is touched. The returned distribution is whatever the model
    /// produced, unchanged.
    pub async fn classify(
        &self,
        handle: &ModelHandle,
        image: &[u8],
    ) -> SightlineResult<Classification> {
        let decoded = decode_image(image, self.max_image_bytes)?;

        let mut model = handle.lock().await;
        let start = Instant::now();
        let result = model.classify(&decoded).await;
        let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        drop(model);

        match result {
            Ok(distribution) => {
                tracing::debug!(
                    model = %handle.model_id(),
                    device = %handle.device(),
                    latency_ms,
                    entries = distribution.len(),
                    "Classification finished"
                );
                Ok(Classification {
                    distribution,
                    latency_ms,
                })
            }
            Err(e) => {
                tracing::warn!(
                    model = %handle.model_id(),
                    latency_ms,
                    error = %e,
                    "Classification failed"
                );
                Err(SightlineError::from(e))
            }
        }
    }
}
