use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Execution backend that produced a loaded model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeviceMode {
    /// GPU/NPU execution provider (CUDA, TensorRT, CoreML, DirectML, ...)
    Accelerated,
    /// Plain CPU execution, no device hint
    Fallback,
}

impl DeviceMode {
    /// Order in which acquisition is attempted.
    pub const ACQUISITION_ORDER: [DeviceMode; 2] = [DeviceMode::Accelerated, DeviceMode::Fallback];

    pub fn is_accelerated(&self) -> bool {
        matches!(self, DeviceMode::Accelerated)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceMode::Accelerated => "accelerated",
            DeviceMode::Fallback => "fallback",
        }
    }
}

impl fmt::Display for DeviceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accelerated_is_tried_first() {
        assert_eq!(DeviceMode::ACQUISITION_ORDER[0], DeviceMode::Accelerated);
        assert_eq!(DeviceMode::ACQUISITION_ORDER[1], DeviceMode::Fallback);
    }

    #[test]
    fn serializes_snake_case() {
        let json = serde_json::to_string(&DeviceMode::Fallback).unwrap();
        assert_eq!(json, "\"fallback\"");
        let mode: DeviceMode = serde_json::from_str("\"accelerated\"").unwrap();
        assert!(mode.is_accelerated());
    }
}
