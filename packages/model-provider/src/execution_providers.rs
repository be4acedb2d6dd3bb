//! Execution provider selection per device mode.
//!
//! # Supported Execution Providers
//!
//! - **TensorRT**: NVIDIA GPUs with TensorRT (fastest for NVIDIA inference)
//! - **CUDA**: NVIDIA GPUs (requires CUDA toolkit)
//! - **CoreML**: Apple Neural Engine and GPU (macOS, iOS, tvOS)
//! - **DirectML**: Windows GPUs via DirectX 12 (AMD, Intel, NVIDIA)
//! - **CPU**: Always available, used for [`DeviceMode::Fallback`]
//!
//! An accelerated session registers every compiled-in accelerator with
//! error-on-failure, so a missing driver surfaces as a load error instead of a
//! silent CPU session. That error is what drives the lifecycle manager onto
//! the fallback path.

use serde::{Deserialize, Serialize};
use sightline_types::DeviceMode;

/// Providers a session for a given device mode will request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecutionProviderInfo {
    /// Providers in priority order
    pub active_providers: Vec<String>,
    /// Whether any GPU/NPU provider is requested
    pub accelerated: bool,
}

impl ExecutionProviderInfo {
    pub fn for_device(device: DeviceMode) -> Self {
        match device {
            DeviceMode::Accelerated => {
                let active_providers: Vec<String> = compiled_accelerators()
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                let accelerated = !active_providers.is_empty();
                Self {
                    active_providers,
                    accelerated,
                }
            }
            DeviceMode::Fallback => Self {
                active_providers: vec!["CPU".to_string()],
                accelerated: false,
            },
        }
    }
}

/// Accelerators compiled into this build, TensorRT > CUDA > CoreML > DirectML.
pub fn compiled_accelerators() -> Vec<&'static str> {
    #[allow(unused_mut)]
    let mut providers = Vec::new();

    #[cfg(feature = "tensorrt")]
    providers.push("TensorRT");

    #[cfg(feature = "cuda")]
    providers.push("CUDA");

    #[cfg(feature = "coreml")]
    providers.push("CoreML");

    #[cfg(feature = "directml")]
    providers.push("DirectML");

    providers
}

/// Dispatch list for an accelerated session. Empty when no accelerator
/// feature is enabled.
#[cfg(feature = "local-ml")]
pub(crate) fn accelerated_dispatch() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[allow(unused_mut)]
    let mut eps: Vec<ort::execution_providers::ExecutionProviderDispatch> = Vec::new();

    #[cfg(feature = "tensorrt")]
    eps.push(
        ort::execution_providers::TensorRTExecutionProvider::default()
            .build()
            .error_on_failure(),
    );

    #[cfg(feature = "cuda")]
    eps.push(
        ort::execution_providers::CUDAExecutionProvider::default()
            .build()
            .error_on_failure(),
    );

    #[cfg(feature = "coreml")]
    eps.push(
        ort::execution_providers::CoreMLExecutionProvider::default()
            .build()
            .error_on_failure(),
    );

    #[cfg(feature = "directml")]
    eps.push(
        ort::execution_providers::DirectMLExecutionProvider::default()
            .build()
            .error_on_failure(),
    );

    eps
}
