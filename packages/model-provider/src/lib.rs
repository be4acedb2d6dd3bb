//! Model capabilities for Sightline.
//!
//! The core never talks to an inference runtime directly. It asks a
//! [`ModelLoader`] for a classifier on a given [`DeviceMode`] and then calls
//! the returned [`ImageClassifierLogic`] once per image. Anything that can map
//! an image to a ranked score distribution (a local ONNX session, a remote
//! endpoint, a test double) plugs in here.
//!
//! The ONNX Runtime backend lives behind the `local-ml` feature; accelerated
//! execution providers are opt-in through `cuda`, `tensorrt`, `coreml` and
//! `directml`.

pub mod classifier;
pub mod execution_providers;
pub mod image;
pub mod labels;
#[cfg(feature = "local-ml")]
pub mod ml;

pub use classifier::{ClassifierOptions, ImageClassifierLogic, ModelLoader};
pub use execution_providers::{ExecutionProviderInfo, compiled_accelerators};
pub use image::{ImageInputError, decode_image};

pub use sightline_types::DeviceMode;
