pub mod onnx;

pub use ort;
