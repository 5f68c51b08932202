pub mod decoder;
pub mod detector;
pub mod inference_session;
pub mod object_detection_utils;
#[cfg(feature = "onnxruntime")]
pub mod ort_inference_session;
pub mod remap;
pub mod tensor_layout;
