use thiserror::Error;

/// Invalid annotation geometry.
#[derive(Debug, Error, PartialEq)]
pub enum AnnotationError {
    #[error("value for left > value for right ({left} > {right})")]
    LeftPastRight { left: f32, right: f32 },
    #[error("value for top > value for bottom ({top} > {bottom})")]
    TopPastBottom { top: f32, bottom: f32 },
}

/// Failures of the letterbox transform and its inverse.
#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("source image is empty ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    #[error("canvas size must be positive")]
    EmptyCanvas,
    #[error("letterboxing {width}x{height} into {canvas}x{canvas} leaves a zero-size image")]
    DegenerateScale { width: u32, height: u32, canvas: u32 },
    #[error("letterbox inverse is undefined on the {axis} axis (padding {padding} fills the canvas)")]
    DegenerateInverse { axis: Axis, padding: f32 },
    #[error("mapped coordinate on the {axis} axis is not finite")]
    NonFinite { axis: Axis },
    #[error(transparent)]
    Annotation(#[from] AnnotationError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::X => f.write_str("x"),
            Axis::Y => f.write_str("y"),
        }
    }
}

/// Failures of the external inference runtime.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("model file does not exist or cannot be read: {0}")]
    ModelNotFound(std::path::PathBuf),
    #[error("no backend could load the model: {0}")]
    Backend(String),
    #[error("inference failed: {0}")]
    Execution(String),
    #[error("model produced no output named {0:?}")]
    MissingOutput(String),
}

#[cfg(feature = "onnxruntime")]
impl From<ort::Error> for InferenceError {
    fn from(err: ort::Error) -> Self {
        InferenceError::Execution(err.to_string())
    }
}

/// The raw output tensor does not match the expected `[1, N, F]` layout.
#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    #[error("expected a rank 3 output tensor, got shape {0:?}")]
    Rank(Vec<usize>),
    #[error("expected a batch of 1, got {0}")]
    Batch(usize),
    #[error("expected {expected} candidate slots, got {actual}")]
    Candidates { expected: usize, actual: usize },
    #[error("expected {expected} features per candidate, got {actual}")]
    Features { expected: usize, actual: usize },
}

/// Everything a detection call can fail with.
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("failed to read or write {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("failed to load font {path}: {reason}")]
    Font { path: std::path::PathBuf, reason: String },
}
