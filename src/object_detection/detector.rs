use crate::annotations::detection::Blade;
use crate::config::DetectorConfig;
use crate::error::DetectorError;
use crate::image_utils::image_conversion::convert_rgb_image_to_owned_array;
use crate::image_utils::letterbox::{Letterbox, letterbox};
use crate::object_detection::decoder::decode_candidates;
use crate::object_detection::inference_session::InferenceSession;
use crate::object_detection::object_detection_utils::suppress_detections;
use crate::object_detection::remap::remap_to_source;
use crate::object_detection::tensor_layout::TensorLayout;
use image::RgbImage;
use std::time::Instant;
use tracing::{debug, warn};

/// Everything one detection call needs besides the session, captured when the call starts.
///
/// Threshold changes made while a call is running never reach it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameContext {
    pub letterbox: Letterbox,
    pub layout: TensorLayout,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub class_aware_nms: bool,
}

impl FrameContext {
    pub fn new(letterbox: Letterbox, config: &DetectorConfig) -> Self {
        FrameContext {
            letterbox,
            layout: config.layout(),
            confidence_threshold: config.confidence_threshold,
            iou_threshold: config.iou_threshold,
            class_aware_nms: config.class_aware_nms,
        }
    }
}

/// Result of one detection call.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameOutcome {
    /// Final blades in source-image pixels, by descending confidence.
    Detected(Vec<Blade>),
    /// The frame had no pixels; inference was not run.
    EmptyInput,
}

impl FrameOutcome {
    pub fn detections(&self) -> &[Blade] {
        match self {
            FrameOutcome::Detected(blades) => blades,
            FrameOutcome::EmptyInput => &[],
        }
    }

    pub fn into_detections(self) -> Vec<Blade> {
        match self {
            FrameOutcome::Detected(blades) => blades,
            FrameOutcome::EmptyInput => Vec::new(),
        }
    }

    pub fn is_empty_input(&self) -> bool {
        matches!(self, FrameOutcome::EmptyInput)
    }
}

/// Runs letterbox, inference, decoding, suppression and remapping on one frame.
pub fn detect_blades<S: InferenceSession + ?Sized>(
    session: &mut S,
    image: &RgbImage,
    config: &DetectorConfig,
) -> Result<FrameOutcome, DetectorError> {
    if image.width() == 0 || image.height() == 0 {
        warn!(width = image.width(), height = image.height(), "empty input frame, skipping");
        return Ok(FrameOutcome::EmptyInput);
    }
    let start = Instant::now();
    let (canvas, params) = letterbox(image, config.canvas_size)?;
    let context = FrameContext::new(params, config);
    let input = convert_rgb_image_to_owned_array(&canvas);
    let preprocessed = start.elapsed();

    let output = session.run(&input)?;
    let inferred = start.elapsed();

    let candidates = decode_candidates(output.view(), &context.layout, context.confidence_threshold)?;
    let kept = suppress_detections(&candidates, context.iou_threshold, context.class_aware_nms);
    let blades = kept
        .iter()
        .map(|candidate| remap_to_source(candidate, &context.letterbox))
        .collect::<Result<Vec<Blade>, _>>()?;
    debug!(
        session = session.name(),
        candidates = candidates.len(),
        kept = blades.len(),
        preprocess_ms = preprocessed.as_secs_f64() * 1e3,
        inference_ms = (inferred - preprocessed).as_secs_f64() * 1e3,
        total_ms = start.elapsed().as_secs_f64() * 1e3,
        "frame processed"
    );
    Ok(FrameOutcome::Detected(blades))
}

/// An inference session paired with the settings used for the next call.
pub struct Detector<S = Box<dyn InferenceSession>> {
    session: S,
    config: DetectorConfig,
}

impl<S: InferenceSession> Detector<S> {
    pub fn with_session(session: S, config: DetectorConfig) -> Self {
        Detector { session, config }
    }

    pub fn detect(&mut self, image: &RgbImage) -> Result<FrameOutcome, DetectorError> {
        detect_blades(&mut self.session, image, &self.config)
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.config.confidence_threshold
    }

    pub fn iou_threshold(&self) -> f32 {
        self.config.iou_threshold
    }

    /// Applies from the next call on. Values are clamped to `[0, 1]`.
    pub fn set_confidence_threshold(&mut self, value: f32) {
        self.config.set_confidence_threshold(value);
    }

    /// Applies from the next call on. Values are clamped to `[0, 1]`.
    pub fn set_iou_threshold(&mut self, value: f32) {
        self.config.set_iou_threshold(value);
    }
}

#[cfg(feature = "onnxruntime")]
impl Detector<Box<dyn InferenceSession>> {
    /// Loads an ONNX model, trying the configured backend before the CPU.
    pub fn from_model_path(
        model_path: &std::path::Path,
        config: DetectorConfig,
    ) -> Result<Self, DetectorError> {
        let session = crate::object_detection::ort_inference_session::OrtInferenceSession::new(
            model_path,
            config.preferred_backend,
        )?;
        Ok(Detector::with_session(Box::new(session), config))
    }
}
