use crate::annotations::detection::Blade;
use crate::object_detection::detector::{Detector, FrameOutcome};
use crate::object_detection::inference_session::InferenceSession;
use crate::rendering::blade_renderer::BladeRenderer;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::contrast::{ThresholdType, otsu_level, threshold};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

pub const ROI_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
pub const PREVIEW_COLOR: Rgb<u8> = Rgb([255, 255, 0]);
pub const DEFAULT_ROI_SIZE: (u32, u32) = (640, 480);
const PREVIEW_MAX_WIDTH: u32 = 300;
const PREVIEW_OFFSET: u32 = 10;

/// What a processed frame shows.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Original,
    #[default]
    Detection,
    Binary,
    Roi,
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DisplayMode::Original => "original",
            DisplayMode::Detection => "detection",
            DisplayMode::Binary => "binary",
            DisplayMode::Roi => "roi",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProcessedFrame {
    pub image: RgbImage,
    /// Empty unless the frame went through detection.
    pub detections: Vec<Blade>,
    pub status: Option<String>,
}

impl ProcessedFrame {
    fn unchanged(frame: &RgbImage, status: Option<String>) -> Self {
        ProcessedFrame { image: frame.clone(), detections: Vec::new(), status }
    }
}

/// Turns raw frames into what gets displayed or saved, according to the current mode.
pub struct FrameProcessor<S = Box<dyn InferenceSession>> {
    detector: Option<Detector<S>>,
    renderer: BladeRenderer,
    mode: DisplayMode,
    roi_size: (u32, u32),
}

impl<S: InferenceSession> FrameProcessor<S> {
    pub fn new(detector: Option<Detector<S>>, renderer: BladeRenderer, mode: DisplayMode) -> Self {
        FrameProcessor { detector, renderer, mode, roi_size: DEFAULT_ROI_SIZE }
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: DisplayMode) {
        self.mode = mode;
    }

    pub fn set_roi_size(&mut self, width: u32, height: u32) {
        self.roi_size = (width, height);
    }

    pub fn detector_mut(&mut self) -> Option<&mut Detector<S>> {
        self.detector.as_mut()
    }

    pub fn process(&mut self, frame: &RgbImage) -> ProcessedFrame {
        match self.mode {
            DisplayMode::Original => ProcessedFrame::unchanged(frame, None),
            DisplayMode::Detection => self.detect(frame),
            DisplayMode::Binary => ProcessedFrame {
                image: binarize(frame),
                detections: Vec::new(),
                status: None,
            },
            DisplayMode::Roi => ProcessedFrame {
                image: self.extract_roi(frame),
                detections: Vec::new(),
                status: None,
            },
        }
    }

    fn detect(&mut self, frame: &RgbImage) -> ProcessedFrame {
        let Some(detector) = self.detector.as_mut() else {
            return ProcessedFrame::unchanged(frame, Some("no model loaded".to_string()));
        };
        match detector.detect(frame) {
            Ok(FrameOutcome::Detected(detections)) => {
                debug!(count = detections.len(), "blades detected");
                ProcessedFrame {
                    image: self.renderer.render(frame, &detections),
                    status: Some(format!("{} blade(s) detected", detections.len())),
                    detections,
                }
            }
            Ok(FrameOutcome::EmptyInput) => {
                ProcessedFrame::unchanged(frame, Some("empty input frame".to_string()))
            }
            Err(err) => {
                warn!(error = %err, "detection failed");
                ProcessedFrame::unchanged(frame, Some(format!("detection failed: {err}")))
            }
        }
    }

    /// Outlines a centered region of interest and overlays a scaled preview of it in the top
    /// left corner.
    fn extract_roi(&self, frame: &RgbImage) -> RgbImage {
        let mut result = frame.clone();
        let Some((x, y, width, height)) = centered_roi(frame.dimensions(), self.roi_size) else {
            return result;
        };
        draw_border(&mut result, x, y, width, height, ROI_COLOR);

        let preview_width = PREVIEW_MAX_WIDTH.min(frame.width() / 3);
        let preview_height = (height as f64 * preview_width as f64 / width as f64) as u32;
        let fits = PREVIEW_OFFSET + preview_width < frame.width()
            && PREVIEW_OFFSET + preview_height < frame.height();
        if preview_width == 0 || preview_height == 0 || !fits {
            return result;
        }
        let roi = imageops::crop_imm(frame, x, y, width, height).to_image();
        let preview = imageops::resize(&roi, preview_width, preview_height, FilterType::Triangle);
        imageops::replace(&mut result, &preview, PREVIEW_OFFSET as i64, PREVIEW_OFFSET as i64);
        draw_border(
            &mut result,
            PREVIEW_OFFSET,
            PREVIEW_OFFSET,
            preview_width,
            preview_height,
            PREVIEW_COLOR,
        );
        if let Some(font) = self.renderer.font() {
            draw_text_mut(&mut result, PREVIEW_COLOR, 15, 20, 20.0, font, "ROI Preview");
        }
        result
    }
}

/// Grayscale plus Otsu threshold, returned as a black and white RGB frame.
pub fn binarize(frame: &RgbImage) -> RgbImage {
    let gray = imageops::grayscale(frame);
    let level = otsu_level(&gray);
    let binary = threshold(&gray, level, ThresholdType::Binary);
    DynamicImage::ImageLuma8(binary).into_rgb8()
}

/// ROI of `size` centered on the frame, clipped to it. `None` when nothing is left.
pub fn centered_roi(frame: (u32, u32), size: (u32, u32)) -> Option<(u32, u32, u32, u32)> {
    let x = (frame.0 / 2).saturating_sub(size.0 / 2);
    let y = (frame.1 / 2).saturating_sub(size.1 / 2);
    let width = (x + size.0).min(frame.0).saturating_sub(x);
    let height = (y + size.1).min(frame.1).saturating_sub(y);
    (width > 0 && height > 0).then_some((x, y, width, height))
}

fn draw_border(image: &mut RgbImage, x: u32, y: u32, width: u32, height: u32, color: Rgb<u8>) {
    let (x, y) = (x as i32, y as i32);
    draw_hollow_rect_mut(image, Rect::at(x, y).of_size(width, height), color);
    if width > 2 && height > 2 {
        draw_hollow_rect_mut(image, Rect::at(x + 1, y + 1).of_size(width - 2, height - 2), color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectorConfig;
    use crate::error::InferenceError;
    use crate::object_detection::decoder::tests::{RawCandidate, raw_output};
    use crate::rendering::blade_renderer::BOX_COLOR;
    use ndarray::{Array4, ArrayD};

    const FILL: Rgb<u8> = Rgb([90, 60, 30]);

    struct FixedSession(ArrayD<f32>);

    impl InferenceSession for FixedSession {
        fn name(&self) -> &str {
            "fixed"
        }

        fn run(&mut self, _input: &Array4<f32>) -> Result<ArrayD<f32>, InferenceError> {
            Ok(self.0.clone())
        }
    }

    struct FailingSession;

    impl InferenceSession for FailingSession {
        fn name(&self) -> &str {
            "failing"
        }

        fn run(&mut self, _input: &Array4<f32>) -> Result<ArrayD<f32>, InferenceError> {
            Err(InferenceError::Execution("device lost".to_string()))
        }
    }

    fn processor(mode: DisplayMode) -> FrameProcessor<FixedSession> {
        let output = raw_output(&[RawCandidate::boxed(100.0, 100.0, 200.0, 200.0, 0, 0.9)], 4);
        let config = DetectorConfig { num_candidates: 4, ..DetectorConfig::default() };
        let detector = Detector::with_session(FixedSession(output.into_dyn()), config);
        FrameProcessor::new(Some(detector), BladeRenderer::new(), mode)
    }

    fn frame(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, FILL)
    }

    #[test]
    fn original_mode_returns_the_frame() {
        let processed = processor(DisplayMode::Original).process(&frame(64, 64));
        assert_eq!(processed.image, frame(64, 64));
        assert!(processed.detections.is_empty());
    }

    #[test]
    fn detection_mode_renders_blades() {
        let processed = processor(DisplayMode::Detection).process(&frame(640, 640));
        assert_eq!(processed.detections.len(), 1);
        assert_eq!(processed.image.get_pixel(100, 100), &BOX_COLOR);
        assert_eq!(processed.status.as_deref(), Some("1 blade(s) detected"));
    }

    #[test]
    fn detection_without_a_model_leaves_the_frame_alone() {
        let mut processor: FrameProcessor<FixedSession> =
            FrameProcessor::new(None, BladeRenderer::new(), DisplayMode::Detection);
        let processed = processor.process(&frame(32, 32));
        assert_eq!(processed.image, frame(32, 32));
        assert!(processed.detections.is_empty());
        assert!(processed.status.is_some());
    }

    #[test]
    fn failed_detection_leaves_the_frame_alone() {
        let detector = Detector::with_session(FailingSession, DetectorConfig::default());
        let mut processor =
            FrameProcessor::new(Some(detector), BladeRenderer::new(), DisplayMode::Detection);
        let processed = processor.process(&frame(48, 32));
        assert_eq!(processed.image, frame(48, 32));
        assert!(processed.detections.is_empty());
        let status = processed.status.unwrap();
        assert!(status.starts_with("detection failed"));
        assert!(status.contains("device lost"));
    }

    #[test]
    fn empty_frame_is_reported_without_detections() {
        let mut processor = processor(DisplayMode::Detection);
        let processed = processor.process(&RgbImage::new(0, 0));
        assert_eq!(processed.image.dimensions(), (0, 0));
        assert!(processed.detections.is_empty());
        assert_eq!(processed.status.as_deref(), Some("empty input frame"));
    }

    #[test]
    fn binary_mode_is_black_and_white() {
        let image = RgbImage::from_fn(40, 20, |x, _| {
            if x < 20 { Rgb([10, 10, 10]) } else { Rgb([240, 240, 240]) }
        });
        let processed = processor(DisplayMode::Binary).process(&image);
        assert_eq!(processed.image.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(processed.image.get_pixel(39, 19), &Rgb([255, 255, 255]));
    }

    #[test]
    fn roi_is_centered_and_clipped() {
        assert_eq!(centered_roi((1920, 1080), (640, 480)), Some((640, 300, 640, 480)));
        assert_eq!(centered_roi((320, 200), (640, 480)), Some((0, 0, 320, 200)));
        assert_eq!(centered_roi((0, 200), (640, 480)), None);
    }

    #[test]
    fn roi_mode_outlines_and_previews() {
        let processed = processor(DisplayMode::Roi).process(&frame(1920, 1080));
        let image = processed.image;
        assert_eq!(image.get_pixel(640, 300), &ROI_COLOR);
        assert_eq!(image.get_pixel(1279, 779), &ROI_COLOR);
        assert_eq!(image.get_pixel(10, 10), &PREVIEW_COLOR);
        assert_eq!(image.get_pixel(309, 234), &PREVIEW_COLOR);
        assert_eq!(image.get_pixel(150, 100), &FILL);
        assert_eq!(image.get_pixel(900, 900), &FILL);
    }
}
