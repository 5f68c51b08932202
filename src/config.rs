use crate::error::DetectorError;
use crate::object_detection::tensor_layout::{
    DEFAULT_CANVAS_SIZE, DEFAULT_NUM_CANDIDATES, TensorLayout,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::warn;

/// Execution provider the inference backend tries first.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionBackend {
    #[default]
    Cuda,
    Cpu,
}

impl fmt::Display for ExecutionBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionBackend::Cuda => f.write_str("cuda"),
            ExecutionBackend::Cpu => f.write_str("cpu"),
        }
    }
}

/// Detector settings. Missing fields in a config file fall back to the defaults.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    /// Only suppress overlaps between blades of the same category.
    pub class_aware_nms: bool,
    pub canvas_size: u32,
    pub num_candidates: usize,
    pub preferred_backend: ExecutionBackend,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            confidence_threshold: 0.5,
            iou_threshold: 0.4,
            class_aware_nms: false,
            canvas_size: DEFAULT_CANVAS_SIZE,
            num_candidates: DEFAULT_NUM_CANDIDATES,
            preferred_backend: ExecutionBackend::default(),
        }
    }
}

impl DetectorConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, DetectorError> {
        let text = std::fs::read_to_string(path).map_err(|source| DetectorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: DetectorConfig = serde_json::from_str(&text)?;
        config.confidence_threshold = sanitize_threshold(config.confidence_threshold, 0.5);
        config.iou_threshold = sanitize_threshold(config.iou_threshold, 0.4);
        Ok(config)
    }

    pub fn layout(&self) -> TensorLayout {
        TensorLayout {
            canvas_size: self.canvas_size,
            num_candidates: self.num_candidates,
        }
    }

    pub fn set_confidence_threshold(&mut self, value: f32) {
        self.confidence_threshold = sanitize_threshold(value, self.confidence_threshold);
    }

    pub fn set_iou_threshold(&mut self, value: f32) {
        self.iou_threshold = sanitize_threshold(value, self.iou_threshold);
    }
}

/// Thresholds live in `[0, 1]`: out-of-range values are clamped, NaN keeps `current`.
fn sanitize_threshold(value: f32, current: f32) -> f32 {
    if value.is_nan() {
        warn!(current, "ignoring NaN threshold");
        current
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_the_blade_model() {
        let config = DetectorConfig::default();
        assert_eq!(config.confidence_threshold, 0.5);
        assert_eq!(config.iou_threshold, 0.4);
        assert_eq!(config.layout(), TensorLayout::BLADE);
        assert!(!config.class_aware_nms);
    }

    #[test]
    fn setters_clamp_and_ignore_nan() {
        let mut config = DetectorConfig::default();
        config.set_confidence_threshold(1.7);
        assert_eq!(config.confidence_threshold, 1.0);
        config.set_iou_threshold(-0.2);
        assert_eq!(config.iou_threshold, 0.0);
        config.set_iou_threshold(f32::NAN);
        assert_eq!(config.iou_threshold, 0.0);
        config.set_confidence_threshold(0.25);
        assert_eq!(config.confidence_threshold, 0.25);
    }

    #[test]
    fn partial_json_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"confidence_threshold": 0.7, "preferred_backend": "cpu"}}"#).unwrap();
        let config = DetectorConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.confidence_threshold, 0.7);
        assert_eq!(config.iou_threshold, 0.4);
        assert_eq!(config.preferred_backend, ExecutionBackend::Cpu);
        assert_eq!(config.canvas_size, 640);
    }

    #[test]
    fn out_of_range_file_values_are_clamped() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"iou_threshold": 3.0}}"#).unwrap();
        let config = DetectorConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.iou_threshold, 1.0);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DetectorConfig::from_json_file(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, DetectorError::Io { .. }));
    }
}
