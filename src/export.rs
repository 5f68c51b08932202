use crate::annotations::bounding_box::BoundingBoxGeometry;
use crate::annotations::detection::{Blade, confidence_summary};
use crate::annotations::keypoint::Keypoint;
use crate::annotations::bounding_box_with_keypoints::NUM_KEYPOINTS;
use crate::error::DetectorError;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// One blade as it appears in an exported report.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct DetectionRecord {
    pub label: String,
    pub confidence: f32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub keypoints: [Keypoint; NUM_KEYPOINTS],
}

impl From<&Blade> for DetectionRecord {
    fn from(blade: &Blade) -> Self {
        let (x, y, width, height) = blade.annotation.as_xywh();
        DetectionRecord {
            label: blade.label().to_string(),
            confidence: blade.confidence,
            x,
            y,
            width,
            height,
            keypoints: blade.annotation.keypoints,
        }
    }
}

/// Detection results for one image.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct DetectionReport {
    pub source: PathBuf,
    pub image_width: u32,
    pub image_height: u32,
    pub generated_at: DateTime<Local>,
    pub detections: Vec<DetectionRecord>,
}

impl DetectionReport {
    pub fn new(source: &Path, image_size: (u32, u32), blades: &[Blade]) -> Self {
        DetectionReport {
            source: source.to_path_buf(),
            image_width: image_size.0,
            image_height: image_size.1,
            generated_at: Local::now(),
            detections: blades.iter().map(DetectionRecord::from).collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, DetectorError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_text(&self) -> String {
        let mut text = format!(
            "Blade detection results\nTime: {}\nFile: {}\nResolution: {}x{}\nDetections: {}\n\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S"),
            self.source.display(),
            self.image_width,
            self.image_height,
            self.detections.len()
        );
        for (index, record) in self.detections.iter().enumerate() {
            text.push_str(&format!(
                "{}. {} box: ({:.1}, {:.1}, {:.1}, {:.1})\n",
                index + 1,
                confidence_summary(&record.label, record.confidence),
                record.x,
                record.y,
                record.width,
                record.height
            ));
        }
        text
    }

    /// Writes JSON when `path` ends in `.json` and the text report otherwise.
    pub fn write_to(&self, path: &Path) -> Result<(), DetectorError> {
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let contents = if is_json { self.to_json()? } else { self.to_text() };
        std::fs::write(path, contents).map_err(|source| DetectorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), count = self.detections.len(), "report written");
        Ok(())
    }
}
