use crate::annotations::bounding_box::BoundingBoxGeometry;
use crate::annotations::bounding_box_with_keypoints::{BoundingBoxWithKeypoints, Categorized};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A detection is what is produced as output from an object detection model.
///
/// A detection is any annotation combined with a confidence score: a probability value that
/// encodes the model's belief that the detection is true.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Detection<T: BoundingBoxGeometry> {
    pub annotation: T,
    pub confidence: f32,
}

/// A located blade: box, category, four keypoints and a confidence.
///
/// The same type is used before suppression, in canvas coordinates (a candidate), and after
/// remapping, in source-image coordinates.
pub type Blade = Detection<BoundingBoxWithKeypoints>;

impl Blade {
    pub fn label(&self) -> &'static str {
        self.annotation.category().label()
    }

    pub fn confidence_percent(&self) -> u32 {
        confidence_percent(self.confidence)
    }

    pub fn summary(&self) -> String {
        confidence_summary(self.label(), self.confidence)
    }
}

/// Confidence as a truncated integer percentage, the way it is shown to users.
pub fn confidence_percent(confidence: f32) -> u32 {
    (confidence * 100.0) as u32
}

/// One-line description, e.g. `RR - confidence: 93%`.
pub fn confidence_summary(label: &str, confidence: f32) -> String {
    format!("{label} - confidence: {}%", confidence_percent(confidence))
}

impl fmt::Display for Blade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.3} {} kpts: [{}, {}, {}, {}]",
            self.label(),
            self.confidence,
            self.annotation.bounding_box,
            self.annotation.keypoints[0],
            self.annotation.keypoints[1],
            self.annotation.keypoints[2],
            self.annotation.keypoints[3],
        )
    }
}
