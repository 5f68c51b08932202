use crate::annotations::blade_class::BladeClass;
use crate::annotations::bounding_box::BoundingBox;
use crate::annotations::bounding_box_with_keypoints::{BoundingBoxWithKeypoints, NUM_KEYPOINTS};
use crate::annotations::detection::{Blade, Detection};
use crate::annotations::keypoint::Keypoint;
use crate::annotations::point::Point;
use crate::error::DecodeError;
use crate::object_detection::tensor_layout::{
    BOX_OFFSET, CLASS_OFFSET, NUM_CLASSES, NUM_FEATURES, TensorLayout,
};
use ndarray::{ArrayView1, ArrayViewD, Axis, Ix3};
use tracing::trace;

/// Checks that a raw output tensor is exactly `[1, N, F]` for this layout.
pub fn validate_output_shape(shape: &[usize], layout: &TensorLayout) -> Result<(), DecodeError> {
    match *shape {
        [batch, candidates, features] => {
            if batch != 1 {
                Err(DecodeError::Batch(batch))
            } else if candidates != layout.num_candidates {
                Err(DecodeError::Candidates {
                    expected: layout.num_candidates,
                    actual: candidates,
                })
            } else if features != NUM_FEATURES {
                Err(DecodeError::Features {
                    expected: NUM_FEATURES,
                    actual: features,
                })
            } else {
                Ok(())
            }
        }
        _ => Err(DecodeError::Rank(shape.to_vec())),
    }
}

/// Walks every candidate slot of the raw output and keeps those whose best class score reaches
/// `confidence_threshold`.
///
/// Returned candidates are in canvas coordinates and in slot order. The class is the argmax of
/// the class scores, the first index wins a tie. Keypoints outside `[0, S]` on either axis are
/// recorded as absent.
pub fn decode_candidates(
    output: ArrayViewD<'_, f32>,
    layout: &TensorLayout,
    confidence_threshold: f32,
) -> Result<Vec<Blade>, DecodeError> {
    validate_output_shape(output.shape(), layout)?;
    let output = output
        .into_dimensionality::<Ix3>()
        .map_err(|_| DecodeError::Rank(Vec::new()))?;
    let canvas = layout.canvas_size as f32;

    let mut candidates = Vec::new();
    for (slot, row) in output.index_axis(Axis(0), 0).axis_iter(Axis(0)).enumerate() {
        let (class_index, score) = best_class(&row);
        // NaN fails the comparison, infinity fails the finiteness check.
        if !(score >= confidence_threshold) || !score.is_finite() {
            continue;
        }
        let Some(category) = BladeClass::from_index(class_index) else {
            continue;
        };
        let [cx, cy, w, h] = [0, 1, 2, 3].map(|i| row[BOX_OFFSET + i]);
        if ![cx, cy, w, h].iter().all(|v| v.is_finite()) {
            trace!(slot, "skipping candidate with a non-finite box");
            continue;
        }
        let keypoints: [Keypoint; NUM_KEYPOINTS] = std::array::from_fn(|k| {
            let point = Point::new(
                row[TensorLayout::keypoint_x(k)],
                row[TensorLayout::keypoint_y(k)],
            );
            if point.is_within(canvas, canvas) {
                Keypoint::Present(point)
            } else {
                Keypoint::Absent
            }
        });
        candidates.push(Detection {
            annotation: BoundingBoxWithKeypoints::new(
                BoundingBox::from_center(cx, cy, w, h),
                category,
                keypoints,
            ),
            confidence: score,
        });
    }
    Ok(candidates)
}

fn best_class(row: &ArrayView1<'_, f32>) -> (usize, f32) {
    (0..NUM_CLASSES)
        .map(|k| (k, row[CLASS_OFFSET + k]))
        .fold((0, f32::NEG_INFINITY), |best, current| {
            if current.1 > best.1 { current } else { best }
        })
}
