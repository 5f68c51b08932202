use crate::annotations::bounding_box::BoundingBoxGeometry;
use crate::annotations::bounding_box_with_keypoints::Categorized;
use crate::annotations::detection::Detection;
use itertools::Itertools;

/// Non maxmimum suppression is a way of removing duplicate detections.
///
/// Greedy: the highest-confidence remaining detection is kept and every remaining detection
/// whose IoU with it exceeds `iou_threshold` is dropped, until none remain. Exact confidence
/// ties keep their input order. Unless `class_aware` is set, overlaps are suppressed across
/// categories.
///
/// Returns the indices of the kept detections in selection order, i.e. by descending
/// confidence.
pub fn non_maximum_suppression<T: BoundingBoxGeometry + Categorized>(
    detections: &[Detection<T>],
    iou_threshold: f32,
    class_aware: bool,
) -> Vec<usize> {
    let order: Vec<usize> = (0..detections.len())
        .sorted_by(|&a, &b| {
            detections[b]
                .confidence
                .total_cmp(&detections[a].confidence)
        })
        .collect();
    let mut detections_to_remove: Vec<bool> = vec![false; detections.len()];
    let mut kept: Vec<usize> = Vec::new();
    for (rank, &current_index) in order.iter().enumerate() {
        if detections_to_remove[current_index] {
            continue;
        }
        kept.push(current_index);
        let current_det = &detections[current_index];
        for &other_index in &order[rank + 1..] {
            if detections_to_remove[other_index] {
                continue;
            }
            let other_det = &detections[other_index];
            if class_aware && current_det.annotation.category() != other_det.annotation.category() {
                continue;
            }
            let iou = current_det
                .annotation
                .intersection_over_union(&other_det.annotation);
            if iou > iou_threshold {
                detections_to_remove[other_index] = true;
            }
        }
    }
    kept
}

/// Owning variant of [`non_maximum_suppression`] that returns the kept detections themselves.
pub fn suppress_detections<T: BoundingBoxGeometry + Categorized + Clone>(
    detections: &[Detection<T>],
    iou_threshold: f32,
    class_aware: bool,
) -> Vec<Detection<T>> {
    non_maximum_suppression(detections, iou_threshold, class_aware)
        .into_iter()
        .map(|index| detections[index].clone())
        .collect()
}
