//! Layout of the blade model's input and output tensors.
//!
//! Input is `[1, 3, S, S]`, channel first, values in `[0, 1]`. Output is `[1, N, F]`: one row
//! per candidate slot, each row laid out as
//!
//! | features          | offset            | length |
//! |-------------------|-------------------|--------|
//! | cx, cy, w, h      | `BOX_OFFSET`      | 4      |
//! | class scores      | `CLASS_OFFSET`    | `NUM_CLASSES` |
//! | (x, y) per kpt    | `KEYPOINT_OFFSET` | `2 * NUM_KEYPOINTS` |
//!
//! All box and keypoint values are canvas pixels.

use crate::annotations::blade_class::BladeClass;
use crate::annotations::bounding_box_with_keypoints::NUM_KEYPOINTS;

pub const NUM_CLASSES: usize = BladeClass::COUNT;
pub const BOX_OFFSET: usize = 0;
pub const BOX_LEN: usize = 4;
pub const CLASS_OFFSET: usize = BOX_OFFSET + BOX_LEN;
pub const KEYPOINT_OFFSET: usize = CLASS_OFFSET + NUM_CLASSES;
pub const NUM_FEATURES: usize = KEYPOINT_OFFSET + 2 * NUM_KEYPOINTS;

pub const DEFAULT_CANVAS_SIZE: u32 = 640;
pub const DEFAULT_NUM_CANDIDATES: usize = 8400;

/// The per-model part of the layout: canvas side and number of candidate slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TensorLayout {
    pub canvas_size: u32,
    pub num_candidates: usize,
}

impl TensorLayout {
    pub const BLADE: TensorLayout = TensorLayout {
        canvas_size: DEFAULT_CANVAS_SIZE,
        num_candidates: DEFAULT_NUM_CANDIDATES,
    };

    pub fn num_features(&self) -> usize {
        NUM_FEATURES
    }

    pub fn input_shape(&self) -> [usize; 4] {
        let side = self.canvas_size as usize;
        [1, 3, side, side]
    }

    pub fn output_shape(&self) -> [usize; 3] {
        [1, self.num_candidates, NUM_FEATURES]
    }

    pub fn keypoint_x(k: usize) -> usize {
        KEYPOINT_OFFSET + 2 * k
    }

    pub fn keypoint_y(k: usize) -> usize {
        KEYPOINT_OFFSET + 2 * k + 1
    }
}

impl Default for TensorLayout {
    fn default() -> Self {
        TensorLayout::BLADE
    }
}
