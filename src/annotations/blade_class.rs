use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of categories the blade model predicts, in tensor order.
///
/// The first letter is the target color, the second tells whether the blade is the one to hit
/// (`R`) or a decoy (`W`).
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum BladeClass {
    RedRight,
    RedWrong,
    BlueRight,
    BlueWrong,
}

impl BladeClass {
    pub const COUNT: usize = 4;
    pub const ALL: [BladeClass; BladeClass::COUNT] = [
        BladeClass::RedRight,
        BladeClass::RedWrong,
        BladeClass::BlueRight,
        BladeClass::BlueWrong,
    ];

    pub fn from_index(index: usize) -> Option<BladeClass> {
        Self::ALL.get(index).copied()
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn label(&self) -> &'static str {
        match self {
            BladeClass::RedRight => "RR",
            BladeClass::RedWrong => "RW",
            BladeClass::BlueRight => "BR",
            BladeClass::BlueWrong => "BW",
        }
    }

    /// Decoy blades are never drawn on the display image.
    pub fn is_decoy(&self) -> bool {
        matches!(self, BladeClass::RedWrong | BladeClass::BlueWrong)
    }
}

impl fmt::Display for BladeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
