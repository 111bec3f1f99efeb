use std::fmt;

use serde::Serialize;

const LANDSCAPE: f64 = 16.0 / 9.0;
const PORTRAIT: f64 = 9.0 / 16.0;
const TOLERANCE: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Landscape,
    Portrait,
    Other,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Landscape => "landscape",
            Orientation::Portrait => "portrait",
            Orientation::Other => "other",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Buckets a frame size into 16:9, 9:16 or anything else.
///
/// Both comparisons are strict, so a ratio exactly `TOLERANCE` away from a
/// target is `Other`. The prober never hands over a zero height; if one
/// slips through anyway the NaN/inf ratio also lands in `Other`.
pub fn classify(width: u32, height: u32) -> Orientation {
    let ratio = width as f64 / height as f64;

    if near(ratio, LANDSCAPE) {
        Orientation::Landscape
    } else if near(ratio, PORTRAIT) {
        Orientation::Portrait
    } else {
        Orientation::Other
    }
}

fn near(ratio: f64, target: f64) -> bool {
    (ratio - target).abs() < TOLERANCE
}
