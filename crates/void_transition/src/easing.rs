//! Easing curves

use serde::{Deserialize, Serialize};

/// Acceleration curve applied to a linear progress value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    /// Constant speed
    #[default]
    Linear,
    /// Slow start
    EaseIn,
    /// Slow end
    EaseOut,
    /// Slow start and end
    EaseInOut,
}

impl Easing {
    /// Apply easing to a 0-1 parameter
    pub fn apply(&self, t: f32) -> f32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
        }
    }
}
