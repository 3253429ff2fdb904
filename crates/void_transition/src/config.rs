//! Transition configuration
//!
//! Read once at assembly time. Every table is optional in TOML; missing keys
//! take the defaults below.
//!
//! ```toml
//! [transition]
//! enable_transition = true
//! mode = "cinematic"       # none, fade, cinematic, shutter, noise
//! overlay_alpha = 1.0
//! sorting_order = 1000
//!
//! [transition.cinematic]
//! out_duration = 0.8
//! in_duration = 0.6
//! bar_height_ratio = 0.12
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which transition effect to play
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionMode {
    None,
    Fade,
    Cinematic,
    Shutter,
    Noise,
}

impl Default for TransitionMode {
    fn default() -> Self {
        Self::Fade
    }
}

impl TransitionMode {
    /// All modes, in selection order
    pub const ALL: [TransitionMode; 5] = [
        Self::None,
        Self::Fade,
        Self::Cinematic,
        Self::Shutter,
        Self::Noise,
    ];
}

impl std::fmt::Display for TransitionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Fade => write!(f, "fade"),
            Self::Cinematic => write!(f, "cinematic"),
            Self::Shutter => write!(f, "shutter"),
            Self::Noise => write!(f, "noise"),
        }
    }
}

impl std::str::FromStr for TransitionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "off" | "instant" => Ok(Self::None),
            "fade" => Ok(Self::Fade),
            "cinematic" | "letterbox" => Ok(Self::Cinematic),
            "shutter" => Ok(Self::Shutter),
            "noise" | "placeholder" => Ok(Self::Noise),
            _ => Err(format!("Unknown transition mode: {}", s)),
        }
    }
}

/// Fade to a flat overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FadeConfig {
    /// Seconds to cover the screen
    pub out_duration: f32,
    /// Seconds to reveal the new scene
    pub in_duration: f32,
}

impl Default for FadeConfig {
    fn default() -> Self {
        Self {
            out_duration: 0.5,
            in_duration: 0.5,
        }
    }
}

/// Letterbox bars followed by a fade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CinematicConfig {
    pub out_duration: f32,
    pub in_duration: f32,
    /// Height of each bar as a fraction of the screen height
    pub bar_height_ratio: f32,
}

impl Default for CinematicConfig {
    fn default() -> Self {
        Self {
            out_duration: 0.8,
            in_duration: 0.8,
            bar_height_ratio: 0.12,
        }
    }
}

/// Two panels closing from the screen edges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShutterConfig {
    pub out_duration: f32,
    pub in_duration: f32,
}

impl Default for ShutterConfig {
    fn default() -> Self {
        Self {
            out_duration: 0.4,
            in_duration: 0.4,
        }
    }
}

/// Placeholder static noise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    pub out_duration: f32,
    pub in_duration: f32,
    /// Peak noise intensity
    pub intensity: f32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            out_duration: 0.6,
            in_duration: 0.6,
            intensity: 0.8,
        }
    }
}

/// Complete transition configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    /// Disable to switch scenes without any visual effect
    pub enable_transition: bool,
    /// Effect to use
    pub mode: TransitionMode,
    /// Peak overlay opacity
    pub overlay_alpha: f32,
    /// Draw order of the overlay relative to other UI
    pub sorting_order: i32,
    /// Target time between animation frames
    pub frame_interval_ms: u64,
    pub fade: FadeConfig,
    pub cinematic: CinematicConfig,
    pub shutter: ShutterConfig,
    pub noise: NoiseConfig,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            enable_transition: true,
            mode: TransitionMode::Fade,
            overlay_alpha: 1.0,
            sorting_order: 1000,
            frame_interval_ms: 16,
            fade: FadeConfig::default(),
            cinematic: CinematicConfig::default(),
            shutter: ShutterConfig::default(),
            noise: NoiseConfig::default(),
        }
    }
}

impl TransitionConfig {
    /// Clamp every value into its valid range
    pub fn sanitized(mut self) -> Self {
        self.overlay_alpha = unit(self.overlay_alpha);
        self.frame_interval_ms = self.frame_interval_ms.max(1);

        self.fade.out_duration = seconds(self.fade.out_duration);
        self.fade.in_duration = seconds(self.fade.in_duration);

        self.cinematic.out_duration = seconds(self.cinematic.out_duration);
        self.cinematic.in_duration = seconds(self.cinematic.in_duration);
        self.cinematic.bar_height_ratio = self.cinematic.bar_height_ratio.clamp(0.0, 0.5);
        if self.cinematic.bar_height_ratio.is_nan() {
            self.cinematic.bar_height_ratio = CinematicConfig::default().bar_height_ratio;
        }

        self.shutter.out_duration = seconds(self.shutter.out_duration);
        self.shutter.in_duration = seconds(self.shutter.in_duration);

        self.noise.out_duration = seconds(self.noise.out_duration);
        self.noise.in_duration = seconds(self.noise.in_duration);
        self.noise.intensity = unit(self.noise.intensity);

        self
    }

    /// Time between animation frames
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }

    /// The mode to resolve, taking `enable_transition` into account
    pub fn effective_mode(&self) -> TransitionMode {
        if self.enable_transition {
            self.mode
        } else {
            TransitionMode::None
        }
    }
}

/// Convert configured seconds into a duration; invalid values become zero
pub fn to_duration(secs: f32) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::try_from_secs_f32(secs).unwrap_or(Duration::ZERO)
    } else {
        Duration::ZERO
    }
}

fn unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn seconds(value: f32) -> f32 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("fade".parse::<TransitionMode>().unwrap(), TransitionMode::Fade);
        assert_eq!("Letterbox".parse::<TransitionMode>().unwrap(), TransitionMode::Cinematic);
        assert_eq!(" none ".parse::<TransitionMode>().unwrap(), TransitionMode::None);
        assert!("wipe".parse::<TransitionMode>().is_err());
    }

    #[test]
    fn test_mode_display_round_trips() {
        for mode in TransitionMode::ALL {
            assert_eq!(mode.to_string().parse::<TransitionMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_sanitized() {
        let mut config = TransitionConfig::default();
        config.overlay_alpha = 1.7;
        config.frame_interval_ms = 0;
        config.fade.out_duration = -2.0;
        config.cinematic.bar_height_ratio = 0.9;
        config.noise.intensity = f32::NAN;

        let config = config.sanitized();
        assert_eq!(config.overlay_alpha, 1.0);
        assert_eq!(config.frame_interval_ms, 1);
        assert_eq!(config.fade.out_duration, 0.0);
        assert_eq!(config.cinematic.bar_height_ratio, 0.5);
        assert_eq!(config.noise.intensity, 0.0);
    }

    #[test]
    fn test_effective_mode() {
        let mut config = TransitionConfig {
            mode: TransitionMode::Shutter,
            ..Default::default()
        };
        assert_eq!(config.effective_mode(), TransitionMode::Shutter);

        config.enable_transition = false;
        assert_eq!(config.effective_mode(), TransitionMode::None);
    }

    #[test]
    fn test_to_duration() {
        assert_eq!(to_duration(0.5), Duration::from_millis(500));
        assert_eq!(to_duration(-1.0), Duration::ZERO);
        assert_eq!(to_duration(f32::INFINITY), Duration::ZERO);
    }

    #[test]
    fn test_partial_toml() {
        let config: TransitionConfig = toml::from_str(
            r#"
            mode = "noise"

            [noise]
            intensity = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.mode, TransitionMode::Noise);
        assert_eq!(config.noise.intensity, 0.5);
        assert_eq!(config.noise.out_duration, NoiseConfig::default().out_duration);
        assert!(config.enable_transition);
    }
}
