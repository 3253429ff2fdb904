//! Stage Configuration
//!
//! Everything the composition root needs before it assembles the scene
//! orchestrator. The configuration is read once and never changes afterwards.
//!
//! # Configuration Sources (in priority order)
//!
//! 1. Environment variables: `VOID_STAGE_TRANSITION=shutter`,
//!    `VOID_STAGE_NO_TRANSITION=1`, `VOID_STAGE_DEBUG=1`
//! 2. Config file: the path in `VOID_STAGE_CONFIG`, or `stage.toml`
//! 3. Built-in defaults
//!
//! # Example Config File
//!
//! ```toml
//! [stage]
//! initial_scene = "menu"
//! tour = ["forest", "castle", "menu"]
//! preload = ["ui/loading_spinner", "audio/theme"]
//! debug = false
//!
//! [transition]
//! enable_transition = true
//! mode = "cinematic"   # none, fade, cinematic, shutter, noise
//! overlay_alpha = 1.0
//!
//! [transition.cinematic]
//! bar_height_ratio = 0.15
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use void_transition::{TransitionConfig, TransitionMode};

/// Default config file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "stage.toml";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Ignoring {var}: {reason}")]
    Override { var: &'static str, reason: String },
}

/// What the stage does once assembled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageSection {
    /// Scene entered first
    pub initial_scene: String,
    /// Scenes visited after the initial one, in order
    pub tour: Vec<String>,
    /// Assets warmed in the background while the initial scene loads
    pub preload: Vec<String>,
    /// Enable debug logging
    pub debug: bool,
}

impl Default for StageSection {
    fn default() -> Self {
        Self {
            initial_scene: "menu".to_string(),
            tour: vec!["forest".to_string(), "castle".to_string(), "menu".to_string()],
            preload: vec!["ui/loading_spinner".to_string(), "audio/theme".to_string()],
            debug: false,
        }
    }
}

/// Complete stage configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    pub stage: StageSection,
    pub transition: TransitionConfig,
    /// Where the configuration was read from
    #[serde(skip)]
    pub config_path: Option<String>,
}

impl StageConfig {
    /// Load configuration from all sources
    ///
    /// Never fails: a malformed file or a rejected override is returned
    /// alongside the usable configuration so the caller can report it once
    /// logging is up.
    pub fn load() -> (Self, Vec<ConfigError>) {
        let path = std::env::var("VOID_STAGE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let mut errors = Vec::new();
        let mut config = match Self::load_from_file(&path) {
            Ok(Some(config)) => config,
            Ok(None) => Self::default(),
            Err(e) => {
                errors.push(e);
                Self::default()
            }
        };

        errors.extend(config.apply_overrides(|name| std::env::var(name).ok()));
        config.transition = config.transition.sanitized();
        (config, errors)
    }

    /// Load configuration from a TOML file; `Ok(None)` if it does not exist
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Option<Self>, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(ConfigError::Io { path: display, source }),
        };

        let mut config = Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: display.clone(),
            source,
        })?;
        config.config_path = Some(display);
        Ok(Some(config))
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply overrides from `var`, normally the process environment
    ///
    /// Invalid values leave the setting untouched and are returned.
    pub fn apply_overrides<F>(&mut self, var: F) -> Vec<ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut rejected = Vec::new();

        if let Some(mode) = var("VOID_STAGE_TRANSITION") {
            match mode.parse::<TransitionMode>() {
                Ok(mode) => {
                    self.transition.mode = mode;
                    self.transition.enable_transition = true;
                }
                Err(reason) => rejected.push(ConfigError::Override {
                    var: "VOID_STAGE_TRANSITION",
                    reason,
                }),
            }
        }

        if var("VOID_STAGE_NO_TRANSITION").map_or(false, |v| is_truthy(&v)) {
            self.transition.enable_transition = false;
        }

        if var("VOID_STAGE_DEBUG").map_or(false, |v| is_truthy(&v)) {
            self.stage.debug = true;
        }

        rejected
    }

    /// Default log filter
    pub fn log_filter(&self) -> &'static str {
        if self.stage.debug {
            "debug"
        } else {
            "info"
        }
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        log::info!("Stage Configuration:");
        log::info!(
            "  Transition: {} (enabled: {}, effective: {})",
            self.transition.mode,
            self.transition.enable_transition,
            self.transition.effective_mode()
        );
        log::info!("  Initial scene: {}", self.stage.initial_scene);
        if !self.stage.tour.is_empty() {
            log::info!("  Tour: {}", self.stage.tour.join(" -> "));
        }
        if !self.stage.preload.is_empty() {
            log::info!("  Preload: {} asset(s)", self.stage.preload.len());
        }
        if let Some(path) = &self.config_path {
            log::info!("  Config: {}", path);
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
