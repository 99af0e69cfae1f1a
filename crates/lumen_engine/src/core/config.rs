//! # Engine Configuration
//!
//! Serializable settings for the engine runtime, loadable from TOML or RON
//! through the [`Config`] trait.
//!
//! ## Sections
//!
//! - **Logging**: default log filter
//! - **Errors**: how the driver reports an error that aborts the frame loop
//! - **Renderer**: initial viewport, refresh color, offscreen target
//! - **Frame loop**: update rate and an optional frame cap

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use crate::config::{Config, ConfigError};
use crate::foundation::color::Color;

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter handed to `env_logger` when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Error reporting settings
///
/// Passed explicitly to the error reporter when the system is built.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorConfig {
    /// Report a full dump (modules, system flags) instead of the bare message
    pub verbose: bool,
    /// Also write the report to this file, truncating it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

/// Renderer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Initial viewport width in pixels
    pub width: u32,
    /// Initial viewport height in pixels
    pub height: u32,
    /// Color the frame is cleared to
    pub refresh_color: Color,
    /// Render into an offscreen framebuffer and blit it to the surface
    pub offscreen: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            refresh_color: Color::BLACK,
            offscreen: true,
        }
    }
}

impl RendererConfig {
    /// Builder: viewport size
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Builder: refresh color
    pub fn with_refresh_color(mut self, color: Color) -> Self {
        self.refresh_color = color;
        self
    }

    /// Builder: offscreen rendering on or off
    pub fn with_offscreen(mut self, enabled: bool) -> Self {
        self.offscreen = enabled;
        self
    }

    /// Validate the renderer configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!(
                "Viewport must be non-empty, got {}x{}",
                self.width, self.height
            ));
        }
        Ok(())
    }
}

/// Frame loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameLoopConfig {
    /// Target updates per second; 0 runs unthrottled
    pub updates_per_second: u32,
    /// Stop after this many frames
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_frames: Option<u64>,
}

impl Default for FrameLoopConfig {
    fn default() -> Self {
        Self {
            updates_per_second: 60,
            max_frames: None,
        }
    }
}

/// # Engine Configuration
///
/// Top-level configuration consumed by the system driver and the graphics module.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Logging settings
    pub logging: LoggingConfig,
    /// Error reporting settings
    pub errors: ErrorConfig,
    /// Renderer settings
    pub renderer: RendererConfig,
    /// Frame loop settings
    pub frame_loop: FrameLoopConfig,
}

impl EngineConfig {
    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.logging.level = level.into();
        self
    }

    /// Set verbose error dumps
    pub fn with_verbose_errors(mut self, verbose: bool) -> Self {
        self.errors.verbose = verbose;
        self
    }

    /// Set the error log file
    pub fn with_error_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.errors.log_file = Some(path.into());
        self
    }

    /// Set the target update rate
    pub fn with_updates_per_second(mut self, ups: u32) -> Self {
        self.frame_loop.updates_per_second = ups;
        self
    }

    /// Cap the number of frames `System::run` executes
    pub fn with_max_frames(mut self, frames: u64) -> Self {
        self.frame_loop.max_frames = Some(frames);
        self
    }

    /// Replace the renderer section
    pub fn with_renderer(mut self, renderer: RendererConfig) -> Self {
        self.renderer = renderer;
        self
    }

    /// Validate the whole configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.logging.level.trim().is_empty() {
            return Err("Log level cannot be empty".to_string());
        }
        self.renderer.validate()
    }

    /// Load from file and validate
    pub fn load_validated(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let config = Self::load_or_default(path)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }
}

impl Config for EngineConfig {}
