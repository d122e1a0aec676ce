//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory where exported files are written.
    pub output_dir: PathBuf,

    /// Default token composite settings.
    pub token: TokenDefaults,

    /// Default export parameters.
    pub export: ExportDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default token composite parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenDefaults {
    /// Logical render surface size in pixels (square).
    pub canvas_size: u32,

    /// Whether the background is cut to a circle (false = square).
    pub is_circular: bool,

    /// Mask scale relative to the canvas, expected in [0.5, 1.1].
    pub mask_scale: f64,
}

/// Default export parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDefaults {
    /// Capture sample rate in frames per second.
    pub capture_fps: u32,

    /// Clip duration when no motion media supplies one (seconds).
    pub default_clip_secs: f64,

    /// Hard cap on clip duration (seconds).
    pub max_clip_secs: f64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "tokenforge=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            token: TokenDefaults::default(),
            export: ExportDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for TokenDefaults {
    fn default() -> Self {
        Self {
            canvas_size: 1024,
            is_circular: true,
            mask_scale: 0.98,
        }
    }
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            capture_fps: 60,
            default_clip_secs: 5.0,
            max_clip_secs: 15.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("tokenforge").join("config.json")
}
