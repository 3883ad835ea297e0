//! Engine and store configuration.

use crate::shapes::{SerializableColor, ShapeStyle};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Placeholder content of a freshly created text shape.
pub const DEFAULT_TEXT_PLACEHOLDER: &str = "Type your text";
/// Where imported images land.
pub const DEFAULT_IMAGE_ORIGIN: Point = Point::new(50.0, 50.0);

pub const DEFAULT_API_URL: &str = "http://localhost:3030";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

/// Tunables for the interaction engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Color applied to new shapes.
    pub default_color: SerializableColor,
    /// Stroke width applied to new shapes.
    pub default_stroke_width: f64,
    /// Content given to a new text shape. Text left at this value is dropped.
    pub text_placeholder: String,
    /// Top-left corner for imported images.
    pub image_origin: Point,
    /// Pointer slack when picking a shape.
    pub hit_tolerance: f64,
    /// Pointer slack when grabbing a handle.
    pub handle_tolerance: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_color: SerializableColor::black(),
            default_stroke_width: 2.0,
            text_placeholder: DEFAULT_TEXT_PLACEHOLDER.to_string(),
            image_origin: DEFAULT_IMAGE_ORIGIN,
            hit_tolerance: 4.0,
            handle_tolerance: crate::selection::HANDLE_HIT_TOLERANCE,
        }
    }
}

impl EngineConfig {
    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_stroke_width.is_nan() || self.default_stroke_width <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "defaultStrokeWidth",
                message: format!("must be positive, got {}", self.default_stroke_width),
            });
        }
        if self.hit_tolerance < 0.0 || self.handle_tolerance < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "hitTolerance",
                message: "tolerances must not be negative".to_string(),
            });
        }
        Ok(())
    }

    /// Style given to new shapes.
    pub fn default_style(&self) -> ShapeStyle {
        ShapeStyle::new(self.default_color, self.default_stroke_width)
    }
}

/// Request timeouts for the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

/// Remote project store settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Base URL, without a trailing slash.
    pub api_url: String,
    pub timeouts: StoreTimeouts,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeouts: StoreTimeouts {
                request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            },
        }
    }
}

impl StoreConfig {
    /// Build from environment variables.
    ///
    /// Optional:
    /// - `SKETCHBOARD_API_URL`: default `http://localhost:3030`
    /// - `SKETCHBOARD_REQUEST_TIMEOUT_SECS`: default 30
    /// - `SKETCHBOARD_CONNECT_TIMEOUT_SECS`: default 10
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parse_u64 = |key: &str, default: u64| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(default)
        };

        let api_url = lookup("SKETCHBOARD_API_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim()
            .trim_end_matches('/')
            .to_string();

        Self {
            api_url,
            timeouts: StoreTimeouts {
                request_secs: parse_u64("SKETCHBOARD_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
                connect_secs: parse_u64("SKETCHBOARD_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
            },
        }
    }

    /// Project collection endpoint.
    pub fn projects_url(&self) -> String {
        format!("{}/api/projects", self.api_url)
    }

    /// Endpoint for a single project.
    pub fn project_url(&self, project_id: &str) -> String {
        format!("{}/{}", self.projects_url(), project_id)
    }

    /// Canvas endpoint for a project.
    pub fn canvas_url(&self, project_id: &str) -> String {
        format!("{}/canvas", self.project_url(project_id))
    }
}
