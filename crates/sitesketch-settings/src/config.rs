//! Configuration for SiteSketch
//!
//! Configuration is organized into sections:
//! - Editor behaviour (tolerances, focus, clipping epsilon)
//! - Key bindings for the session triggers
//! - The planning boundary source
//! - The headless view transform
//! - Logging
//!
//! Files are JSON or TOML, chosen by extension.

use crate::error::{ConfigError, SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Editor behaviour settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Grab radius around a vertex when reshaping, in map units
    pub vertex_tolerance: f64,
    /// Hit-test radius in screen pixels
    pub hit_tolerance_px: f64,
    /// Ask the view to focus the target before input begins
    pub focus_on_start: bool,
    /// Parts with area (polygons) or length (polylines) at or below this are dropped
    pub clip_epsilon: f64,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            vertex_tolerance: 1.0,
            hit_tolerance_px: 6.0,
            focus_on_start: true,
            clip_epsilon: 1e-9,
        }
    }
}

/// Key bindings, matched case-insensitively against key names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeySettings {
    pub complete: Vec<String>,
    pub cancel: Vec<String>,
    pub delete: Vec<String>,
}

impl Default for KeySettings {
    fn default() -> Self {
        Self {
            complete: vec!["c".to_string()],
            cancel: vec!["Escape".to_string()],
            delete: vec!["Delete".to_string(), "Backspace".to_string()],
        }
    }
}

/// Where the planning boundary comes from
///
/// Either a polygon JSON file (`path`) or inline `rings`. With neither set
/// the editor runs without a boundary and clipping is skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundarySettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rings: Option<Vec<Vec<[f64; 2]>>>,
    /// Spatial reference used when the source does not name one
    pub wkid: u32,
}

impl Default for BoundarySettings {
    fn default() -> Self {
        Self {
            path: None,
            rings: None,
            wkid: 3857,
        }
    }
}

impl BoundarySettings {
    pub fn is_configured(&self) -> bool {
        self.path.is_some() || self.rings.is_some()
    }
}

/// Screen-to-map transform of the headless view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    /// Map position of the screen origin (top-left)
    pub origin: [f64; 2],
    /// Map units per pixel
    pub resolution: f64,
    pub wkid: u32,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            origin: [0.0, 0.0],
            resolution: 1.0,
            wkid: 3857,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub editor: EditorSettings,
    pub keys: KeySettings,
    pub boundary: BoundarySettings,
    pub view: ViewSettings,
    pub logging: LoggingSettings,
}

enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> SettingsResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        other => Err(ConfigError::UnsupportedFormat(other.unwrap_or("<none>").to_string()).into()),
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse config text in the format implied by `path`
    pub fn from_str_for(path: &Path, content: &str) -> SettingsResult<Self> {
        let config: Self = match format_of(path)? {
            Format::Json => serde_json::from_str(content)?,
            Format::Toml => toml::from_str(content)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_str_for(path, &content)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        std::fs::write(path, content)?;
        tracing::debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        let editor = &self.editor;
        if !(editor.vertex_tolerance.is_finite() && editor.vertex_tolerance > 0.0) {
            return Err(SettingsError::invalid(
                "editor.vertex_tolerance",
                "must be > 0",
            ));
        }
        if !(editor.hit_tolerance_px.is_finite() && editor.hit_tolerance_px >= 0.0) {
            return Err(SettingsError::invalid(
                "editor.hit_tolerance_px",
                "must be >= 0",
            ));
        }
        if !(editor.clip_epsilon.is_finite() && editor.clip_epsilon >= 0.0) {
            return Err(SettingsError::invalid("editor.clip_epsilon", "must be >= 0"));
        }

        for (name, keys) in [
            ("keys.complete", &self.keys.complete),
            ("keys.cancel", &self.keys.cancel),
            ("keys.delete", &self.keys.delete),
        ] {
            if keys.is_empty() || keys.iter().any(|k| k.trim().is_empty()) {
                return Err(SettingsError::invalid(name, "needs at least one non-empty key"));
            }
        }
        let all: Vec<String> = self
            .keys
            .complete
            .iter()
            .chain(&self.keys.cancel)
            .chain(&self.keys.delete)
            .map(|k| k.to_lowercase())
            .collect();
        for (i, key) in all.iter().enumerate() {
            if all[i + 1..].contains(key) {
                return Err(SettingsError::invalid(
                    "keys",
                    format!("'{}' is bound more than once", key),
                ));
            }
        }

        if self.boundary.path.is_some() && self.boundary.rings.is_some() {
            return Err(ConfigError::AmbiguousBoundary(
                "set either boundary.path or boundary.rings, not both".to_string(),
            )
            .into());
        }

        if !(self.view.resolution.is_finite() && self.view.resolution > 0.0) {
            return Err(SettingsError::invalid("view.resolution", "must be > 0"));
        }

        if self.logging.level.trim().is_empty() {
            return Err(SettingsError::invalid("logging.level", "must not be empty"));
        }

        Ok(())
    }
}
