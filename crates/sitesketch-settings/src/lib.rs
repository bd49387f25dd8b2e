//! SiteSketch Settings Crate
//!
//! Handles application configuration, planning-boundary loading and
//! settings persistence.

pub mod boundary;
pub mod config;
pub mod controller;
pub mod error;
pub mod persistence;

pub use boundary::{load_boundary, parse_boundary_json};
pub use config::{
    BoundarySettings, Config, EditorSettings, KeySettings, LoggingSettings, ViewSettings,
};
pub use controller::SettingsController;
pub use error::{ConfigError, SettingsError, SettingsResult};
pub use persistence::SettingsPersistence;
