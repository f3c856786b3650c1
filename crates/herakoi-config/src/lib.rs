//! Configuration for herakoi.
//!
//! # Features
//!
//! - **Config file**: [`HerakoiConfig`] loads and saves `herakoi.toml` with
//!   `[tone]`, `[voices]`, `[tracking]` and `[output]` tables
//! - **Validation**: [`validate_config`] rejects unusable ranges, reporting
//!   every problem at once
//! - **Paths**: Platform-specific config and detection track directories
//!
//! # Example
//!
//! ```rust,no_run
//! use herakoi_config::{HerakoiConfig, default_config_path};
//!
//! let (config, source) = HerakoiConfig::discover(None).unwrap();
//! config.validate().unwrap();
//! println!("loaded from {source:?}, mapping {:?}", config.mapping());
//!
//! config.save(default_config_path()).unwrap();
//! ```

mod config;
mod error;

/// Platform-specific paths for configuration and tracks.
pub mod paths;

/// Configuration validation.
pub mod validation;

pub use config::{HerakoiConfig, OutputSection, TrackingSection, VoiceSection};
pub use error::ConfigError;
pub use paths::{
    CONFIG_FILE_NAME, default_config_path, ensure_user_config_dir, ensure_user_tracks_dir,
    find_config, find_track, list_user_tracks, track_name_from_path, user_config_dir,
    user_tracks_dir,
};
pub use validation::{ValidationError, ValidationResult, validate_config, validate_range};
