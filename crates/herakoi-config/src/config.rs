//! The `herakoi.toml` file format.

use std::path::{Path, PathBuf};
use std::time::Duration;

use herakoi_core::{ToneMapping, Waveform};
use herakoi_synth::{DEFAULT_MAX_HANDS, FADE_FLOOR, FrameDriver, VoiceTiming};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::paths;
use crate::validation::{ValidationResult, validate_config};

/// Voice lifecycle settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VoiceSection {
    /// Waveform of every voice.
    pub waveform: Waveform,
    /// Fade-out length in milliseconds.
    pub fade_ms: u64,
    /// Minimum spacing between applied updates of one voice, in milliseconds.
    pub update_interval_ms: u64,
    /// Gain the fade ramps down to.
    pub fade_floor: f32,
}

impl Default for VoiceSection {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            fade_ms: 100,
            update_interval_ms: 100,
            fade_floor: FADE_FLOOR,
        }
    }
}

/// Hand tracking settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TrackingSection {
    /// Hands considered per frame.
    pub max_hands: usize,
    /// Flip x before sampling, for selfie-style cameras.
    pub mirror: bool,
}

impl Default for TrackingSection {
    fn default() -> Self {
        Self {
            max_hands: DEFAULT_MAX_HANDS,
            mirror: false,
        }
    }
}

/// Audio output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputSection {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Preferred buffer size in frames.
    pub buffer_size: u32,
    /// Output channel count.
    pub channels: u16,
    /// Output device name filter; the system default when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            buffer_size: 512,
            channels: 2,
            device: None,
        }
    }
}

/// Complete herakoi configuration.
///
/// Every table and field is optional in the file; missing values take their
/// defaults.
///
/// # TOML Format
///
/// ```toml
/// [tone]
/// mode = "hue-value"        # or "three-channel"
/// min_freq = 200.0
/// max_freq = 700.0
/// min_vol = 0.0
/// max_vol = 0.2
///
/// [voices]
/// waveform = "sine"
/// fade_ms = 100
/// update_interval_ms = 100
/// fade_floor = 0.001
///
/// [tracking]
/// max_hands = 4
/// mirror = false
///
/// [output]
/// sample_rate = 48000
/// buffer_size = 512
/// channels = 2
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HerakoiConfig {
    /// Color → tone ranges and mapping mode.
    pub tone: ToneMapping,
    /// Voice lifecycle.
    pub voices: VoiceSection,
    /// Hand tracking.
    pub tracking: TrackingSection,
    /// Audio output.
    pub output: OutputSection,
}

impl HerakoiConfig {
    /// Load a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Load `explicit` if given, else the first file [`paths::find_config`]
    /// finds, else the defaults. Returns the path that was read, if any.
    pub fn discover(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => paths::find_config(),
        };
        match path {
            Some(path) => Ok((Self::load(&path)?, Some(path))),
            None => Ok((Self::default(), None)),
        }
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the configuration to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every field, collecting all problems.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_config(self)
    }

    /// Color → tone mapping.
    pub fn mapping(&self) -> ToneMapping {
        self.tone
    }

    /// Voice timing for the registry.
    pub fn timing(&self) -> VoiceTiming {
        VoiceTiming {
            fade: Duration::from_millis(self.voices.fade_ms),
            update_interval: Duration::from_millis(self.voices.update_interval_ms),
            fade_floor: self.voices.fade_floor,
        }
    }

    /// Frame driver configured with the mapping and tracking settings.
    pub fn frame_driver(&self) -> FrameDriver {
        FrameDriver::new(self.mapping())
            .with_mirror(self.tracking.mirror)
            .with_max_hands(self.tracking.max_hands)
    }
}
