//! Color → tone parameter mapping.
//!
//! In the default [`MappingMode::HueValue`] mode both axes are plain linear
//! interpolation over the byte range:
//!
//! ```text
//! frequency = min_freq + (hue_byte   / 255) * (max_freq - min_freq)
//! volume    = min_vol  + (value_byte / 255) * (max_vol  - min_vol)
//! ```
//!
//! [`MappingMode::ThreeChannel`] keeps the frequency axis, adds saturation as
//! a stereo position, and uses a logarithmic brightness curve with a fixed
//! 0.1 to 1.0 range so dim regions stay audible:
//!
//! ```text
//! pan    = -1 + 2 * (saturation_byte / 255)
//! volume = 0.1 + 0.9 * log10(1 + 9 * (value_byte / 255))
//! ```
//!
//! The mapping is pure and total over its byte inputs. Range ordering
//! (`min_freq < max_freq`, `min_vol <= max_vol`) is the caller's contract and
//! is validated where ranges are configured, not here.

use core::fmt;
use core::str::FromStr;

use crate::color::ColorSample;
use crate::math::{byte_fraction, lerp};
use crate::tone::ToneParams;

/// Default lower frequency bound in Hz.
pub const DEFAULT_MIN_FREQ: f32 = 200.0;
/// Default upper frequency bound in Hz.
pub const DEFAULT_MAX_FREQ: f32 = 700.0;
/// Default lower volume bound.
pub const DEFAULT_MIN_VOL: f32 = 0.0;
/// Default upper volume bound.
pub const DEFAULT_MAX_VOL: f32 = 0.2;
/// Volume of a black pixel under the three-channel brightness curve.
pub const BRIGHTNESS_VOL_FLOOR: f32 = 0.1;

/// Which color channels drive which tone parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum MappingMode {
    /// Hue → frequency, value → volume, both linear. Voices are unpanned.
    #[default]
    HueValue,
    /// Hue → frequency, saturation → pan, value → logarithmic volume.
    ThreeChannel,
}

impl MappingMode {
    /// All modes, in display order.
    pub const ALL: [MappingMode; 2] = [MappingMode::HueValue, MappingMode::ThreeChannel];

    /// Kebab-case name, as used in config files and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            MappingMode::HueValue => "hue-value",
            MappingMode::ThreeChannel => "three-channel",
        }
    }
}

impl fmt::Display for MappingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a string names no known [`MappingMode`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseMappingModeError;

impl fmt::Display for ParseMappingModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("expected one of: hue-value, three-channel")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseMappingModeError {}

impl FromStr for MappingMode {
    type Err = ParseMappingModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MappingMode::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s.trim()))
            .ok_or(ParseMappingModeError)
    }
}

/// Output ranges for the color → tone mapping.
///
/// ## Parameters
/// - `min_freq` / `max_freq`: Frequency range in Hz (default 200.0 to 700.0)
/// - `min_vol` / `max_vol`: Linear gain range (default 0.0 to 0.2), used by
///   the hue-value mode only
/// - `mode`: Which channels drive which parameters (default hue-value)
///
/// # Example
///
/// ```rust
/// use herakoi_core::{ColorSample, ToneMapping};
///
/// let mapping = ToneMapping::new(200.0, 700.0, 0.0, 1.0);
/// let params = mapping.map(ColorSample {
///     hue_byte: 255,
///     saturation_byte: 255,
///     value_byte: 0,
///     alpha: 255,
/// });
/// assert_eq!(params.frequency, 700.0);
/// assert_eq!(params.volume, 0.0);
/// assert_eq!(params.pan, None);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ToneMapping {
    /// Frequency at hue byte 0.
    pub min_freq: f32,
    /// Frequency at hue byte 255.
    pub max_freq: f32,
    /// Volume at value byte 0.
    pub min_vol: f32,
    /// Volume at value byte 255.
    pub max_vol: f32,
    /// Channel assignment.
    pub mode: MappingMode,
}

impl Default for ToneMapping {
    fn default() -> Self {
        Self::new(
            DEFAULT_MIN_FREQ,
            DEFAULT_MAX_FREQ,
            DEFAULT_MIN_VOL,
            DEFAULT_MAX_VOL,
        )
    }
}

impl ToneMapping {
    /// Create a mapping from explicit ranges.
    pub const fn new(min_freq: f32, max_freq: f32, min_vol: f32, max_vol: f32) -> Self {
        Self {
            min_freq,
            max_freq,
            min_vol,
            max_vol,
            mode: MappingMode::HueValue,
        }
    }

    /// The same ranges under `mode`.
    pub const fn with_mode(self, mode: MappingMode) -> Self {
        Self { mode, ..self }
    }

    /// Frequency in Hz for a hue byte.
    #[inline]
    pub fn frequency(&self, hue_byte: u8) -> f32 {
        lerp(self.min_freq, self.max_freq, byte_fraction(hue_byte))
    }

    /// Volume for a value (brightness) byte.
    #[inline]
    pub fn volume(&self, value_byte: u8) -> f32 {
        lerp(self.min_vol, self.max_vol, byte_fraction(value_byte))
    }

    /// Logarithmic volume for a value byte, from
    /// [`BRIGHTNESS_VOL_FLOOR`] at 0 to 1.0 at 255.
    #[inline]
    pub fn brightness_volume(&self, value_byte: u8) -> f32 {
        let curve = libm::log10f(1.0 + 9.0 * byte_fraction(value_byte));
        lerp(BRIGHTNESS_VOL_FLOOR, 1.0, curve)
    }

    /// Stereo position for a saturation byte, -1.0 at 0 to 1.0 at 255.
    #[inline]
    pub fn pan(&self, saturation_byte: u8) -> f32 {
        lerp(-1.0, 1.0, byte_fraction(saturation_byte))
    }

    /// Map a full color sample under the configured mode. Alpha is ignored.
    #[inline]
    pub fn map(&self, sample: ColorSample) -> ToneParams {
        let frequency = self.frequency(sample.hue_byte);
        match self.mode {
            MappingMode::HueValue => ToneParams::new(frequency, self.volume(sample.value_byte)),
            MappingMode::ThreeChannel => {
                ToneParams::new(frequency, self.brightness_volume(sample.value_byte))
                    .with_pan(self.pan(sample.saturation_byte))
            }
        }
    }
}
