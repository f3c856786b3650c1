//! Configuration validation.
//!
//! The core mapping and registry accept any numbers; this module rejects
//! ranges that would produce inaudible, inverted or non-finite output before
//! they get there. [`validate_config`] reports every problem at once.
//!
//! # Example
//!
//! ```rust
//! use herakoi_config::{HerakoiConfig, ValidationError};
//!
//! let mut config = HerakoiConfig::default();
//! config.tone.min_freq = 900.0;
//! config.tracking.max_hands = 0;
//!
//! match config.validate() {
//!     Err(ValidationError::Multiple(errors)) => assert_eq!(errors.len(), 2),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

use herakoi_synth::MAX_HANDS_LIMIT;
use thiserror::Error;

use crate::HerakoiConfig;

/// Lowest frequency accepted for either end of the tone range, in Hz.
pub const MIN_FREQUENCY_HZ: f64 = 20.0;
/// Highest frequency accepted for either end of the tone range, in Hz.
pub const MAX_FREQUENCY_HZ: f64 = 20_000.0;
/// Longest accepted fade, in milliseconds.
pub const MAX_FADE_MS: u64 = 10_000;
/// Longest accepted update interval, in milliseconds.
pub const MAX_UPDATE_INTERVAL_MS: u64 = 10_000;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Value out of its allowed range.
    #[error("'{field}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Dotted field name, e.g. `tone.max_vol`.
        field: String,
        /// The offending value.
        value: f64,
        /// Minimum allowed value.
        min: f64,
        /// Maximum allowed value.
        max: f64,
    },

    /// Lower bound above the upper bound.
    #[error("'{field}' range is inverted: min {min} > max {max}")]
    InvertedRange {
        /// Table holding the range, e.g. `tone` frequency.
        field: String,
        /// Configured lower bound.
        min: f64,
        /// Configured upper bound.
        max: f64,
    },

    /// NaN or infinite value.
    #[error("'{field}' must be a finite number")]
    NotFinite {
        /// Dotted field name.
        field: String,
    },

    /// Frequency at or above half the output sample rate.
    #[error("'{field}' {value} Hz is above the Nyquist frequency {nyquist} Hz")]
    AboveNyquist {
        /// Dotted field name.
        field: String,
        /// Configured frequency.
        value: f64,
        /// Half the output sample rate.
        nyquist: f64,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Check that `value` is finite and inside `[min, max]`.
pub fn validate_range(field: &str, value: f64, min: f64, max: f64) -> ValidationResult<()> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite {
            field: field.to_string(),
        });
    }
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Collects errors across checks.
#[derive(Default)]
struct Collector {
    errors: Vec<ValidationError>,
}

impl Collector {
    fn check(&mut self, result: ValidationResult<()>) -> bool {
        match result {
            Ok(()) => true,
            Err(e) => {
                self.errors.push(e);
                false
            }
        }
    }

    fn finish(mut self) -> ValidationResult<()> {
        match self.errors.len() {
            0 => Ok(()),
            1 => Err(self.errors.remove(0)),
            _ => Err(ValidationError::Multiple(self.errors)),
        }
    }
}

/// Validate a full configuration.
///
/// Returns the single error when there is one, [`ValidationError::Multiple`]
/// when there are several.
pub fn validate_config(config: &HerakoiConfig) -> ValidationResult<()> {
    let mut errors = Collector::default();
    let tone = &config.tone;
    let output = &config.output;

    let min_freq = f64::from(tone.min_freq);
    let max_freq = f64::from(tone.max_freq);
    let min_freq_ok = errors.check(validate_range(
        "tone.min_freq",
        min_freq,
        MIN_FREQUENCY_HZ,
        MAX_FREQUENCY_HZ,
    ));
    let max_freq_ok = errors.check(validate_range(
        "tone.max_freq",
        max_freq,
        MIN_FREQUENCY_HZ,
        MAX_FREQUENCY_HZ,
    ));
    let freq_ok = min_freq_ok && max_freq_ok;
    if freq_ok && min_freq >= max_freq {
        errors.errors.push(ValidationError::InvertedRange {
            field: "tone frequency".to_string(),
            min: min_freq,
            max: max_freq,
        });
    }
    if freq_ok && output.sample_rate > 0 {
        let nyquist = f64::from(output.sample_rate) / 2.0;
        if max_freq >= nyquist {
            errors.errors.push(ValidationError::AboveNyquist {
                field: "tone.max_freq".to_string(),
                value: max_freq,
                nyquist,
            });
        }
    }

    let min_vol = f64::from(tone.min_vol);
    let max_vol = f64::from(tone.max_vol);
    let min_vol_ok = errors.check(validate_range("tone.min_vol", min_vol, 0.0, 1.0));
    let max_vol_ok = errors.check(validate_range("tone.max_vol", max_vol, 0.0, 1.0));
    if min_vol_ok && max_vol_ok && min_vol > max_vol {
        errors.errors.push(ValidationError::InvertedRange {
            field: "tone volume".to_string(),
            min: min_vol,
            max: max_vol,
        });
    }

    let voices = &config.voices;
    errors.check(validate_range(
        "voices.fade_ms",
        voices.fade_ms as f64,
        1.0,
        MAX_FADE_MS as f64,
    ));
    errors.check(validate_range(
        "voices.update_interval_ms",
        voices.update_interval_ms as f64,
        0.0,
        MAX_UPDATE_INTERVAL_MS as f64,
    ));
    // The exponential ramp needs a strictly positive target.
    if errors.check(validate_range(
        "voices.fade_floor",
        f64::from(voices.fade_floor),
        0.0,
        0.1,
    )) && voices.fade_floor <= 0.0
    {
        errors.errors.push(ValidationError::OutOfRange {
            field: "voices.fade_floor".to_string(),
            value: f64::from(voices.fade_floor),
            min: f64::MIN_POSITIVE,
            max: 0.1,
        });
    }

    errors.check(validate_range(
        "tracking.max_hands",
        config.tracking.max_hands as f64,
        1.0,
        MAX_HANDS_LIMIT as f64,
    ));

    errors.check(validate_range(
        "output.sample_rate",
        f64::from(output.sample_rate),
        8000.0,
        192_000.0,
    ));
    errors.check(validate_range(
        "output.buffer_size",
        f64::from(output.buffer_size),
        16.0,
        8192.0,
    ));
    errors.check(validate_range(
        "output.channels",
        f64::from(output.channels),
        1.0,
        8.0,
    ));

    errors.finish()
}
