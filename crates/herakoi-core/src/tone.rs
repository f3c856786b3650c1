//! Tone identifiers and per-voice parameters.
//!
//! A tone is keyed by an opaque [`VoiceId`] supplied by the detection side
//! (one per tracked fingertip). The id is compared by value only; the engine
//! never parses or deduplicates it.

#[cfg(not(feature = "std"))]
use alloc::string::String;

use core::fmt;

/// Opaque, stable identifier of a voice.
///
/// Ids are supplied by the caller and must stay stable across frames for the
/// same tracked entity. Two ids are the same voice exactly when their strings
/// are equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct VoiceId(String);

impl VoiceId {
    /// Create an id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VoiceId {
    fn from(id: &str) -> Self {
        Self(id.into())
    }
}

impl From<String> for VoiceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for VoiceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Audible parameters of one voice.
///
/// ## Parameters
/// - `frequency`: Oscillator frequency in Hz (must be positive)
/// - `volume`: Linear gain, 0.0 to 1.0
/// - `pan`: Stereo position, -1.0 (left) to 1.0 (right), or `None` for an
///   unpanned voice
///
/// No field is validated here; range checking belongs to whoever
/// configures the mapping.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ToneParams {
    /// Frequency in Hz.
    pub frequency: f32,
    /// Linear gain in [0, 1].
    pub volume: f32,
    /// Stereo position in [-1, 1]. Set only by the three-channel mapping.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub pan: Option<f32>,
}

impl ToneParams {
    /// Create unpanned parameters.
    pub const fn new(frequency: f32, volume: f32) -> Self {
        Self {
            frequency,
            volume,
            pan: None,
        }
    }

    /// The same parameters placed at `pan` in the stereo field.
    pub const fn with_pan(self, pan: f32) -> Self {
        Self {
            pan: Some(pan),
            ..self
        }
    }
}

/// One entry of a per-frame update list.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ToneUpdate {
    /// Voice the parameters belong to.
    pub id: VoiceId,
    /// Parameters to schedule.
    pub params: ToneParams,
}

impl ToneUpdate {
    /// Create an update for `id`.
    pub fn new(id: impl Into<VoiceId>, params: ToneParams) -> Self {
        Self {
            id: id.into(),
            params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voice_id_compares_by_value() {
        let a = VoiceId::from("hand-0-index-tip");
        let b = VoiceId::new(String::from("hand-0-index-tip"));
        assert_eq!(a, b);
        assert_ne!(a, VoiceId::from("hand-1-index-tip"));
    }

    #[test]
    fn voice_id_display_is_raw_string() {
        let id = VoiceId::from("finger-1");
        assert_eq!(id.to_string(), "finger-1");
        assert_eq!(id.as_str(), "finger-1");
    }

    #[test]
    fn tone_update_accepts_str_ids() {
        let update = ToneUpdate::new("a", ToneParams::new(440.0, 0.2));
        assert_eq!(update.id.as_str(), "a");
        assert_eq!(update.params.frequency, 440.0);
        assert_eq!(update.params.volume, 0.2);
        assert_eq!(update.params.pan, None);
    }

    #[test]
    fn with_pan_keeps_frequency_and_volume() {
        let params = ToneParams::new(440.0, 0.5).with_pan(-0.25);
        assert_eq!(params.frequency, 440.0);
        assert_eq!(params.volume, 0.5);
        assert_eq!(params.pan, Some(-0.25));
    }
}
