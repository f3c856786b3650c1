//! Audio-rate oscillator with anti-aliasing.
//!
//! Band-limited oscillator for voice rendering using PolyBLEP
//! (Polynomial Band-Limited Step) to reduce aliasing on the waveforms with
//! discontinuities.

use core::f32::consts::PI;
use core::fmt;
use core::str::FromStr;
use libm::{floorf, sinf};

/// Euclidean remainder for f32, compatible with no_std.
#[inline]
fn rem_euclid_f32(a: f32, b: f32) -> f32 {
    let r = a - b * floorf(a / b);
    if r < 0.0 { r + b } else { r }
}

/// Oscillator waveform shared by every voice of a registry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Waveform {
    /// Pure fundamental tone.
    #[default]
    Sine,
    /// 50% duty square, odd harmonics.
    Square,
    /// All harmonics, bright timbre.
    Sawtooth,
    /// Odd harmonics, softer than square.
    Triangle,
}

impl Waveform {
    /// All waveforms, in display order.
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Sawtooth,
        Waveform::Triangle,
    ];

    /// Lowercase name, as used in config files and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Sawtooth => "sawtooth",
            Waveform::Triangle => "triangle",
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a string names no known [`Waveform`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseWaveformError;

impl fmt::Display for ParseWaveformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("expected one of: sine, square, sawtooth, triangle")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseWaveformError {}

impl FromStr for Waveform {
    type Err = ParseWaveformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Waveform::ALL
            .into_iter()
            .find(|w| w.name().eq_ignore_ascii_case(s.trim()))
            .ok_or(ParseWaveformError)
    }
}

/// Audio-rate oscillator with PolyBLEP anti-aliasing.
///
/// # Example
///
/// ```rust
/// use herakoi_core::{Oscillator, Waveform};
///
/// let mut osc = Oscillator::new(48000.0);
/// osc.set_frequency(440.0);
/// osc.set_waveform(Waveform::Sawtooth);
///
/// let sample = osc.advance();
/// assert!(sample.abs() <= 1.5);
/// ```
#[derive(Debug, Clone)]
pub struct Oscillator {
    /// Current phase position [0.0, 1.0)
    phase: f32,
    /// Phase increment per sample
    phase_inc: f32,
    sample_rate: f32,
    frequency: f32,
    waveform: Waveform,
    /// Leaky integrator state for the triangle
    prev_output: f32,
}

impl Default for Oscillator {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

impl Oscillator {
    /// Create a 440 Hz sine oscillator at the given sample rate.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            phase: 0.0,
            phase_inc: 440.0 / sample_rate,
            sample_rate,
            frequency: 440.0,
            waveform: Waveform::Sine,
            prev_output: 0.0,
        }
    }

    /// Set frequency in Hz. Negative values clamp to zero.
    #[inline]
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.frequency = freq_hz.max(0.0);
        self.phase_inc = self.frequency / self.sample_rate;
    }

    /// Current frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Set waveform type. Phase is kept so the change does not click twice.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    /// Current waveform.
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Reset phase and integrator state.
    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.prev_output = 0.0;
    }

    /// Generate the next sample.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        let output = self.generate_sample(self.phase, self.phase_inc);
        self.phase += self.phase_inc;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        output
    }

    /// Generate a sample at `phase` with PolyBLEP window width `dt`.
    ///
    /// - **Sine**: `sinf` directly, nothing to alias.
    /// - **Sawtooth**: naive ramp with PolyBLEP at the wrap.
    /// - **Square**: naive bipolar signal with PolyBLEP at both edges.
    /// - **Triangle**: leaky integration of the band-limited square.
    #[inline]
    fn generate_sample(&mut self, phase: f32, dt: f32) -> f32 {
        match self.waveform {
            Waveform::Sine => sinf(phase * 2.0 * PI),
            Waveform::Sawtooth => 2.0 * phase - 1.0 - poly_blep(phase, dt),
            Waveform::Square => square_with_dt(phase, dt),
            Waveform::Triangle => {
                let square = square_with_dt(phase, dt);
                // Coefficient approaches 1.0 at low frequencies, floor 0.9.
                let leak = 1.0 - (self.frequency / self.sample_rate).min(0.1);
                self.prev_output = leak * self.prev_output + square * dt * 4.0;
                self.prev_output
            }
        }
    }
}

#[inline]
fn square_with_dt(phase: f32, dt: f32) -> f32 {
    let naive = if phase < 0.5 { 1.0 } else { -1.0 };
    naive + poly_blep(phase, dt) - poly_blep(rem_euclid_f32(phase + 0.5, 1.0), dt)
}

/// 4th-order PolyBLEP correction.
///
/// C²-continuous degree-4 piecewise polynomial spanning two samples on each
/// side of the discontinuity.
///
/// Reference: Välimäki et al., "Antialiasing Oscillators", IEEE Signal
/// Processing Magazine, 2010.
///
/// # Arguments
/// * `t` - Current phase position in [0.0, 1.0)
/// * `dt` - Phase increment per sample (frequency / sample_rate)
#[inline]
fn poly_blep(t: f32, dt: f32) -> f32 {
    const A4: f32 = -43.0 / 48.0;
    const A3: f32 = 7.0 / 6.0;
    const A2: f32 = 0.5;
    const A0: f32 = -1.0;
    const C: f32 = -11.0 / 48.0;

    if dt <= 0.0 {
        return 0.0;
    }

    let dt2 = 2.0 * dt;
    if t < dt2 {
        let n = t / dt;
        if n < 1.0 {
            let n2 = n * n;
            A4 * n2 * n2 + A3 * n2 * n + A2 * n2 + A0
        } else {
            let u = 2.0 - n;
            let u2 = u * u;
            C * u2 * u2
        }
    } else if t > 1.0 - dt2 {
        let n = (1.0 - t) / dt;
        if n < 1.0 {
            let n2 = n * n;
            -(A4 * n2 * n2 + A3 * n2 * n + A2 * n2 + A0)
        } else {
            let u = 2.0 - n;
            let u2 = u * u;
            -(C * u2 * u2)
        }
    } else {
        0.0
    }
}
