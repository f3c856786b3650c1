//! Small numeric helpers shared by mapping and rendering.

/// Linear interpolation between two values.
///
/// # Arguments
/// * `a` - Start value (at t=0)
/// * `b` - End value (at t=1)
/// * `t` - Interpolation factor (0.0 to 1.0)
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Fraction of the full byte range, `byte / 255`.
#[inline]
pub fn byte_fraction(byte: u8) -> f32 {
    f32::from(byte) / 255.0
}

/// Convert seconds to a whole number of frames at `sample_rate`.
#[inline]
pub fn seconds_to_frames(seconds: f64, sample_rate: f32) -> u64 {
    libm::round(seconds * f64::from(sample_rate)).max(0.0) as u64
}

/// Left and right channel gains of an equal-power pan at `pan` in [-1, 1].
///
/// Centered input lands at -3 dB on each side; out-of-range positions are
/// clamped.
#[inline]
pub fn equal_power_pan(pan: f32) -> (f32, f32) {
    // Constant-power pan law: left = cos(angle), right = sin(angle)
    let angle = (pan.clamp(-1.0, 1.0) + 1.0) * core::f32::consts::FRAC_PI_4;
    let (sin_a, cos_a) = libm::sincosf(angle);
    (cos_a, sin_a)
}

/// Flush subnormal (denormalized) floats to zero.
///
/// Replaces values below 1e-20 with zero, leaving margin before the IEEE 754
/// subnormal range. Used on the summed render output, where faded voices
/// decay toward zero.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}
