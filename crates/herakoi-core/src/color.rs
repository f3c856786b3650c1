//! Color samples and the HSV pixel encoding.
//!
//! Images are encoded once into sonification-friendly bytes: the HSV hue
//! (degrees, scaled to a byte) drives pitch, the HSV value (brightness)
//! drives loudness, and the HSV saturation positions a voice in the stereo
//! field when the three-channel mapping is selected. Hues above 340° are folded down to 340° so that deep
//! magentas do not wrap around to the same pitch as pure red.
//!
//! ## Encoded Layout
//!
//! [`encode_rgba`] keeps the 4-bytes-per-pixel layout of its input:
//!
//! ```text
//! [hue, saturation, value, alpha]  per pixel
//! ```

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// Hue ceiling in degrees; anything above is clipped to this value.
pub const HUE_CEILING_DEG: f64 = 340.0;

/// Color of an image at one pixel, in encoded form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColorSample {
    /// Hue scaled from [0°, 360°) to [0, 255].
    pub hue_byte: u8,
    /// HSV saturation scaled to [0, 255]. Gray pixels have 0.
    pub saturation_byte: u8,
    /// HSV value (brightness) scaled to [0, 255].
    pub value_byte: u8,
    /// Source alpha. Carried through, not used for mapping.
    pub alpha: u8,
}

/// Source of color samples at pixel coordinates.
///
/// Implemented by image-backed samplers in `herakoi-io`. The driver queries it
/// once per tracked point per frame.
pub trait ColorSampler {
    /// Width and height of the sampled surface in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// Sample the encoded color at `(x, y)`.
    ///
    /// Returns `None` when the coordinate lies outside the surface; callers
    /// must skip the point in that case.
    fn sample_at_pixel(&self, x: i32, y: i32) -> Option<ColorSample>;
}

/// Encode one RGB pixel into `(hue_byte, value_byte)`.
///
/// Follows the standard RGB → HSV hue formula with the hue clipped at
/// [`HUE_CEILING_DEG`]. Gray pixels (no chroma) have hue 0.
pub fn encode_hue_value(r: u8, g: u8, b: u8) -> (u8, u8) {
    let (hue, _, value) = encode_hsv(r, g, b);
    (hue, value)
}

/// Encode one RGB pixel into `(hue_byte, saturation_byte, value_byte)`.
///
/// Hue is encoded as in [`encode_hue_value`]. Saturation is `chroma / max`,
/// zero for black.
pub fn encode_hsv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let r = f64::from(r) / 255.0;
    let g = f64::from(g) / 255.0;
    let b = f64::from(b) / 255.0;

    let cmax = r.max(g).max(b);
    let cmin = r.min(g).min(b);
    let delta = cmax - cmin;

    let mut hue = 0.0;
    if delta != 0.0 {
        // `%` keeps the sign of the dividend, so red-dominant pixels with
        // g < b land in (-60, 0) and are wrapped below.
        hue = if cmax == r {
            60.0 * (((g - b) / delta) % 6.0)
        } else if cmax == g {
            60.0 * ((b - r) / delta + 2.0)
        } else {
            60.0 * ((r - g) / delta + 4.0)
        };
    }

    if hue < 0.0 {
        hue += 360.0;
    }
    if hue > HUE_CEILING_DEG {
        hue = HUE_CEILING_DEG;
    }

    let saturation = if cmax == 0.0 { 0.0 } else { delta / cmax };

    let hue_byte = libm::round(hue / 360.0 * 255.0) as u8;
    let saturation_byte = libm::round(saturation * 255.0) as u8;
    let value_byte = libm::round(cmax * 255.0) as u8;
    (hue_byte, saturation_byte, value_byte)
}

/// Encode an RGBA8 buffer into the `[hue, saturation, value, alpha]` layout.
///
/// The input is left untouched. Trailing bytes that do not form a full pixel
/// are ignored.
pub fn encode_rgba(pixels: &[u8]) -> Vec<u8> {
    let mut encoded = Vec::with_capacity(pixels.len() - pixels.len() % 4);
    for px in pixels.chunks_exact(4) {
        let (hue, saturation, value) = encode_hsv(px[0], px[1], px[2]);
        encoded.extend_from_slice(&[hue, saturation, value, px[3]]);
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primaries_map_to_thirds_of_the_hue_range() {
        assert_eq!(encode_hue_value(255, 0, 0), (0, 255));
        assert_eq!(encode_hue_value(0, 255, 0), (85, 255));
        assert_eq!(encode_hue_value(0, 0, 255), (170, 255));
    }

    #[test]
    fn gray_has_zero_hue() {
        assert_eq!(encode_hue_value(128, 128, 128), (0, 128));
        assert_eq!(encode_hue_value(0, 0, 0), (0, 0));
    }

    #[test]
    fn saturation_is_chroma_over_max() {
        assert_eq!(encode_hsv(255, 0, 0), (0, 255, 255));
        assert_eq!(encode_hsv(255, 128, 128).1, 127);
        assert_eq!(encode_hsv(200, 200, 200).1, 0);
        assert_eq!(encode_hsv(0, 0, 0), (0, 0, 0));
    }

    #[test]
    fn negative_hue_wraps_before_clipping() {
        // Red-dominant with b > g sits just below 360° and clips to 340°.
        let (hue, _) = encode_hue_value(255, 0, 10);
        assert_eq!(hue, 241);
    }

    #[test]
    fn encode_rgba_keeps_alpha_and_input() {
        let input = [255, 0, 0, 255, 128, 128, 128, 200];
        let encoded = encode_rgba(&input);
        assert_eq!(encoded, vec![0, 255, 255, 255, 0, 0, 128, 200]);
        assert_eq!(input, [255, 0, 0, 255, 128, 128, 128, 200]);
    }

    #[test]
    fn encode_rgba_drops_partial_pixels() {
        let encoded = encode_rgba(&[0, 255, 0, 255, 9, 9]);
        assert_eq!(encoded.len(), 4);
    }
}
