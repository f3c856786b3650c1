//! Image-backed color sampler.

use std::path::Path;

use herakoi_core::{ColorSample, ColorSampler, encode_rgba};
use image::DynamicImage;
use image::imageops::FilterType;

use crate::{Error, Result};

/// A decoded image held in the `[hue, saturation, value, alpha]` encoding.
///
/// The source pixels are encoded once at construction; sampling is a bounds
/// check and an index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageSampler {
    width: u32,
    height: u32,
    encoded: Vec<u8>,
}

impl ImageSampler {
    /// Encode a raw RGBA8 buffer of `width * height` pixels.
    pub fn from_rgba(width: u32, height: u32, rgba: &[u8]) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(Error::InvalidImage(format!(
                "expected {expected} bytes for {width}x{height} RGBA, got {}",
                rgba.len()
            )));
        }
        Ok(Self {
            width,
            height,
            encoded: encode_rgba(rgba),
        })
    }

    /// Encode an already decoded image.
    pub fn from_image(image: &DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self {
            width,
            height,
            encoded: encode_rgba(rgba.as_raw()),
        }
    }

    /// Decode the image at `path` at its native size.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path)?;
        let sampler = Self::from_image(&image);
        tracing::info!(
            path = %path.display(),
            width = sampler.width,
            height = sampler.height,
            "image loaded"
        );
        Ok(sampler)
    }

    /// Decode the image at `path` and scale it to exactly `width` x `height`,
    /// the canvas the detection coordinates refer to.
    pub fn open_resized<P: AsRef<Path>>(path: P, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidImage(format!(
                "canvas size must be non-zero, got {width}x{height}"
            )));
        }
        let path = path.as_ref();
        let image = image::open(path)?;
        let resized = image.resize_exact(width, height, FilterType::Triangle);
        tracing::info!(
            path = %path.display(),
            source_width = image.width(),
            source_height = image.height(),
            width,
            height,
            "image loaded and resized"
        );
        Ok(Self::from_image(&resized))
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Encoded pixel data, four bytes per pixel, row-major.
    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }
}

impl ColorSampler for ImageSampler {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn sample_at_pixel(&self, x: i32, y: i32) -> Option<ColorSample> {
        let x = u32::try_from(x).ok().filter(|x| *x < self.width)?;
        let y = u32::try_from(y).ok().filter(|y| *y < self.height)?;
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.encoded.get(idx..idx + 4)?;
        Some(ColorSample {
            hue_byte: px[0],
            saturation_byte: px[1],
            value_byte: px[2],
            alpha: px[3],
        })
    }
}
