//! Shared CLI helpers used across multiple commands.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use herakoi_config::{ConfigError, HerakoiConfig, find_track};
use herakoi_core::{MappingMode, Waveform};
use herakoi_io::{BackendStreamConfig, DEFAULT_FRAME_INTERVAL_MS, DetectionTrack, ImageSampler};

/// Options shared by the commands that run a sonification session.
#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// Image to sonify
    #[arg(value_name = "IMAGE")]
    pub image: PathBuf,

    /// Detection track (JSON path or name in the user track directory).
    /// A built-in horizontal sweep is used when absent.
    #[arg(short, long)]
    pub track: Option<String>,

    /// Frames of the built-in sweep
    #[arg(long, default_value = "150")]
    pub sweep_frames: usize,

    /// Canvas the track coordinates refer to, e.g. 640x480 (default: image size)
    #[arg(long, value_parser = parse_canvas)]
    pub canvas: Option<(u32, u32)>,

    /// Oscillator waveform: sine, square, sawtooth or triangle
    #[arg(short, long, value_parser = parse_waveform)]
    pub waveform: Option<Waveform>,

    /// Color mapping: hue-value, or three-channel (saturation pans)
    #[arg(long, value_parser = parse_mode)]
    pub mode: Option<MappingMode>,

    /// Mirror x coordinates (selfie view)
    #[arg(long)]
    pub mirror: bool,

    /// Hands considered per frame (1-8)
    #[arg(long)]
    pub max_hands: Option<usize>,

    /// Configuration file (default: ./herakoi.toml, then the user config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl SessionArgs {
    /// Load the configuration and apply the command-line overrides.
    pub fn load_config(&self) -> anyhow::Result<HerakoiConfig> {
        let mut config = load_config(self.config.as_deref())?;
        if let Some(waveform) = self.waveform {
            config.voices.waveform = waveform;
        }
        if let Some(mode) = self.mode {
            config.tone.mode = mode;
        }
        if self.mirror {
            config.tracking.mirror = true;
        }
        if let Some(max_hands) = self.max_hands {
            config.tracking.max_hands = max_hands;
        }
        config.validate().context("invalid settings")?;
        Ok(config)
    }

    /// Decode the image, scaled to the canvas when one is given.
    pub fn load_sampler(&self) -> anyhow::Result<ImageSampler> {
        load_sampler(&self.image, self.canvas)
    }

    /// The named track, or the built-in sweep for `hands` hands.
    pub fn load_track(&self, hands: usize) -> anyhow::Result<DetectionTrack> {
        load_track(self.track.as_deref(), self.sweep_frames, hands)
    }
}

/// Parse a `WIDTHxHEIGHT` canvas size for clap's `value_parser`.
pub fn parse_canvas(s: &str) -> Result<(u32, u32), String> {
    let lower = s.to_lowercase();
    let Some((w, h)) = lower.split_once('x') else {
        return Err(format!("Invalid canvas size: '{}' (expected WIDTHxHEIGHT)", s));
    };
    let width: u32 = w
        .trim()
        .parse()
        .map_err(|_| format!("Invalid canvas width: '{}'", w))?;
    let height: u32 = h
        .trim()
        .parse()
        .map_err(|_| format!("Invalid canvas height: '{}'", h))?;
    if width == 0 || height == 0 {
        return Err(format!("Canvas size must be non-zero: '{}'", s));
    }
    Ok((width, height))
}

/// Parse a waveform name for clap's `value_parser`.
pub fn parse_waveform(s: &str) -> Result<Waveform, String> {
    s.parse().map_err(|e: herakoi_core::ParseWaveformError| e.to_string())
}

/// Parse a mapping mode name for clap's `value_parser`.
pub fn parse_mode(s: &str) -> Result<MappingMode, String> {
    s.parse().map_err(|e: herakoi_core::ParseMappingModeError| e.to_string())
}

/// Load the configuration at `explicit`, or the discovered one.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<HerakoiConfig> {
    let (config, source) = HerakoiConfig::discover(explicit)?;
    match &source {
        Some(path) => tracing::info!(path = %path.display(), "using configuration file"),
        None => tracing::debug!("no configuration file found, using defaults"),
    }
    Ok(config)
}

/// Decode an image, scaled to `canvas` when given.
pub fn load_sampler(image: &Path, canvas: Option<(u32, u32)>) -> anyhow::Result<ImageSampler> {
    let sampler = match canvas {
        Some((width, height)) => ImageSampler::open_resized(image, width, height),
        None => ImageSampler::open(image),
    };
    sampler.with_context(|| format!("failed to load image '{}'", image.display()))
}

/// Load a track by name or path, or build the default sweep.
pub fn load_track(
    name: Option<&str>,
    sweep_frames: usize,
    hands: usize,
) -> anyhow::Result<DetectionTrack> {
    match name {
        Some(name) => {
            let path = find_track(name).ok_or_else(|| ConfigError::TrackNotFound(name.to_string()))?;
            Ok(DetectionTrack::load(&path)?)
        }
        None => Ok(DetectionTrack::horizontal_sweep(
            sweep_frames,
            hands,
            DEFAULT_FRAME_INTERVAL_MS,
        )),
    }
}

/// Output stream settings from the `[output]` table.
pub fn stream_config(config: &HerakoiConfig) -> BackendStreamConfig {
    BackendStreamConfig {
        sample_rate: config.output.sample_rate,
        buffer_size: config.output.buffer_size,
        channels: config.output.channels,
        device_name: config.output.device.clone(),
    }
}
