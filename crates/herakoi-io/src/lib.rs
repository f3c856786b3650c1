//! I/O layer for herakoi.
//!
//! This crate provides:
//!
//! - **Real-time output**: [`StreamSink`], an [`AudioSink`](herakoi_core::AudioSink)
//!   that forwards graph commands to a [`RenderGraph`](herakoi_core::RenderGraph)
//!   running inside an audio backend callback
//! - **Backends**: the [`AudioBackend`] trait and its cpal implementation
//!   [`CpalBackend`]
//! - **Images**: [`ImageSampler`] decodes a picture into the hue/saturation/value encoding
//!   and answers color queries
//! - **WAV output**: [`WavRecorder`] for offline renders, written block by block
//! - **Detection tracks**: [`DetectionTrack`], recorded or scripted fingertip
//!   positions stored as JSON
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use herakoi_io::{BackendStreamConfig, CpalBackend, ImageSampler, StreamSink};
//! use herakoi_synth::{FrameDriver, NoopObserver, TrackedPoint, VoiceRegistry};
//!
//! let sampler = ImageSampler::open("painting.png")?;
//! let sink = StreamSink::open(&CpalBackend::new(), &BackendStreamConfig::default())?;
//! let mut registry = VoiceRegistry::new(sink);
//!
//! let driver = FrameDriver::default();
//! let points = [TrackedPoint::new(0, 0.5, 0.5)];
//! driver.process_frame(&mut registry, &points, Some(&sampler), &mut NoopObserver);
//! ```

pub mod backend;
pub mod cpal_backend;
mod image_sampler;
mod sink;
mod stream;
mod track;
mod wav;

pub use backend::{AudioBackend, BackendStreamConfig, ErrorCallback, OutputCallback, StreamHandle};
pub use cpal_backend::CpalBackend;
pub use image_sampler::ImageSampler;
pub use sink::StreamSink;
pub use stream::{AudioDevice, default_output_device, list_output_devices};
pub use track::{DEFAULT_FRAME_INTERVAL_MS, DetectionTrack, TrackFrame, TrackPoint};
pub use wav::{WavInfo, WavRecorder, WavSpec, read_wav, read_wav_info};

/// Error types for herakoi I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Image decoding error.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Pixel buffer does not match the stated dimensions.
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// Detection track (de)serialization error.
    #[error("Track error: {0}")]
    Track(#[from] serde_json::Error),

    /// Audio stream setup or runtime error.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// The requested sample format is not supported.
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
