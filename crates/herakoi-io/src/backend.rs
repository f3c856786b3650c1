//! Pluggable audio output backend.
//!
//! [`AudioBackend`] decouples the sonification pipeline from the platform audio
//! API. [`CpalBackend`](crate::CpalBackend) is the default; tests plug in a
//! mock that captures the callback and pumps it by hand.
//!
//! ```text
//! VoiceRegistry ──▶ StreamSink ──commands──▶ OutputCallback (RenderGraph)
//!                                                   ▲
//!                                   AudioBackend ───┘ calls per buffer
//! ```
//!
//! Callbacks are boxed closures so the trait stays object-safe, and streams
//! come back as a type-erased [`StreamHandle`] that stops playback on drop.

use crate::{AudioDevice, Result};

/// Configuration for building an output stream.
///
/// ## Fields
///
/// - `sample_rate`: Requested sample rate in Hz (default: 48000)
/// - `buffer_size`: Preferred buffer size in frames (default: 512)
/// - `channels`: Number of output channels (default: 2)
/// - `device_name`: Optional device name filter (uses default device if `None`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendStreamConfig {
    /// Requested sample rate in Hz.
    pub sample_rate: u32,
    /// Preferred buffer size in frames.
    pub buffer_size: u32,
    /// Number of output channels.
    pub channels: u16,
    /// Optional device name (uses system default if `None`).
    pub device_name: Option<String>,
}

impl Default for BackendStreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            buffer_size: 512,
            channels: 2,
            device_name: None,
        }
    }
}

/// Type-erased audio stream handle.
///
/// The stream is active while this handle exists; dropping it stops playback.
pub struct StreamHandle {
    _inner: Box<dyn Send>,
}

impl StreamHandle {
    /// Wrap a backend-specific stream object, keeping it alive until drop.
    pub fn new<T: Send + 'static>(stream: T) -> Self {
        Self {
            _inner: Box::new(stream),
        }
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle").finish_non_exhaustive()
    }
}

/// Audio output callback.
///
/// Runs on the audio thread and fills an interleaved buffer
/// (`[L0, R0, L1, R1, ...]` for stereo). Must not block or perform I/O.
pub type OutputCallback = Box<dyn FnMut(&mut [f32]) + Send>;

/// Error callback, called with a human-readable message when the stream fails.
pub type ErrorCallback = Box<dyn FnMut(&str) + Send>;

/// Platform audio output.
pub trait AudioBackend: Send {
    /// Human-readable name of this backend (e.g. "cpal", "mock").
    fn name(&self) -> &str;

    /// List output devices.
    fn list_devices(&self) -> Result<Vec<AudioDevice>>;

    /// Default output device, if any.
    fn default_output_device(&self) -> Result<Option<AudioDevice>>;

    /// Build and start an output stream.
    ///
    /// ## Arguments
    ///
    /// - `config`: Sample rate, buffer size, channels and device
    /// - `callback`: Called per audio buffer to generate output samples
    /// - `error_callback`: Called when the backend reports a streaming error
    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        callback: OutputCallback,
        error_callback: ErrorCallback,
    ) -> Result<StreamHandle>;

    /// Sample rate the backend will actually run `config` at.
    ///
    /// Defaults to the requested rate.
    fn actual_sample_rate(&self, config: &BackendStreamConfig) -> u32 {
        config.sample_rate
    }
}
