//! Herakoi Core - shared vocabulary for image sonification
//!
//! This crate holds everything the voice engine and its collaborators agree on,
//! with no I/O and no platform dependencies.
//!
//! # Core Abstractions
//!
//! ## Tones
//!
//! - [`VoiceId`] - Opaque, stable id of one sounding voice
//! - [`ToneParams`] / [`ToneUpdate`] - Frequency, volume and optional pan for a voice
//!
//! ## Color
//!
//! - [`ColorSample`] / [`ColorSampler`] - Encoded color at a pixel
//! - [`encode_hue_value`] / [`encode_hsv`] / [`encode_rgba`] - RGB → HSV byte encoding
//! - [`ToneMapping`] / [`MappingMode`] - Color → tone parameter mapping
//!
//! ## Audio Output
//!
//! - [`AudioSink`] - Node-graph contract the voice registry drives
//! - [`ParamTimeline`] - Web-Audio-style parameter automation
//! - [`Oscillator`] - PolyBLEP oscillator (sine, square, sawtooth, triangle)
//! - [`RenderGraph`] - In-process sink that renders the node graph to samples
//!
//! ## Time
//!
//! - [`Clock`] - Monotonic time source for rate limiting and release timing
//! - [`ManualClock`] - Hand-advanced clock for offline rendering and tests
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible (with `alloc`). Disable the default `std`
//! feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! herakoi-core = { version = "0.1", default-features = false }
//! ```
//!
//! Without `std`, [`MonotonicClock`] is unavailable; supply your own [`Clock`].
//! [`ManualClock`] needs native 64-bit atomics and is compiled out on targets
//! without them (`target_has_atomic = "64"`).

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod automation;
pub mod clock;
pub mod color;
pub mod graph;
pub mod mapping;
pub mod math;
pub mod oscillator;
pub mod sink;
pub mod tone;

pub use automation::{AutomationEvent, ParamTimeline};
#[cfg(feature = "std")]
pub use clock::MonotonicClock;
pub use clock::Clock;
#[cfg(target_has_atomic = "64")]
pub use clock::ManualClock;
pub use color::{
    ColorSample, ColorSampler, HUE_CEILING_DEG, encode_hsv, encode_hue_value, encode_rgba,
};
pub use graph::{GraphCommand, RenderGraph};
pub use mapping::{BRIGHTNESS_VOL_FLOOR, MappingMode, ParseMappingModeError, ToneMapping};
pub use math::{byte_fraction, equal_power_pan, flush_denormal, lerp};
pub use oscillator::{Oscillator, ParseWaveformError, Waveform};
pub use sink::{AudioParam, AudioSink, Destination, NodeAllocator, NodeId, ParamKind};
pub use tone::{ToneParams, ToneUpdate, VoiceId};
