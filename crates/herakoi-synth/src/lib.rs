//! Herakoi Synth - voice engine for image sonification
//!
//! Turns per-frame detection results into a stable set of sounding voices.
//!
//! # Core Components
//!
//! ## Voice Registry
//!
//! - [`VoiceRegistry`] - One voice per tracked id, created on first mention,
//!   rate-limited on updates, faded and released when the id disappears
//! - [`VoiceTiming`] - Fade length, update interval, fade floor
//! - [`UpdateOutcome`] / [`SyncReport`] - What a call did
//!
//! ## Release Scheduling
//!
//! - [`ReleaseQueue`] - Fading voices waiting for their fade to finish
//!
//! ## Frame Driver
//!
//! - [`FrameDriver`] - Tracked points → color samples → registry updates
//! - [`TrackedPoint`] - Normalized fingertip position of one hand
//!
//! ## Debugging
//!
//! - [`ToneObserver`] - Per-frame hook with [`ToneSample`]s
//! - [`DebugPanel`] - Latest sample per voice as text
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use herakoi_core::{ManualClock, RenderGraph, ToneParams, ToneUpdate, Waveform};
//! use herakoi_synth::{VoiceRegistry, VoiceState, VoiceTiming};
//!
//! let clock = ManualClock::new();
//! let mut registry = VoiceRegistry::with_clock(
//!     RenderGraph::new(48000.0),
//!     clock.clone(),
//!     VoiceTiming::default(),
//!     Waveform::Triangle,
//! );
//!
//! let a = ToneUpdate::new("a", ToneParams::new(300.0, 0.1));
//! let b = ToneUpdate::new("b", ToneParams::new(500.0, 0.2));
//! registry.sync_voices(&[a, b.clone()]);
//! registry.sync_voices(&[b]);
//!
//! assert_eq!(registry.voice_state(&"a".into()), Some(VoiceState::Fading));
//! assert_eq!(registry.voice_state(&"b".into()), Some(VoiceState::Active));
//! ```

pub mod driver;
pub mod observer;
pub mod registry;
pub mod release;
pub mod voice;

pub use driver::{
    DEFAULT_MAX_HANDS, FramePlan, FrameDriver, MAX_HANDS_LIMIT, TrackedPoint, hand_voice_id,
    to_pixel,
};
pub use observer::{DebugPanel, NoopObserver, ToneObserver, ToneSample, TracingObserver};
pub use registry::{
    DEFAULT_FADE, DEFAULT_UPDATE_INTERVAL, FADE_FLOOR, SyncReport, UpdateOutcome, VoiceRegistry,
    VoiceTiming,
};
pub use release::{PendingRelease, ReleaseQueue};
pub use voice::{Voice, VoiceState};
