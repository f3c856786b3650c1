//! Debug hooks for per-frame tone samples.
//!
//! Observers see what the driver fed to the registry each frame. They have no
//! effect on audio.

use std::fmt::Write as _;

use herakoi_core::VoiceId;

/// One tracked point's color and resulting tone.
#[derive(Clone, Debug, PartialEq)]
pub struct ToneSample {
    /// Voice the tone belongs to.
    pub id: VoiceId,
    /// Mapped frequency in Hz.
    pub frequency: f32,
    /// Mapped volume.
    pub volume: f32,
    /// Mapped stereo position, three-channel mapping only.
    pub pan: Option<f32>,
    /// Encoded hue at the sampled pixel.
    pub hue_byte: u8,
    /// Encoded brightness at the sampled pixel.
    pub value_byte: u8,
}

/// Receives the samples of every processed frame.
pub trait ToneObserver {
    /// Called once per frame, possibly with an empty slice.
    fn observe(&mut self, samples: &[ToneSample]);
}

/// Observer that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ToneObserver for NoopObserver {
    fn observe(&mut self, _samples: &[ToneSample]) {}
}

/// Observer that emits one `trace` event per sample.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ToneObserver for TracingObserver {
    fn observe(&mut self, samples: &[ToneSample]) {
        for s in samples {
            tracing::trace!(
                voice = %s.id,
                frequency = s.frequency,
                volume = s.volume,
                pan = ?s.pan,
                hue = s.hue_byte,
                value = s.value_byte,
                "tone sample"
            );
        }
    }
}

/// Latest sample per id, rendered as a text panel.
///
/// Ids keep the order in which they were first seen. Ids that disappear from
/// later frames keep their last sample.
///
/// ```text
/// hand-0-index-tip: 440.0 Hz | vol 0.20 | hue 123 | value 200
/// hand-1-index-tip: 300.0 Hz | vol 0.64 | hue 51 | value 90 | pan -0.25
/// ```
#[derive(Debug, Default, Clone)]
pub struct DebugPanel {
    latest: Vec<ToneSample>,
}

impl DebugPanel {
    /// Text shown before any sample arrives.
    pub const EMPTY: &'static str = "No tone samples yet.";

    /// Create an empty panel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one sample, replacing the previous one for its id.
    pub fn log_sample(&mut self, sample: ToneSample) {
        match self.latest.iter_mut().find(|s| s.id == sample.id) {
            Some(slot) => *slot = sample,
            None => self.latest.push(sample),
        }
    }

    /// Latest samples in first-seen order.
    pub fn samples(&self) -> &[ToneSample] {
        &self.latest
    }

    /// Render the panel text.
    pub fn render(&self) -> String {
        if self.latest.is_empty() {
            return Self::EMPTY.to_owned();
        }
        let mut out = String::new();
        for (i, s) in self.latest.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            let _ = write!(
                out,
                "{}: {:.1} Hz | vol {:.2} | hue {} | value {}",
                s.id, s.frequency, s.volume, s.hue_byte, s.value_byte
            );
            if let Some(pan) = s.pan {
                let _ = write!(out, " | pan {:+.2}", pan);
            }
        }
        out
    }
}

impl ToneObserver for DebugPanel {
    fn observe(&mut self, samples: &[ToneSample]) {
        for sample in samples {
            self.log_sample(sample.clone());
        }
    }
}

impl<T: ToneObserver + ?Sized> ToneObserver for &mut T {
    fn observe(&mut self, samples: &[ToneSample]) {
        (**self).observe(samples);
    }
}
