//! Voice registry and per-frame reconciliation.
//!
//! [`VoiceRegistry`] maps each tracked [`VoiceId`] to exactly one live
//! [`Voice`] and keeps the audio graph in step with the latest detection
//! frame:
//!
//! - first mention of an id creates `oscillator → gain → output` and starts it;
//!   when that update carries a pan, the gain feeds a stereo panner instead
//! - later mentions reschedule frequency and volume, at most once per
//!   [`VoiceTiming::update_interval`]
//! - ids missing from a frame fade out over [`VoiceTiming::fade`] and are
//!   released once the fade has elapsed
//!
//! # Time Bases
//!
//! Parameter writes are timestamped with the sink's
//! [`current_time`](AudioSink::current_time). Rate limiting and release due
//! times use the registry's [`Clock`], so a sink whose time stalls (no device
//! callback yet) cannot wedge the lifecycle.
//!
//! # Deferred Release
//!
//! Nothing blocks. Fades enqueue a [`PendingRelease`](crate::PendingRelease);
//! due entries are completed at the start of every
//! [`sync_voices`](VoiceRegistry::sync_voices) and by
//! [`complete_due_releases`](VoiceRegistry::complete_due_releases).
//! Dropping the registry stops and disconnects every voice at once, fading or
//! not, so no node outlives it.

use std::collections::HashMap;
use std::time::Duration;

use herakoi_core::{
    AudioSink, Clock, Destination, MonotonicClock, ToneParams, ToneUpdate, VoiceId, Waveform,
};

use crate::release::ReleaseQueue;
use crate::voice::{Voice, VoiceState};

/// Default fade-out length.
pub const DEFAULT_FADE: Duration = Duration::from_millis(100);
/// Default minimum spacing between accepted updates of one voice.
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_millis(100);
/// Gain a fade ramps down to. Exponential ramps cannot reach zero.
pub const FADE_FLOOR: f32 = 0.001;

/// Fade and rate-limit timings of a registry.
///
/// ## Parameters
/// - `fade`: Fade-out length (default 100 ms)
/// - `update_interval`: Minimum spacing between accepted updates (default 100 ms)
/// - `fade_floor`: Gain reached at the end of a fade (default 0.001)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoiceTiming {
    /// Fade-out length.
    pub fade: Duration,
    /// Minimum spacing between accepted updates of one voice.
    pub update_interval: Duration,
    /// Target gain of the exponential fade.
    pub fade_floor: f32,
}

impl Default for VoiceTiming {
    fn default() -> Self {
        Self {
            fade: DEFAULT_FADE,
            update_interval: DEFAULT_UPDATE_INTERVAL,
            fade_floor: FADE_FLOOR,
        }
    }
}

/// What [`VoiceRegistry::update_voice`] did with an update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// A new voice was created and the parameters applied.
    Created,
    /// Parameters were rescheduled on the existing voice.
    Updated,
    /// Dropped: the previous accepted update is too recent.
    RateLimited,
    /// Dropped: the voice is fading and will not be resurrected.
    IgnoredFading,
}

/// Counts from one [`VoiceRegistry::sync_voices`] pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Voices created.
    pub created: usize,
    /// Voices whose parameters were rescheduled.
    pub updated: usize,
    /// Updates dropped by rate limiting.
    pub rate_limited: usize,
    /// Updates dropped because the voice is fading.
    pub ignored_fading: usize,
    /// Voices that started fading because their id was absent.
    pub faded: usize,
    /// Voices released at the start of the pass.
    pub released: usize,
}

impl SyncReport {
    fn record(&mut self, outcome: UpdateOutcome) {
        match outcome {
            UpdateOutcome::Created => self.created += 1,
            UpdateOutcome::Updated => self.updated += 1,
            UpdateOutcome::RateLimited => self.rate_limited += 1,
            UpdateOutcome::IgnoredFading => self.ignored_fading += 1,
        }
    }
}

impl std::ops::AddAssign for SyncReport {
    fn add_assign(&mut self, other: Self) {
        self.created += other.created;
        self.updated += other.updated;
        self.rate_limited += other.rate_limited;
        self.ignored_fading += other.ignored_fading;
        self.faded += other.faded;
        self.released += other.released;
    }
}

/// Id-keyed voices driving an [`AudioSink`].
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use herakoi_core::{ManualClock, RenderGraph, ToneParams, ToneUpdate, Waveform};
/// use herakoi_synth::{VoiceRegistry, VoiceTiming};
///
/// let clock = ManualClock::new();
/// let mut registry = VoiceRegistry::with_clock(
///     RenderGraph::new(48000.0),
///     clock.clone(),
///     VoiceTiming::default(),
///     Waveform::Sine,
/// );
///
/// registry.sync_voices(&[ToneUpdate::new("hand-0-index-tip", ToneParams::new(440.0, 0.2))]);
/// assert_eq!(registry.live_voice_count(), 1);
///
/// registry.sync_voices(&[]);
/// clock.advance(Duration::from_millis(100));
/// registry.complete_due_releases();
/// assert_eq!(registry.live_voice_count(), 0);
/// ```
pub struct VoiceRegistry<S: AudioSink, C: Clock = MonotonicClock> {
    sink: S,
    clock: C,
    timing: VoiceTiming,
    waveform: Waveform,
    voices: HashMap<VoiceId, Voice>,
    releases: ReleaseQueue,
}

impl<S: AudioSink> VoiceRegistry<S, MonotonicClock> {
    /// Registry with default timings, a sine waveform and a wall clock.
    pub fn new(sink: S) -> Self {
        Self::with_clock(
            sink,
            MonotonicClock::new(),
            VoiceTiming::default(),
            Waveform::default(),
        )
    }
}

impl<S: AudioSink, C: Clock> VoiceRegistry<S, C> {
    /// Registry with explicit clock, timings and initial waveform.
    pub fn with_clock(sink: S, clock: C, timing: VoiceTiming, waveform: Waveform) -> Self {
        Self {
            sink,
            clock,
            timing,
            waveform,
            voices: HashMap::new(),
            releases: ReleaseQueue::new(),
        }
    }

    /// Create or update the voice for `id`.
    pub fn update_voice(&mut self, id: &VoiceId, params: ToneParams) -> UpdateOutcome {
        let now = self.clock.now();

        let outcome = match self.voices.get(id) {
            None => {
                let voice = self.create_voice(id.clone(), params.pan.is_some());
                self.voices.insert(id.clone(), voice);
                UpdateOutcome::Created
            }
            Some(voice) if voice.state() != VoiceState::Active => {
                tracing::trace!(voice = %id, "update ignored, voice is fading");
                return UpdateOutcome::IgnoredFading;
            }
            Some(voice) if voice.is_rate_limited(now, self.timing.update_interval) => {
                tracing::trace!(voice = %id, "update rate limited");
                return UpdateOutcome::RateLimited;
            }
            Some(_) => UpdateOutcome::Updated,
        };

        let Some(voice) = self.voices.get_mut(id) else {
            return outcome;
        };
        let t = self.sink.current_time();
        self.sink
            .set_value_at_time(voice.frequency_param(), params.frequency, t);
        self.sink.set_value_at_time(voice.gain_param(), params.volume, t);
        if let (Some(param), Some(pan)) = (voice.pan_param(), params.pan) {
            self.sink.set_value_at_time(param, pan, t);
        }
        voice.mark_updated(now);

        tracing::debug!(
            voice = %id,
            frequency = params.frequency,
            volume = params.volume,
            pan = ?params.pan,
            ?outcome,
            "voice scheduled"
        );
        outcome
    }

    /// Build and start a voice. Panning is decided here, once per voice.
    fn create_voice(&mut self, id: VoiceId, panned: bool) -> Voice {
        let oscillator = self.sink.create_oscillator();
        let gain = self.sink.create_gain();
        let panner = panned.then(|| self.sink.create_panner());
        self.sink.set_waveform(oscillator, self.waveform);
        self.sink.connect(oscillator, Destination::Node(gain));
        match panner {
            Some(panner) => {
                self.sink.connect(gain, Destination::Node(panner));
                self.sink.connect(panner, Destination::Output);
            }
            None => self.sink.connect(gain, Destination::Output),
        }
        self.sink.start(oscillator);
        tracing::debug!(
            voice = %id,
            %oscillator,
            %gain,
            panned,
            waveform = %self.waveform,
            "voice created"
        );
        Voice::new(id, oscillator, gain, panner, self.waveform)
    }

    /// Reconcile the voices with one frame's update list.
    ///
    /// Completes due releases, applies every update in order, then fades each
    /// active voice whose id is absent from `updates`.
    pub fn sync_voices(&mut self, updates: &[ToneUpdate]) -> SyncReport {
        let mut report = SyncReport {
            released: self.complete_due_releases().len(),
            ..SyncReport::default()
        };

        for update in updates {
            report.record(self.update_voice(&update.id, update.params));
        }

        let absent: Vec<VoiceId> = self
            .sorted_ids()
            .into_iter()
            .filter(|id| !updates.iter().any(|u| &u.id == id))
            .collect();
        for id in absent {
            if self.stop_voice(&id) {
                report.faded += 1;
            }
        }

        report
    }

    /// Start fading `id`.
    ///
    /// Returns `false` without touching anything when the id is unknown or
    /// already fading.
    pub fn stop_voice(&mut self, id: &VoiceId) -> bool {
        let Some(voice) = self.voices.get_mut(id) else {
            return false;
        };
        if !voice.is_active() {
            return false;
        }

        let param = voice.gain_param();
        let t = self.sink.current_time();
        let current = self.sink.param_value(param);
        self.sink.set_value_at_time(param, current, t);
        self.sink.exponential_ramp_to_value_at_time(
            param,
            self.timing.fade_floor,
            t + self.timing.fade.as_secs_f64(),
        );
        voice.begin_fade();

        let due = self.clock.now() + self.timing.fade;
        self.releases.push(id.clone(), due);
        tracing::debug!(voice = %id, from = current, ?due, "voice fading");
        true
    }

    /// Start fading every live voice. Returns how many fades were scheduled.
    pub fn stop_all_voices(&mut self) -> usize {
        let stopped = self
            .sorted_ids()
            .iter()
            .filter(|id| self.stop_voice(id))
            .count();
        if stopped > 0 {
            tracing::info!(voices = stopped, "stopping all voices");
        }
        stopped
    }

    /// Change the waveform of every live voice and of voices created later.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
        for voice in self.voices.values_mut() {
            self.sink.set_waveform(voice.oscillator(), waveform);
            voice.set_waveform(waveform);
        }
        tracing::info!(%waveform, voices = self.voices.len(), "waveform changed");
    }

    /// Release every voice whose fade has elapsed on the registry clock.
    pub fn complete_due_releases(&mut self) -> Vec<Voice> {
        let now = self.clock.now();
        let mut released = Vec::new();
        while let Some(pending) = self.releases.pop_due(now) {
            if let Some(voice) = self.release(&pending.id) {
                released.push(voice);
            }
        }
        released
    }

    /// Release every pending voice immediately, due or not.
    pub fn flush_releases(&mut self) -> Vec<Voice> {
        self.releases
            .drain()
            .into_iter()
            .filter_map(|pending| self.release(&pending.id))
            .collect()
    }

    fn release(&mut self, id: &VoiceId) -> Option<Voice> {
        if self.voices.get(id)?.state() != VoiceState::Fading {
            return None;
        }
        let mut voice = self.voices.remove(id)?;
        self.sink.stop(voice.oscillator());
        self.sink.disconnect(voice.oscillator());
        self.sink.disconnect(voice.gain());
        if let Some(panner) = voice.panner() {
            self.sink.disconnect(panner);
        }
        voice.mark_released();
        tracing::debug!(voice = %id, "voice released");
        Some(voice)
    }

    fn sorted_ids(&self) -> Vec<VoiceId> {
        let mut ids: Vec<VoiceId> = self.voices.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Ids of all live (active or fading) voices, sorted.
    pub fn tracked_ids(&self) -> Vec<VoiceId> {
        self.sorted_ids()
    }

    /// The live voice for `id`.
    pub fn voice(&self, id: &VoiceId) -> Option<&Voice> {
        self.voices.get(id)
    }

    /// Lifecycle stage of `id`, `None` once released or never seen.
    pub fn voice_state(&self, id: &VoiceId) -> Option<VoiceState> {
        self.voices.get(id).map(Voice::state)
    }

    /// Number of live (active or fading) voices.
    pub fn live_voice_count(&self) -> usize {
        self.voices.len()
    }

    /// Number of active voices.
    pub fn active_voice_count(&self) -> usize {
        self.voices.values().filter(|v| v.is_active()).count()
    }

    /// Pending releases.
    pub fn pending_releases(&self) -> &ReleaseQueue {
        &self.releases
    }

    /// Waveform applied to new voices.
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Fade and rate-limit timings.
    pub fn timing(&self) -> VoiceTiming {
        self.timing
    }

    /// The registry clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// The audio sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutable access to the audio sink, e.g. to render an in-process graph.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

impl<S: AudioSink, C: Clock> Drop for VoiceRegistry<S, C> {
    fn drop(&mut self) {
        if self.voices.is_empty() {
            return;
        }
        let flushed = self.flush_releases().len();
        // Everything left is active: cut it without a fade.
        let mut silenced = 0;
        for id in self.sorted_ids() {
            if let Some(voice) = self.voices.get_mut(&id) {
                voice.begin_fade();
            }
            if self.release(&id).is_some() {
                silenced += 1;
            }
        }
        tracing::debug!(flushed, silenced, "voices released on drop");
    }
}
