//! A single sounding voice and its lifecycle state.

use std::time::Duration;

use herakoi_core::{AudioParam, NodeId, VoiceId, Waveform};

/// Lifecycle stage of a voice.
///
/// ```text
/// (first update) → Active ──(absent / stop / stop-all)──→ Fading ──(fade elapsed)──→ Released
/// ```
///
/// `Released` is terminal: the registry no longer tracks the voice, and the
/// value only appears on voices handed back by
/// [`VoiceRegistry::complete_due_releases`](crate::VoiceRegistry::complete_due_releases).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoiceState {
    /// Sounding and accepting updates.
    Active,
    /// Gain ramping to the fade floor; updates are ignored.
    Fading,
    /// Nodes stopped and disconnected.
    Released,
}

/// One oscillator → gain chain owned by a tracked id, ending in a stereo
/// panner when the voice was created with a pan.
#[derive(Clone, Debug, PartialEq)]
pub struct Voice {
    id: VoiceId,
    oscillator: NodeId,
    gain: NodeId,
    panner: Option<NodeId>,
    waveform: Waveform,
    last_update: Option<Duration>,
    state: VoiceState,
}

impl Voice {
    pub(crate) fn new(
        id: VoiceId,
        oscillator: NodeId,
        gain: NodeId,
        panner: Option<NodeId>,
        waveform: Waveform,
    ) -> Self {
        Self {
            id,
            oscillator,
            gain,
            panner,
            waveform,
            last_update: None,
            state: VoiceState::Active,
        }
    }

    /// The voice's id.
    pub fn id(&self) -> &VoiceId {
        &self.id
    }

    /// Oscillator node.
    pub fn oscillator(&self) -> NodeId {
        self.oscillator
    }

    /// Gain node.
    pub fn gain(&self) -> NodeId {
        self.gain
    }

    /// Panner node, if the voice is spatialized.
    pub fn panner(&self) -> Option<NodeId> {
        self.panner
    }

    /// Frequency parameter of the oscillator.
    pub fn frequency_param(&self) -> AudioParam {
        AudioParam::frequency(self.oscillator)
    }

    /// Gain parameter of the gain node.
    pub fn gain_param(&self) -> AudioParam {
        AudioParam::gain(self.gain)
    }

    /// Position parameter of the panner.
    pub fn pan_param(&self) -> Option<AudioParam> {
        self.panner.map(AudioParam::pan)
    }

    /// Waveform last applied to the oscillator.
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Clock time of the last accepted parameter update.
    pub fn last_update(&self) -> Option<Duration> {
        self.last_update
    }

    /// Current lifecycle stage.
    pub fn state(&self) -> VoiceState {
        self.state
    }

    /// Whether the voice is sounding and accepting updates.
    pub fn is_active(&self) -> bool {
        self.state == VoiceState::Active
    }

    /// Whether an update at `now` falls inside the rate-limit window.
    pub(crate) fn is_rate_limited(&self, now: Duration, interval: Duration) -> bool {
        self.last_update
            .is_some_and(|last| now.saturating_sub(last) < interval)
    }

    pub(crate) fn mark_updated(&mut self, now: Duration) {
        self.last_update = Some(now);
    }

    pub(crate) fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    pub(crate) fn begin_fade(&mut self) {
        self.last_update = None;
        self.state = VoiceState::Fading;
    }

    pub(crate) fn mark_released(&mut self) {
        self.state = VoiceState::Released;
    }
}
