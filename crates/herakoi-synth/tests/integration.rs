//! Integration tests for herakoi-synth.
//!
//! Tests cover voice creation, rate limiting, reconciliation convergence,
//! fade/release bookkeeping, waveform changes, and the frame driver, against
//! a recording sink that logs every graph operation.

use std::collections::HashMap;
use std::time::Duration;

use herakoi_core::{
    AudioParam, AudioSink, ColorSample, ColorSampler, Destination, ManualClock, NodeAllocator,
    NodeId, ParamKind, RenderGraph, ToneParams, ToneUpdate, VoiceId, Waveform,
};
use herakoi_synth::{
    DebugPanel, FADE_FLOOR, FrameDriver, NoopObserver, TrackedPoint, UpdateOutcome,
    VoiceRegistry, VoiceState, VoiceTiming,
};

// ---------------------------------------------------------------------------
// Recording sink
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
enum Call {
    CreateOscillator(NodeId),
    CreateGain(NodeId),
    CreatePanner(NodeId),
    Connect(NodeId, Destination),
    Disconnect(NodeId),
    SetWaveform(NodeId, Waveform),
    Start(NodeId),
    Stop(NodeId),
    SetValue(AudioParam, f32, f64),
    Ramp(AudioParam, f32, f64),
}

#[derive(Default)]
struct RecordingSink {
    ids: NodeAllocator,
    time: f64,
    values: HashMap<AudioParam, f32>,
    calls: Vec<Call>,
}

impl RecordingSink {
    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    fn oscillators_created(&self) -> usize {
        self.count(|c| matches!(c, Call::CreateOscillator(_)))
    }

    fn gains_created(&self) -> usize {
        self.count(|c| matches!(c, Call::CreateGain(_)))
    }

    fn panners_created(&self) -> usize {
        self.count(|c| matches!(c, Call::CreatePanner(_)))
    }

    fn ramps(&self) -> Vec<(AudioParam, f32, f64)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Ramp(p, v, t) => Some((*p, *v, *t)),
                _ => None,
            })
            .collect()
    }

    fn stops_of(&self, node: NodeId) -> usize {
        self.count(|c| *c == Call::Stop(node))
    }

    fn disconnects_of(&self, node: NodeId) -> usize {
        self.count(|c| *c == Call::Disconnect(node))
    }

    fn last_value(&self, param: AudioParam) -> Option<f32> {
        self.calls.iter().rev().find_map(|c| match c {
            Call::SetValue(p, v, _) if *p == param => Some(*v),
            _ => None,
        })
    }
}

impl AudioSink for RecordingSink {
    fn current_time(&self) -> f64 {
        self.time
    }

    fn create_oscillator(&mut self) -> NodeId {
        let id = self.ids.allocate();
        self.calls.push(Call::CreateOscillator(id));
        id
    }

    fn create_gain(&mut self) -> NodeId {
        let id = self.ids.allocate();
        self.calls.push(Call::CreateGain(id));
        id
    }

    fn create_panner(&mut self) -> NodeId {
        let id = self.ids.allocate();
        self.calls.push(Call::CreatePanner(id));
        id
    }

    fn connect(&mut self, node: NodeId, destination: Destination) {
        self.calls.push(Call::Connect(node, destination));
    }

    fn disconnect(&mut self, node: NodeId) {
        self.calls.push(Call::Disconnect(node));
    }

    fn set_waveform(&mut self, oscillator: NodeId, waveform: Waveform) {
        self.calls.push(Call::SetWaveform(oscillator, waveform));
    }

    fn start(&mut self, oscillator: NodeId) {
        self.calls.push(Call::Start(oscillator));
    }

    fn stop(&mut self, oscillator: NodeId) {
        self.calls.push(Call::Stop(oscillator));
    }

    fn param_value(&self, param: AudioParam) -> f32 {
        self.values
            .get(&param)
            .copied()
            .unwrap_or(param.kind.default_value())
    }

    fn set_value_at_time(&mut self, param: AudioParam, value: f32, time: f64) {
        self.values.insert(param, value);
        self.calls.push(Call::SetValue(param, value, time));
    }

    fn exponential_ramp_to_value_at_time(&mut self, param: AudioParam, value: f32, time: f64) {
        self.calls.push(Call::Ramp(param, value, time));
    }
}

fn registry() -> (VoiceRegistry<RecordingSink, ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    let reg = VoiceRegistry::with_clock(
        RecordingSink::default(),
        clock.clone(),
        VoiceTiming::default(),
        Waveform::Sine,
    );
    (reg, clock)
}

fn update(id: &str, frequency: f32, volume: f32) -> ToneUpdate {
    ToneUpdate::new(id, ToneParams::new(frequency, volume))
}

fn id(s: &str) -> VoiceId {
    VoiceId::from(s)
}

const MS_100: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// 1. Creation and rate limiting
// ---------------------------------------------------------------------------

#[test]
fn creation_wires_oscillator_gain_output_and_starts() {
    let (mut reg, _) = registry();
    reg.update_voice(&id("a"), ToneParams::new(440.0, 0.2));

    let voice = reg.voice(&id("a")).expect("voice exists");
    let (osc, gain) = (voice.oscillator(), voice.gain());
    let calls = &reg.sink().calls;
    assert!(calls.contains(&Call::SetWaveform(osc, Waveform::Sine)));
    assert!(calls.contains(&Call::Connect(osc, Destination::Node(gain))));
    assert!(calls.contains(&Call::Connect(gain, Destination::Output)));
    assert!(calls.contains(&Call::Start(osc)));
    assert_eq!(reg.sink().last_value(AudioParam::frequency(osc)), Some(440.0));
    assert_eq!(reg.sink().last_value(AudioParam::gain(gain)), Some(0.2));
}

#[test]
fn repeated_updates_never_duplicate_nodes() {
    let (mut reg, clock) = registry();
    for _ in 0..20 {
        reg.update_voice(&id("finger-1"), ToneParams::new(440.0, 0.2));
        clock.advance(Duration::from_millis(30));
    }
    assert_eq!(reg.sink().oscillators_created(), 1);
    assert_eq!(reg.sink().gains_created(), 1);
    assert_eq!(reg.live_voice_count(), 1);
}

#[test]
fn second_update_within_interval_is_dropped_third_is_applied() {
    let (mut reg, clock) = registry();
    let a = id("a");
    assert_eq!(reg.update_voice(&a, ToneParams::new(440.0, 0.2)), UpdateOutcome::Created);

    clock.advance(Duration::from_millis(40));
    assert_eq!(reg.update_voice(&a, ToneParams::new(660.0, 0.2)), UpdateOutcome::RateLimited);
    let osc = reg.voice(&a).map(|v| v.oscillator()).expect("voice");
    assert_eq!(reg.sink().last_value(AudioParam::frequency(osc)), Some(440.0));

    clock.advance(Duration::from_millis(60));
    assert_eq!(reg.update_voice(&a, ToneParams::new(880.0, 0.1)), UpdateOutcome::Updated);
    assert_eq!(reg.sink().last_value(AudioParam::frequency(osc)), Some(880.0));
}

#[test]
fn parameter_writes_use_sink_time() {
    let (mut reg, clock) = registry();
    reg.sink_mut().time = 3.25;
    reg.update_voice(&id("a"), ToneParams::new(440.0, 0.2));
    clock.advance(MS_100);
    reg.sink_mut().time = 3.5;
    reg.update_voice(&id("a"), ToneParams::new(450.0, 0.2));

    let times: Vec<f64> = reg
        .sink()
        .calls
        .iter()
        .filter_map(|c| match c {
            Call::SetValue(_, _, t) => Some(*t),
            _ => None,
        })
        .collect();
    assert_eq!(times, [3.25, 3.25, 3.5, 3.5]);
}

// ---------------------------------------------------------------------------
// 2. Reconciliation
// ---------------------------------------------------------------------------

#[test]
fn absent_ids_fade_exactly_once() {
    let (mut reg, clock) = registry();
    reg.sync_voices(&[update("a", 300.0, 0.1), update("b", 500.0, 0.2)]);
    assert_eq!(reg.sink().oscillators_created(), 2);

    clock.advance(Duration::from_millis(10));
    let report = reg.sync_voices(&[update("b", 550.0, 0.15)]);
    assert_eq!(report.faded, 1);
    assert_eq!(report.created, 0);
    assert_eq!(reg.voice_state(&id("a")), Some(VoiceState::Fading));

    clock.advance(Duration::from_millis(10));
    let report = reg.sync_voices(&[update("b", 550.0, 0.15)]);
    assert_eq!(report.faded, 0, "fading voice is not faded again");
    assert_eq!(reg.sink().ramps().len(), 1);
    assert_eq!(reg.sink().oscillators_created(), 2);
}

#[test]
fn empty_update_list_fades_everything() {
    let (mut reg, _) = registry();
    reg.sync_voices(&[update("a", 300.0, 0.1), update("b", 500.0, 0.2)]);
    let report = reg.sync_voices(&[]);
    assert_eq!(report.faded, 2);
    assert_eq!(reg.active_voice_count(), 0);
    assert_eq!(reg.live_voice_count(), 2);
}

#[test]
fn repeated_sync_with_same_set_is_idempotent() {
    let (mut reg, _) = registry();
    let frame = [update("a", 300.0, 0.1), update("b", 500.0, 0.2)];
    reg.sync_voices(&frame);
    let before = reg.sink().calls.len();
    let report = reg.sync_voices(&frame);
    assert_eq!(report.rate_limited, 2);
    assert_eq!(report.faded, 0);
    assert_eq!(reg.sink().calls.len(), before, "no graph operations");
}

#[test]
fn fading_id_is_not_resurrected_by_sync() {
    let (mut reg, clock) = registry();
    reg.sync_voices(&[update("a", 300.0, 0.1)]);
    reg.sync_voices(&[]);
    clock.advance(Duration::from_millis(50));
    let report = reg.sync_voices(&[update("a", 300.0, 0.1)]);
    assert_eq!(report.ignored_fading, 1);
    assert_eq!(report.created, 0);
    assert_eq!(reg.sink().oscillators_created(), 1);
}

#[test]
fn id_reappearing_after_release_gets_a_fresh_voice() {
    let (mut reg, clock) = registry();
    reg.sync_voices(&[update("a", 300.0, 0.1)]);
    reg.sync_voices(&[]);
    clock.advance(MS_100);
    let report = reg.sync_voices(&[update("a", 300.0, 0.1)]);
    assert_eq!(report.released, 1);
    assert_eq!(report.created, 1);
    assert_eq!(reg.sink().oscillators_created(), 2);
    assert_eq!(reg.voice_state(&id("a")), Some(VoiceState::Active));
}

// ---------------------------------------------------------------------------
// 3. Fade and release
// ---------------------------------------------------------------------------

#[test]
fn fade_anchors_current_gain_then_ramps_to_floor() {
    let (mut reg, _) = registry();
    reg.sink_mut().time = 2.0;
    reg.update_voice(&id("a"), ToneParams::new(440.0, 0.2));
    let gain = reg.voice(&id("a")).map(|v| v.gain()).expect("voice");
    reg.stop_voice(&id("a"));

    let calls = &reg.sink().calls;
    let n = calls.len();
    assert_eq!(calls[n - 2], Call::SetValue(AudioParam::gain(gain), 0.2, 2.0));
    assert_eq!(calls[n - 1], Call::Ramp(AudioParam::gain(gain), FADE_FLOOR, 2.1));
    assert_eq!(reg.voice(&id("a")).and_then(|v| v.last_update()), None);
}

#[test]
fn release_stops_and_disconnects_exactly_once() {
    let (mut reg, clock) = registry();
    reg.sync_voices(&[update("a", 300.0, 0.1)]);
    let voice = reg.voice(&id("a")).cloned().expect("voice");
    reg.sync_voices(&[]);
    assert_eq!(reg.pending_releases().due_at(&id("a")), Some(MS_100));

    for _ in 0..5 {
        clock.advance(Duration::from_millis(40));
        reg.sync_voices(&[]);
    }

    let sink = reg.sink();
    assert_eq!(sink.stops_of(voice.oscillator()), 1);
    assert_eq!(sink.disconnects_of(voice.oscillator()), 1);
    assert_eq!(sink.disconnects_of(voice.gain()), 1);
    assert_eq!(reg.voice_state(&id("a")), None);
    assert!(reg.pending_releases().is_empty());
}

#[test]
fn release_order_is_stop_then_disconnects() {
    let (mut reg, clock) = registry();
    reg.update_voice(&id("a"), ToneParams::new(440.0, 0.2));
    let voice = reg.voice(&id("a")).cloned().expect("voice");
    reg.stop_voice(&id("a"));
    clock.advance(MS_100);
    reg.complete_due_releases();

    let tail = &reg.sink().calls[reg.sink().calls.len() - 3..];
    assert_eq!(
        tail,
        [
            Call::Stop(voice.oscillator()),
            Call::Disconnect(voice.oscillator()),
            Call::Disconnect(voice.gain()),
        ]
    );
}

#[test]
fn independent_fades_complete_independently() {
    let (mut reg, clock) = registry();
    reg.sync_voices(&[update("a", 300.0, 0.1), update("b", 500.0, 0.2)]);
    reg.stop_voice(&id("a"));
    clock.advance(Duration::from_millis(50));
    reg.stop_voice(&id("b"));

    clock.advance(Duration::from_millis(50));
    let released = reg.complete_due_releases();
    assert_eq!(released.len(), 1);
    assert_eq!(released[0].id(), &id("a"));
    assert_eq!(reg.voice_state(&id("b")), Some(VoiceState::Fading));

    clock.advance(Duration::from_millis(50));
    assert_eq!(reg.complete_due_releases().len(), 1);
    assert_eq!(reg.live_voice_count(), 0);
}

#[test]
fn stop_all_is_idempotent() {
    let (mut reg, _) = registry();
    reg.sync_voices(&[update("a", 300.0, 0.1), update("b", 500.0, 0.2)]);
    assert_eq!(reg.stop_all_voices(), 2);
    assert_eq!(reg.stop_all_voices(), 0);
    assert_eq!(reg.sink().ramps().len(), 2);
    assert_eq!(reg.pending_releases().len(), 2);
}

#[test]
fn dropping_registry_releases_every_voice() {
    let clock = ManualClock::new();
    let mut sink = RecordingSink::default();
    let fading;
    let active;
    {
        let mut reg = VoiceRegistry::with_clock(
            &mut sink,
            clock.clone(),
            VoiceTiming::default(),
            Waveform::Sine,
        );
        reg.update_voice(&id("a"), ToneParams::new(440.0, 0.2));
        reg.update_voice(&id("b"), ToneParams::new(660.0, 0.2));
        fading = reg.voice(&id("a")).cloned().expect("voice a");
        active = reg.voice(&id("b")).cloned().expect("voice b");
        reg.stop_voice(&id("a"));
    }
    for voice in [&fading, &active] {
        assert_eq!(sink.stops_of(voice.oscillator()), 1, "{}", voice.id());
        assert_eq!(sink.disconnects_of(voice.oscillator()), 1);
        assert_eq!(sink.disconnects_of(voice.gain()), 1);
    }
    // Only the voice that was already fading got a ramp.
    assert_eq!(sink.ramps().len(), 1);
}

#[test]
fn panned_voice_routes_through_panner_and_releases_it() {
    let (mut reg, clock) = registry();
    reg.sync_voices(&[ToneUpdate::new(
        "a",
        ToneParams::new(440.0, 0.5).with_pan(-0.4),
    )]);
    let voice = reg.voice(&id("a")).cloned().expect("voice");
    let panner = voice.panner().expect("panner");
    assert_eq!(reg.sink().panners_created(), 1);
    assert!(reg.sink().calls.contains(&Call::Connect(voice.gain(), Destination::Node(panner))));
    assert!(reg.sink().calls.contains(&Call::Connect(panner, Destination::Output)));
    assert_eq!(reg.sink().last_value(AudioParam::pan(panner)), Some(-0.4));

    reg.sync_voices(&[]);
    clock.advance(MS_100);
    reg.complete_due_releases();
    assert_eq!(reg.sink().disconnects_of(panner), 1);
}

#[test]
fn unpanned_voice_has_no_panner() {
    let (mut reg, _) = registry();
    reg.sync_voices(&[update("a", 440.0, 0.2)]);
    assert_eq!(reg.sink().panners_created(), 0);
    let gain = reg.voice(&id("a")).map(|v| v.gain()).expect("voice");
    assert!(reg.sink().calls.contains(&Call::Connect(gain, Destination::Output)));
}

// ---------------------------------------------------------------------------
// 4. Waveform
// ---------------------------------------------------------------------------

#[test]
fn set_waveform_touches_only_oscillator_types() {
    let (mut reg, _) = registry();
    reg.sync_voices(&[update("a", 300.0, 0.1), update("b", 500.0, 0.2)]);
    reg.stop_voice(&id("b"));
    let before = reg.sink().calls.len();

    reg.set_waveform(Waveform::Sawtooth);
    let new_calls = &reg.sink().calls[before..];
    assert_eq!(new_calls.len(), 2, "one call per live oscillator, fading included");
    assert!(new_calls
        .iter()
        .all(|c| matches!(c, Call::SetWaveform(_, Waveform::Sawtooth))));

    reg.update_voice(&id("c"), ToneParams::new(400.0, 0.1));
    let osc = reg.voice(&id("c")).map(|v| v.oscillator()).expect("voice");
    assert!(reg.sink().calls.contains(&Call::SetWaveform(osc, Waveform::Sawtooth)));
}

// ---------------------------------------------------------------------------
// 5. End to end against the render graph
// ---------------------------------------------------------------------------

#[test]
fn scenario_440_then_880_then_stop() {
    let clock = ManualClock::new();
    let mut reg = VoiceRegistry::with_clock(
        RenderGraph::new(48000.0),
        clock.clone(),
        VoiceTiming::default(),
        Waveform::Sine,
    );
    let finger = id("finger-1");
    let mut block = vec![0.0f32; 4800];

    assert_eq!(reg.update_voice(&finger, ToneParams::new(440.0, 0.2)), UpdateOutcome::Created);
    reg.sink_mut().render(&mut block);
    clock.advance(MS_100);

    assert_eq!(reg.update_voice(&finger, ToneParams::new(880.0, 0.1)), UpdateOutcome::Updated);
    let osc = reg.voice(&finger).map(|v| v.oscillator()).expect("voice");
    assert_eq!(reg.sink().param_value(AudioParam::frequency(osc)), 880.0);
    assert_eq!(reg.sink().node_count(), 2);

    reg.stop_voice(&finger);
    reg.sink_mut().render(&mut block);
    clock.advance(MS_100);
    reg.complete_due_releases();

    assert_eq!(reg.sink().node_count(), 0);
    assert_eq!(reg.live_voice_count(), 0);

    reg.sink_mut().render(&mut block);
    assert!(block.iter().all(|&s| s == 0.0));
}

#[test]
fn dropping_registry_empties_render_graph() {
    let mut graph = RenderGraph::new(48000.0);
    let mut block = vec![0.0f32; 480];
    {
        let clock = ManualClock::new();
        let mut reg = VoiceRegistry::with_clock(
            &mut graph,
            clock.clone(),
            VoiceTiming::default(),
            Waveform::Sine,
        );
        reg.sync_voices(&[update("a", 300.0, 0.2), update("b", 500.0, 0.2)]);
        reg.sink_mut().render(&mut block);
        clock.advance(MS_100);
        reg.sync_voices(&[update("a", 300.0, 0.2)]);
        assert_eq!(reg.voice_state(&id("a")), Some(VoiceState::Active));
        assert_eq!(reg.voice_state(&id("b")), Some(VoiceState::Fading));
    }
    assert_eq!(graph.node_count(), 0);
    assert_eq!(graph.running_oscillators(), 0);
    graph.render(&mut block);
    assert!(block.iter().all(|&s| s == 0.0));
}

#[test]
fn rendered_fade_is_quiet_at_release() {
    let clock = ManualClock::new();
    let mut reg = VoiceRegistry::with_clock(
        RenderGraph::new(48000.0),
        clock.clone(),
        VoiceTiming::default(),
        Waveform::Square,
    );
    reg.update_voice(&id("a"), ToneParams::new(300.0, 0.2));
    let gain = reg.voice(&id("a")).map(|v| v.gain()).expect("voice");
    let mut block = vec![0.0f32; 480];
    reg.sink_mut().render(&mut block);

    reg.stop_voice(&id("a"));
    for _ in 0..10 {
        reg.sink_mut().render(&mut block);
    }
    let level = reg.sink().param_value(AudioParam::gain(gain));
    assert!((level - FADE_FLOOR).abs() < 1e-6, "gain {}", level);
    assert_eq!(AudioParam::gain(gain).kind, ParamKind::Gain);
}

// ---------------------------------------------------------------------------
// 6. Frame driver
// ---------------------------------------------------------------------------

/// Uniform surface: every pixel has the same color.
struct Solid {
    width: u32,
    height: u32,
    color: ColorSample,
}

impl ColorSampler for Solid {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn sample_at_pixel(&self, x: i32, y: i32) -> Option<ColorSample> {
        let inside = x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height;
        inside.then_some(self.color)
    }
}

#[test]
fn driver_feeds_registry_and_observer() {
    let (mut reg, _) = registry();
    let sampler = Solid {
        width: 64,
        height: 48,
        color: ColorSample {
            hue_byte: 255,
            saturation_byte: 0,
            value_byte: 255,
            alpha: 255,
        },
    };
    let driver = FrameDriver::default();
    let mut panel = DebugPanel::new();

    let points = [TrackedPoint::new(0, 0.5, 0.5), TrackedPoint::new(1, 1.2, -0.3)];
    let report = driver.process_frame(&mut reg, &points, Some(&sampler), &mut panel);

    assert_eq!(report.created, 2);
    assert_eq!(
        reg.tracked_ids(),
        vec![id("hand-0-index-tip"), id("hand-1-index-tip")]
    );
    let text = panel.render();
    assert!(text.contains("hand-0-index-tip: 700.0 Hz | vol 0.20 | hue 255 | value 255"), "{}", text);
}

#[test]
fn driver_without_sampler_fades_everything() {
    let (mut reg, _) = registry();
    reg.sync_voices(&[update("hand-0-index-tip", 300.0, 0.1)]);
    let driver = FrameDriver::default();
    let report = driver.process_frame(
        &mut reg,
        &[TrackedPoint::new(0, 0.5, 0.5)],
        None,
        &mut NoopObserver,
    );
    assert_eq!(report.faded, 1);
}
