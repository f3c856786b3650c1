//! In-process audio output sink.
//!
//! [`RenderGraph`] owns an arena of oscillator and gain nodes keyed by
//! [`NodeId`] and renders their sum into sample buffers. Panner nodes give
//! the mix a stereo image. It implements
//! [`AudioSink`] directly, so the voice registry can drive it for offline
//! rendering and tests, and it accepts [`GraphCommand`]s so a streaming sink
//! can drive it from the control thread while it runs inside an audio callback.
//!
//! # Topology
//!
//! Only `oscillator → gain → output` and `oscillator → gain → panner → output`
//! chains are rendered (an oscillator may also feed the output directly).
//! Any other node-to-node connection is ignored.
//!
//! # Channels
//!
//! Everything that reaches the output without a panner lands on both
//! channels at full level. A panner splits its input with an equal-power law.
//! Mono renders take the mean of left and right, so graphs without panners
//! render identically in mono and stereo.
//!
//! # Node Lifetime
//!
//! Nodes are dropped from the arena as soon as nothing can hear them again:
//! an oscillator once it is stopped and disconnected, a gain once it has no
//! outgoing connection and no oscillator feeding it.
//!
//! # Time
//!
//! Time advances only by rendering: `current_time = frames_rendered /
//! sample_rate`. Automation events are evaluated per frame against that time.

#[cfg(not(feature = "std"))]
use alloc::{collections::BTreeMap, vec::Vec};
#[cfg(feature = "std")]
use std::collections::BTreeMap;

use crate::automation::ParamTimeline;
use crate::math::{equal_power_pan, flush_denormal};
use crate::oscillator::{Oscillator, Waveform};
use crate::sink::{AudioParam, AudioSink, Destination, NodeAllocator, NodeId, ParamKind};

/// One mutation of a [`RenderGraph`], with node ids allocated by the sender.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GraphCommand {
    /// Insert a stopped 440 Hz sine oscillator under `id`.
    CreateOscillator(NodeId),
    /// Insert a unity gain node under `id`.
    CreateGain(NodeId),
    /// Insert a centered stereo panner under `id`.
    CreatePanner(NodeId),
    /// Route `node` into `destination`.
    Connect {
        /// Source node.
        node: NodeId,
        /// Where its output goes.
        destination: Destination,
    },
    /// Remove all outgoing connections of a node.
    Disconnect(NodeId),
    /// Change an oscillator's waveform.
    SetWaveform {
        /// Oscillator node.
        node: NodeId,
        /// New waveform.
        waveform: Waveform,
    },
    /// Start an oscillator.
    Start(NodeId),
    /// Stop an oscillator for good.
    Stop(NodeId),
    /// Step a parameter at `time`.
    SetValueAtTime {
        /// Target parameter.
        param: AudioParam,
        /// New value.
        value: f32,
        /// Time in seconds.
        time: f64,
    },
    /// Exponential ramp arriving at `value` at `time`.
    ExponentialRampToValueAtTime {
        /// Target parameter.
        param: AudioParam,
        /// Final value.
        value: f32,
        /// Arrival time in seconds.
        time: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Playback {
    Idle,
    Running,
    Stopped,
}

#[derive(Debug, Clone)]
enum NodeKind {
    Oscillator {
        osc: Oscillator,
        frequency: ParamTimeline,
        playback: Playback,
    },
    Gain {
        gain: ParamTimeline,
        /// Summed input of the frame being rendered.
        input: f32,
    },
    Panner {
        pan: ParamTimeline,
        input: f32,
    },
}

impl NodeKind {
    fn input_mut(&mut self) -> Option<&mut f32> {
        match self {
            NodeKind::Gain { input, .. } | NodeKind::Panner { input, .. } => Some(input),
            NodeKind::Oscillator { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    outputs: Vec<Destination>,
}

/// Arena of audio nodes rendered into a stereo mix.
///
/// ## Parameters
/// - `sample_rate`: Output sample rate in Hz
///
/// # Example
///
/// ```rust
/// use herakoi_core::{AudioParam, AudioSink, Destination, RenderGraph};
///
/// let mut graph = RenderGraph::new(48000.0);
/// let osc = graph.create_oscillator();
/// let gain = graph.create_gain();
/// graph.connect(osc, Destination::Node(gain));
/// graph.connect(gain, Destination::Output);
/// graph.set_value_at_time(AudioParam::gain(gain), 0.2, 0.0);
/// graph.start(osc);
///
/// let mut block = [0.0f32; 256];
/// graph.render(&mut block);
/// assert!(block.iter().any(|s| s.abs() > 0.01));
/// ```
#[derive(Debug, Clone)]
pub struct RenderGraph {
    sample_rate: f32,
    nodes: BTreeMap<NodeId, Node>,
    ids: NodeAllocator,
    frames: u64,
    /// Node outputs of the current stage, reused across frames.
    routed: Vec<(Destination, f32)>,
}

impl RenderGraph {
    /// Create an empty graph at `sample_rate` Hz.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            nodes: BTreeMap::new(),
            ids: NodeAllocator::new(),
            frames: 0,
            routed: Vec::new(),
        }
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Frames rendered since construction.
    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    /// Number of nodes still in the arena.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether `node` is still in the arena.
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    /// Number of oscillators currently running.
    pub fn running_oscillators(&self) -> usize {
        self.nodes
            .values()
            .filter(|n| {
                matches!(
                    n.kind,
                    NodeKind::Oscillator {
                        playback: Playback::Running,
                        ..
                    }
                )
            })
            .count()
    }

    /// Apply one command.
    pub fn apply(&mut self, command: GraphCommand) {
        match command {
            GraphCommand::CreateOscillator(id) => {
                let mut osc = Oscillator::new(self.sample_rate);
                osc.set_frequency(ParamKind::Frequency.default_value());
                self.insert(
                    id,
                    NodeKind::Oscillator {
                        osc,
                        frequency: ParamTimeline::new(ParamKind::Frequency.default_value()),
                        playback: Playback::Idle,
                    },
                );
            }
            GraphCommand::CreateGain(id) => {
                self.insert(
                    id,
                    NodeKind::Gain {
                        gain: ParamTimeline::new(ParamKind::Gain.default_value()),
                        input: 0.0,
                    },
                );
            }
            GraphCommand::CreatePanner(id) => {
                self.insert(
                    id,
                    NodeKind::Panner {
                        pan: ParamTimeline::new(ParamKind::Pan.default_value()),
                        input: 0.0,
                    },
                );
            }
            GraphCommand::Connect { node, destination } => self.apply_connect(node, destination),
            GraphCommand::Disconnect(id) => {
                let Some(node) = self.nodes.get_mut(&id) else {
                    return;
                };
                let old = core::mem::take(&mut node.outputs);
                self.collect(id);
                for destination in old {
                    if let Destination::Node(target) = destination {
                        self.collect(target);
                    }
                }
            }
            GraphCommand::SetWaveform { node, waveform } => {
                if let Some(Node {
                    kind: NodeKind::Oscillator { osc, .. },
                    ..
                }) = self.nodes.get_mut(&node)
                {
                    osc.set_waveform(waveform);
                }
            }
            GraphCommand::Start(id) => {
                if let Some(Node {
                    kind: NodeKind::Oscillator { playback, .. },
                    ..
                }) = self.nodes.get_mut(&id)
                    && *playback == Playback::Idle
                {
                    *playback = Playback::Running;
                }
            }
            GraphCommand::Stop(id) => {
                if let Some(Node {
                    kind: NodeKind::Oscillator { playback, .. },
                    ..
                }) = self.nodes.get_mut(&id)
                {
                    *playback = Playback::Stopped;
                }
                self.collect(id);
            }
            GraphCommand::SetValueAtTime { param, value, time } => {
                if let Some(timeline) = self.timeline_mut(param) {
                    timeline.set_value_at_time(value, time);
                }
            }
            GraphCommand::ExponentialRampToValueAtTime { param, value, time } => {
                if let Some(timeline) = self.timeline_mut(param) {
                    timeline.exponential_ramp_to_value_at_time(value, time);
                }
            }
        }
    }

    fn insert(&mut self, id: NodeId, kind: NodeKind) {
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_add: node {id}");
        self.nodes.insert(
            id,
            Node {
                kind,
                outputs: Vec::new(),
            },
        );
    }

    fn apply_connect(&mut self, node: NodeId, destination: Destination) {
        let Some(source) = self.nodes.get(&node) else {
            return;
        };
        if let Destination::Node(target) = destination {
            let routable = matches!(
                (&source.kind, self.nodes.get(&target).map(|t| &t.kind)),
                (NodeKind::Oscillator { .. }, Some(NodeKind::Gain { .. }))
                    | (NodeKind::Gain { .. }, Some(NodeKind::Panner { .. }))
            );
            if !routable {
                #[cfg(feature = "tracing")]
                tracing::debug!("graph_connect: ignored {node} -> {target}");
                return;
            }
        }
        if let Some(n) = self.nodes.get_mut(&node)
            && !n.outputs.contains(&destination)
        {
            n.outputs.push(destination);
        }
    }

    /// Drop `id` if nothing can hear it any more.
    fn collect(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        let dead = match node.kind {
            NodeKind::Oscillator { playback, .. } => {
                playback == Playback::Stopped && node.outputs.is_empty()
            }
            NodeKind::Gain { .. } | NodeKind::Panner { .. } => {
                node.outputs.is_empty()
                    && !self
                        .nodes
                        .values()
                        .any(|n| n.outputs.contains(&Destination::Node(id)))
            }
        };
        if dead {
            #[cfg(feature = "tracing")]
            tracing::debug!("graph_remove: node {id}");
            self.nodes.remove(&id);
        }
    }

    fn timeline_mut(&mut self, param: AudioParam) -> Option<&mut ParamTimeline> {
        match (&mut self.nodes.get_mut(&param.node)?.kind, param.kind) {
            (NodeKind::Oscillator { frequency, .. }, ParamKind::Frequency) => Some(frequency),
            (NodeKind::Gain { gain, .. }, ParamKind::Gain) => Some(gain),
            (NodeKind::Panner { pan, .. }, ParamKind::Pan) => Some(pan),
            _ => None,
        }
    }

    fn timeline(&self, param: AudioParam) -> Option<&ParamTimeline> {
        match (&self.nodes.get(&param.node)?.kind, param.kind) {
            (NodeKind::Oscillator { frequency, .. }, ParamKind::Frequency) => Some(frequency),
            (NodeKind::Gain { gain, .. }, ParamKind::Gain) => Some(gain),
            (NodeKind::Panner { pan, .. }, ParamKind::Pan) => Some(pan),
            _ => None,
        }
    }

    /// Render one mono block, advancing time by `out.len()` frames.
    pub fn render(&mut self, out: &mut [f32]) {
        self.prune_timelines();
        for sample in out.iter_mut() {
            let (left, right) = self.render_frame();
            *sample = 0.5 * (left + right);
        }
    }

    /// Render into an interleaved buffer.
    ///
    /// One channel gets the mono mix; two or more get left and right on the
    /// first pair and the mono mix on the rest. Trailing samples that do not
    /// form a whole frame are zeroed.
    pub fn render_interleaved(&mut self, data: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        self.prune_timelines();
        let mut frames = data.chunks_exact_mut(channels);
        for frame in &mut frames {
            let (left, right) = self.render_frame();
            let mid = 0.5 * (left + right);
            match frame {
                [mono] => *mono = mid,
                [l, r, rest @ ..] => {
                    *l = left;
                    *r = right;
                    rest.fill(mid);
                }
                [] => {}
            }
        }
        frames.into_remainder().fill(0.0);
    }

    fn prune_timelines(&mut self) {
        let now = self.current_time();
        for node in self.nodes.values_mut() {
            match &mut node.kind {
                NodeKind::Oscillator { frequency, .. } => frequency.prune(now),
                NodeKind::Gain { gain, .. } => gain.prune(now),
                NodeKind::Panner { pan, .. } => pan.prune(now),
            }
        }
    }

    fn render_frame(&mut self) -> (f32, f32) {
        let t = self.current_time();
        let Self { nodes, routed, .. } = &mut *self;
        let (mut left, mut right) = (0.0, 0.0);

        routed.clear();
        for node in nodes.values_mut() {
            if let NodeKind::Oscillator {
                osc,
                frequency,
                playback: Playback::Running,
            } = &mut node.kind
            {
                osc.set_frequency(frequency.value_at(t));
                let sample = osc.advance();
                for destination in &node.outputs {
                    routed.push((*destination, sample));
                }
            }
        }
        let direct = route(nodes, routed);

        routed.clear();
        for node in nodes.values_mut() {
            if let NodeKind::Gain { gain, input } = &mut node.kind {
                let out = *input * gain.value_at(t);
                *input = 0.0;
                for destination in &node.outputs {
                    routed.push((*destination, out));
                }
            }
        }
        let direct = direct + route(nodes, routed);
        left += direct;
        right += direct;

        for node in nodes.values_mut() {
            if let NodeKind::Panner { pan, input } = &mut node.kind {
                let out = *input;
                *input = 0.0;
                if node.outputs.contains(&Destination::Output) {
                    let (gl, gr) = equal_power_pan(pan.value_at(t));
                    left += out * gl;
                    right += out * gr;
                }
            }
        }

        self.frames += 1;
        (flush_denormal(left), flush_denormal(right))
    }
}

/// Deliver one stage of node outputs; returns what went straight to the output.
fn route(nodes: &mut BTreeMap<NodeId, Node>, routed: &[(Destination, f32)]) -> f32 {
    let mut direct = 0.0;
    for &(destination, sample) in routed {
        match destination {
            Destination::Output => direct += sample,
            Destination::Node(target) => {
                if let Some(input) = nodes.get_mut(&target).and_then(|n| n.kind.input_mut()) {
                    *input += sample;
                }
            }
        }
    }
    direct
}

impl AudioSink for RenderGraph {
    fn current_time(&self) -> f64 {
        self.frames as f64 / f64::from(self.sample_rate)
    }

    fn create_oscillator(&mut self) -> NodeId {
        let id = self.ids.allocate();
        self.apply(GraphCommand::CreateOscillator(id));
        id
    }

    fn create_gain(&mut self) -> NodeId {
        let id = self.ids.allocate();
        self.apply(GraphCommand::CreateGain(id));
        id
    }

    fn create_panner(&mut self) -> NodeId {
        let id = self.ids.allocate();
        self.apply(GraphCommand::CreatePanner(id));
        id
    }

    fn connect(&mut self, node: NodeId, destination: Destination) {
        self.apply(GraphCommand::Connect { node, destination });
    }

    fn disconnect(&mut self, node: NodeId) {
        self.apply(GraphCommand::Disconnect(node));
    }

    fn set_waveform(&mut self, oscillator: NodeId, waveform: Waveform) {
        self.apply(GraphCommand::SetWaveform {
            node: oscillator,
            waveform,
        });
    }

    fn start(&mut self, oscillator: NodeId) {
        self.apply(GraphCommand::Start(oscillator));
    }

    fn stop(&mut self, oscillator: NodeId) {
        self.apply(GraphCommand::Stop(oscillator));
    }

    fn param_value(&self, param: AudioParam) -> f32 {
        self.timeline(param)
            .map_or(param.kind.default_value(), |t| t.value_at(self.current_time()))
    }

    fn set_value_at_time(&mut self, param: AudioParam, value: f32, time: f64) {
        self.apply(GraphCommand::SetValueAtTime { param, value, time });
    }

    fn exponential_ramp_to_value_at_time(&mut self, param: AudioParam, value: f32, time: f64) {
        self.apply(GraphCommand::ExponentialRampToValueAtTime { param, value, time });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48000.0;

    fn voice(graph: &mut RenderGraph, volume: f32) -> (NodeId, NodeId) {
        let osc = graph.create_oscillator();
        let gain = graph.create_gain();
        graph.connect(osc, Destination::Node(gain));
        graph.connect(gain, Destination::Output);
        graph.set_value_at_time(AudioParam::gain(gain), volume, graph.current_time());
        graph.start(osc);
        (osc, gain)
    }

    fn peak(block: &[f32]) -> f32 {
        block.iter().fold(0.0f32, |m, s| m.max(s.abs()))
    }

    #[test]
    fn silent_without_nodes() {
        let mut graph = RenderGraph::new(SR);
        let mut block = [1.0f32; 64];
        graph.render(&mut block);
        assert!(block.iter().all(|&s| s == 0.0));
        assert_eq!(graph.frames_rendered(), 64);
        assert!((graph.current_time() - 64.0 / 48000.0).abs() < 1e-12);
    }

    #[test]
    fn voice_peak_tracks_gain() {
        let mut graph = RenderGraph::new(SR);
        voice(&mut graph, 0.25);
        let mut block = [0.0f32; 480];
        graph.render(&mut block);
        let p = peak(&block);
        assert!((p - 0.25).abs() < 0.01, "peak {}", p);
    }

    #[test]
    fn unstarted_oscillator_is_silent() {
        let mut graph = RenderGraph::new(SR);
        let osc = graph.create_oscillator();
        graph.connect(osc, Destination::Output);
        let mut block = [0.0f32; 128];
        graph.render(&mut block);
        assert_eq!(peak(&block), 0.0);
    }

    #[test]
    fn fade_reaches_floor() {
        let mut graph = RenderGraph::new(SR);
        let (_, gain) = voice(&mut graph, 0.5);
        let param = AudioParam::gain(gain);
        graph.set_value_at_time(param, graph.param_value(param), 0.0);
        graph.exponential_ramp_to_value_at_time(param, 0.001, 0.1);

        let mut block = vec![0.0f32; 4800];
        graph.render(&mut block);
        assert!((graph.param_value(param) - 0.001).abs() < 1e-6);

        let mut tail = [0.0f32; 480];
        graph.render(&mut tail);
        assert!(peak(&tail) <= 0.0011, "tail peak {}", peak(&tail));
    }

    #[test]
    fn release_sequence_empties_arena() {
        let mut graph = RenderGraph::new(SR);
        let (osc, gain) = voice(&mut graph, 0.2);
        assert_eq!(graph.node_count(), 2);

        graph.stop(osc);
        assert!(graph.contains(osc), "still connected");
        graph.disconnect(osc);
        assert!(!graph.contains(osc));
        assert!(graph.contains(gain));
        graph.disconnect(gain);
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn commands_on_removed_nodes_are_ignored() {
        let mut graph = RenderGraph::new(SR);
        let (osc, gain) = voice(&mut graph, 0.2);
        graph.stop(osc);
        graph.disconnect(osc);
        graph.disconnect(gain);

        graph.start(osc);
        graph.set_value_at_time(AudioParam::frequency(osc), 880.0, 0.0);
        graph.connect(osc, Destination::Output);
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.param_value(AudioParam::gain(gain)), 1.0);
    }

    #[test]
    fn ids_are_never_reused() {
        let mut graph = RenderGraph::new(SR);
        let (osc, gain) = voice(&mut graph, 0.2);
        graph.stop(osc);
        graph.disconnect(osc);
        graph.disconnect(gain);
        let next = graph.create_oscillator();
        assert!(next.index() > gain.index());
    }

    #[test]
    fn gain_to_gain_connection_is_ignored() {
        let mut graph = RenderGraph::new(SR);
        let a = graph.create_gain();
        let b = graph.create_gain();
        graph.connect(a, Destination::Node(b));
        graph.disconnect(b);
        assert!(!graph.contains(b));
    }

    #[test]
    fn frequency_automation_changes_pitch() {
        let mut graph = RenderGraph::new(SR);
        let (osc, _) = voice(&mut graph, 1.0);
        graph.set_value_at_time(AudioParam::frequency(osc), 1000.0, 0.0);

        let mut block = vec![0.0f32; 48000];
        graph.render(&mut block);
        let crossings = block
            .windows(2)
            .filter(|w| w[0] <= 0.0 && w[1] > 0.0)
            .count() as i64;
        assert!((crossings - 1000).abs() <= 2, "crossings {}", crossings);
    }

    #[test]
    fn interleaved_duplicates_mono() {
        let mut graph = RenderGraph::new(SR);
        voice(&mut graph, 0.3);
        let mut data = [0.0f32; 2 * 64 + 1];
        graph.render_interleaved(&mut data, 2);
        for frame in data[..128].chunks_exact(2) {
            assert_eq!(frame[0], frame[1]);
        }
        assert_eq!(data[128], 0.0);
        assert_eq!(graph.frames_rendered(), 64);
    }

    fn panned_voice(graph: &mut RenderGraph, volume: f32, pan: f32) -> (NodeId, NodeId, NodeId) {
        let osc = graph.create_oscillator();
        let gain = graph.create_gain();
        let panner = graph.create_panner();
        graph.connect(osc, Destination::Node(gain));
        graph.connect(gain, Destination::Node(panner));
        graph.connect(panner, Destination::Output);
        graph.set_value_at_time(AudioParam::gain(gain), volume, 0.0);
        graph.set_value_at_time(AudioParam::pan(panner), pan, 0.0);
        graph.start(osc);
        (osc, gain, panner)
    }

    #[test]
    fn hard_left_pan_silences_right_channel() {
        let mut graph = RenderGraph::new(SR);
        panned_voice(&mut graph, 0.5, -1.0);
        let mut data = vec![0.0f32; 2 * 480];
        graph.render_interleaved(&mut data, 2);
        let left: Vec<f32> = data.iter().step_by(2).copied().collect();
        let right: Vec<f32> = data.iter().skip(1).step_by(2).copied().collect();
        assert!((peak(&left) - 0.5).abs() < 0.01, "left peak {}", peak(&left));
        assert!(peak(&right) < 1e-6, "right peak {}", peak(&right));
    }

    #[test]
    fn centered_pan_is_equal_power() {
        let mut graph = RenderGraph::new(SR);
        panned_voice(&mut graph, 1.0, 0.0);
        let mut data = vec![0.0f32; 2 * 480];
        graph.render_interleaved(&mut data, 2);
        for frame in data.chunks_exact(2) {
            assert!((frame[0] - frame[1]).abs() < 1e-6);
        }
        let left: Vec<f32> = data.iter().step_by(2).copied().collect();
        let expected = core::f32::consts::FRAC_1_SQRT_2;
        assert!((peak(&left) - expected).abs() < 0.01, "left peak {}", peak(&left));
    }

    #[test]
    fn mono_render_averages_panned_channels() {
        let mut graph = RenderGraph::new(SR);
        panned_voice(&mut graph, 0.5, 1.0);
        let mut block = [0.0f32; 480];
        graph.render(&mut block);
        assert!((peak(&block) - 0.25).abs() < 0.01, "peak {}", peak(&block));
    }

    #[test]
    fn panned_release_sequence_empties_arena() {
        let mut graph = RenderGraph::new(SR);
        let (osc, gain, panner) = panned_voice(&mut graph, 0.2, 0.3);
        assert_eq!(graph.node_count(), 3);
        assert!((graph.param_value(AudioParam::pan(panner)) - 0.3).abs() < 1e-6);

        graph.stop(osc);
        graph.disconnect(osc);
        graph.disconnect(gain);
        assert!(!graph.contains(gain));
        assert!(graph.contains(panner), "still routed to the output");
        graph.disconnect(panner);
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn oscillator_cannot_feed_panner_directly() {
        let mut graph = RenderGraph::new(SR);
        let osc = graph.create_oscillator();
        let panner = graph.create_panner();
        graph.connect(osc, Destination::Node(panner));
        graph.connect(panner, Destination::Output);
        graph.start(osc);
        let mut block = [0.0f32; 128];
        graph.render(&mut block);
        assert_eq!(peak(&block), 0.0);
    }
}
