//! The audio output sink contract.
//!
//! The voice registry never touches samples. It drives a small node graph
//! (oscillators feeding gains feeding the output, optionally through a stereo
//! panner) through [`AudioSink`], whose
//! operations mirror the subset of the Web Audio API a voice needs. Every
//! parameter write is timestamped in the sink's own time base
//! ([`AudioSink::current_time`], seconds).
//!
//! Two implementations exist: [`RenderGraph`](crate::RenderGraph) renders
//! in-process (offline rendering, tests), and `herakoi_io::StreamSink` forwards
//! commands to a render graph running inside a cpal callback.
//!
//! Operations on a node id the sink no longer knows are ignored.

use core::fmt;

use crate::oscillator::Waveform;

/// Identifier of a node in a sink's graph.
///
/// Ids are assigned sequentially by a [`NodeAllocator`] and never reused
/// within one sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Sequential [`NodeId`] source.
///
/// Lives wherever nodes are created: inside a [`RenderGraph`](crate::RenderGraph)
/// for in-process rendering, or on the control thread of a streaming sink so
/// that ids are known before the audio thread sees the command.
#[derive(Debug, Default, Clone)]
pub struct NodeAllocator {
    next: u32,
}

impl NodeAllocator {
    /// Create an allocator starting at id 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id.
    pub fn allocate(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }

    /// Number of ids handed out so far.
    pub fn allocated(&self) -> u32 {
        self.next
    }
}

/// Where a node's output goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Destination {
    /// Into another node (oscillator → gain, gain → panner).
    Node(NodeId),
    /// Into the sink's final output.
    Output,
}

/// Which automatable parameter of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamKind {
    /// Oscillator frequency in Hz. Defaults to 440.
    Frequency,
    /// Gain multiplier. Defaults to 1.
    Gain,
    /// Stereo position of a panner, -1 (left) to 1 (right). Defaults to 0.
    Pan,
}

impl ParamKind {
    /// Value the parameter holds before any automation event.
    pub const fn default_value(self) -> f32 {
        match self {
            ParamKind::Frequency => 440.0,
            ParamKind::Gain => 1.0,
            ParamKind::Pan => 0.0,
        }
    }
}

/// An automatable parameter: a node plus which of its parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AudioParam {
    /// Owning node.
    pub node: NodeId,
    /// Parameter on that node.
    pub kind: ParamKind,
}

impl AudioParam {
    /// Frequency parameter of an oscillator node.
    pub const fn frequency(oscillator: NodeId) -> Self {
        Self {
            node: oscillator,
            kind: ParamKind::Frequency,
        }
    }

    /// Gain parameter of a gain node.
    pub const fn gain(gain: NodeId) -> Self {
        Self {
            node: gain,
            kind: ParamKind::Gain,
        }
    }

    /// Position parameter of a panner node.
    pub const fn pan(panner: NodeId) -> Self {
        Self {
            node: panner,
            kind: ParamKind::Pan,
        }
    }
}

/// Node-graph audio output driven by the voice registry.
///
/// Implementations are infallible at the operation level: a sink that could
/// not be opened fails at construction, and operations on unknown nodes are
/// no-ops.
pub trait AudioSink {
    /// The sink's current time in seconds.
    fn current_time(&self) -> f64;

    /// Create a stopped oscillator node (440 Hz sine).
    fn create_oscillator(&mut self) -> NodeId;

    /// Create a gain node (gain 1.0).
    fn create_gain(&mut self) -> NodeId;

    /// Create an equal-power stereo panner node (pan 0.0, centered).
    fn create_panner(&mut self) -> NodeId;

    /// Route `node`'s output to `destination`.
    fn connect(&mut self, node: NodeId, destination: Destination);

    /// Remove every outgoing connection of `node`.
    fn disconnect(&mut self, node: NodeId);

    /// Change an oscillator's waveform.
    fn set_waveform(&mut self, oscillator: NodeId, waveform: Waveform);

    /// Start an oscillator.
    fn start(&mut self, oscillator: NodeId);

    /// Stop an oscillator. A stopped oscillator cannot be restarted.
    fn stop(&mut self, oscillator: NodeId);

    /// Value of a parameter at [`current_time`](Self::current_time).
    fn param_value(&self, param: AudioParam) -> f32;

    /// Schedule a step to `value` at `time` seconds.
    fn set_value_at_time(&mut self, param: AudioParam, value: f32, time: f64);

    /// Schedule an exponential ramp from the previous event to `value`,
    /// arriving at `time` seconds.
    fn exponential_ramp_to_value_at_time(&mut self, param: AudioParam, value: f32, time: f64);
}

impl<S: AudioSink + ?Sized> AudioSink for &mut S {
    fn current_time(&self) -> f64 {
        (**self).current_time()
    }

    fn create_oscillator(&mut self) -> NodeId {
        (**self).create_oscillator()
    }

    fn create_gain(&mut self) -> NodeId {
        (**self).create_gain()
    }

    fn create_panner(&mut self) -> NodeId {
        (**self).create_panner()
    }

    fn connect(&mut self, node: NodeId, destination: Destination) {
        (**self).connect(node, destination);
    }

    fn disconnect(&mut self, node: NodeId) {
        (**self).disconnect(node);
    }

    fn set_waveform(&mut self, oscillator: NodeId, waveform: Waveform) {
        (**self).set_waveform(oscillator, waveform);
    }

    fn start(&mut self, oscillator: NodeId) {
        (**self).start(oscillator);
    }

    fn stop(&mut self, oscillator: NodeId) {
        (**self).stop(oscillator);
    }

    fn param_value(&self, param: AudioParam) -> f32 {
        (**self).param_value(param)
    }

    fn set_value_at_time(&mut self, param: AudioParam, value: f32, time: f64) {
        (**self).set_value_at_time(param, value, time);
    }

    fn exponential_ramp_to_value_at_time(&mut self, param: AudioParam, value: f32, time: f64) {
        (**self).exponential_ramp_to_value_at_time(param, value, time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_is_sequential() {
        let mut ids = NodeAllocator::new();
        let a = ids.allocate();
        let b = ids.allocate();
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(ids.allocated(), 2);
        assert_eq!(b.to_string(), "#1");
    }

    #[test]
    fn param_defaults_follow_web_audio() {
        assert_eq!(ParamKind::Frequency.default_value(), 440.0);
        assert_eq!(ParamKind::Gain.default_value(), 1.0);
        assert_eq!(ParamKind::Pan.default_value(), 0.0);
        let node = NodeAllocator::new().allocate();
        assert_eq!(AudioParam::gain(node).kind, ParamKind::Gain);
        assert_eq!(AudioParam::pan(node).kind, ParamKind::Pan);
        assert_eq!(AudioParam::frequency(node).node, node);
    }
}
