//! Real-time [`AudioSink`] backed by an audio output stream.
//!
//! The control thread (registry, driver) and the audio thread never share the
//! graph:
//!
//! - node ids are allocated on the control side, so creation returns at once
//! - every operation becomes a [`GraphCommand`] sent over an unbounded
//!   crossbeam channel
//! - the output callback drains the channel, renders its own [`RenderGraph`]
//!   and publishes the frame count through an atomic
//!
//! `current_time()` is that frame count over the sample rate. Parameter reads
//! are answered from a control-side mirror of the automation timelines, so a
//! fade can anchor on the value the audio thread is producing right now.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{Sender, unbounded};
use herakoi_core::{
    AudioParam, AudioSink, Destination, GraphCommand, NodeAllocator, NodeId, ParamTimeline,
    RenderGraph, Waveform,
};

use crate::Result;
use crate::backend::{AudioBackend, BackendStreamConfig, ErrorCallback, OutputCallback, StreamHandle};

/// Audio sink that renders on a backend's output thread.
///
/// Dropping the sink stops the stream.
pub struct StreamSink {
    commands: Sender<GraphCommand>,
    ids: NodeAllocator,
    frames: Arc<AtomicU64>,
    stream_errors: Arc<AtomicU64>,
    params: BTreeMap<AudioParam, ParamTimeline>,
    sample_rate: u32,
    channels: u16,
    backend: String,
    _stream: StreamHandle,
}

impl StreamSink {
    /// Open an output stream on `backend` and start rendering silence.
    ///
    /// Fails with [`Error::NoDevice`](crate::Error::NoDevice),
    /// [`Error::DeviceNotFound`](crate::Error::DeviceNotFound) or
    /// [`Error::Stream`](crate::Error::Stream) when no output can be opened.
    pub fn open(backend: &dyn AudioBackend, config: &BackendStreamConfig) -> Result<Self> {
        let sample_rate = backend.actual_sample_rate(config);
        let channels = config.channels.max(1);
        let (tx, rx) = unbounded::<GraphCommand>();
        let frames = Arc::new(AtomicU64::new(0));
        let stream_errors = Arc::new(AtomicU64::new(0));

        let mut graph = RenderGraph::new(sample_rate as f32);
        let rendered = Arc::clone(&frames);
        let callback: OutputCallback = Box::new(move |data: &mut [f32]| {
            for command in rx.try_iter() {
                graph.apply(command);
            }
            graph.render_interleaved(data, usize::from(channels));
            rendered.store(graph.frames_rendered(), Ordering::Release);
        });

        let error_count = Arc::clone(&stream_errors);
        let error_callback: ErrorCallback = Box::new(move |message: &str| {
            error_count.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(error = message, "output stream error");
        });

        let stream_config = BackendStreamConfig {
            sample_rate,
            channels,
            ..config.clone()
        };
        let stream = backend.build_output_stream(&stream_config, callback, error_callback)?;

        tracing::info!(
            backend = backend.name(),
            sample_rate,
            channels,
            "stream sink opened"
        );

        Ok(Self {
            commands: tx,
            ids: NodeAllocator::new(),
            frames,
            stream_errors,
            params: BTreeMap::new(),
            sample_rate,
            channels,
            backend: backend.name().to_string(),
            _stream: stream,
        })
    }

    /// Sample rate the stream runs at.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Output channel count.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Name of the backend the stream was opened on.
    pub fn backend_name(&self) -> &str {
        &self.backend
    }

    /// Frames rendered by the audio thread so far.
    pub fn frames_rendered(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    /// Errors reported by the backend since the stream opened.
    pub fn stream_errors(&self) -> u64 {
        self.stream_errors.load(Ordering::Relaxed)
    }

    /// Nodes allocated since the stream opened.
    pub fn nodes_allocated(&self) -> u32 {
        self.ids.allocated()
    }

    fn send(&self, command: GraphCommand) {
        if self.commands.send(command).is_err() {
            tracing::trace!(?command, "render thread gone, command dropped");
        }
    }

    fn timeline(&mut self, param: AudioParam) -> &mut ParamTimeline {
        let now = self.current_time();
        let timeline = self
            .params
            .entry(param)
            .or_insert_with(|| ParamTimeline::new(param.kind.default_value()));
        timeline.prune(now);
        timeline
    }
}

impl std::fmt::Debug for StreamSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSink")
            .field("backend", &self.backend)
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .field("frames_rendered", &self.frames_rendered())
            .finish_non_exhaustive()
    }
}

impl AudioSink for StreamSink {
    fn current_time(&self) -> f64 {
        self.frames_rendered() as f64 / f64::from(self.sample_rate)
    }

    fn create_oscillator(&mut self) -> NodeId {
        let id = self.ids.allocate();
        self.send(GraphCommand::CreateOscillator(id));
        id
    }

    fn create_gain(&mut self) -> NodeId {
        let id = self.ids.allocate();
        self.send(GraphCommand::CreateGain(id));
        id
    }

    fn create_panner(&mut self) -> NodeId {
        let id = self.ids.allocate();
        self.send(GraphCommand::CreatePanner(id));
        id
    }

    fn connect(&mut self, node: NodeId, destination: Destination) {
        self.send(GraphCommand::Connect { node, destination });
    }

    fn disconnect(&mut self, node: NodeId) {
        self.params.retain(|param, _| param.node != node);
        self.send(GraphCommand::Disconnect(node));
    }

    fn set_waveform(&mut self, oscillator: NodeId, waveform: Waveform) {
        self.send(GraphCommand::SetWaveform {
            node: oscillator,
            waveform,
        });
    }

    fn start(&mut self, oscillator: NodeId) {
        self.send(GraphCommand::Start(oscillator));
    }

    fn stop(&mut self, oscillator: NodeId) {
        self.send(GraphCommand::Stop(oscillator));
    }

    fn param_value(&self, param: AudioParam) -> f32 {
        self.params
            .get(&param)
            .map_or(param.kind.default_value(), |t| t.value_at(self.current_time()))
    }

    fn set_value_at_time(&mut self, param: AudioParam, value: f32, time: f64) {
        self.timeline(param).set_value_at_time(value, time);
        self.send(GraphCommand::SetValueAtTime { param, value, time });
    }

    fn exponential_ramp_to_value_at_time(&mut self, param: AudioParam, value: f32, time: f64) {
        self.timeline(param)
            .exponential_ramp_to_value_at_time(value, time);
        self.send(GraphCommand::ExponentialRampToValueAtTime { param, value, time });
    }
}
