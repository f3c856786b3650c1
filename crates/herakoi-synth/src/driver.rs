//! Per-frame driver: tracked points → color samples → voice updates.
//!
//! For every detection frame the driver
//!
//! 1. keeps at most `max_hands` points
//! 2. mirrors x when mirror mode is on (`x → 1 - x`)
//! 3. scales normalized coordinates to the sampler's pixel grid, floors and
//!    clamps them into bounds
//! 4. samples the color, skipping points the sampler rejects
//! 5. maps the color to [`ToneParams`] and hands the list to
//!    [`VoiceRegistry::sync_voices`]
//!
//! Without a sampler every point is skipped, so the frame fades whatever is
//! sounding.

use herakoi_core::{AudioSink, Clock, ColorSampler, ToneMapping, ToneUpdate, VoiceId};

use crate::observer::{ToneObserver, ToneSample};
use crate::registry::{SyncReport, VoiceRegistry};

/// Default number of hands tracked per frame.
pub const DEFAULT_MAX_HANDS: usize = 4;
/// Upper bound for `max_hands`.
pub const MAX_HANDS_LIMIT: usize = 8;

/// Voice id of the index fingertip of hand `hand`.
pub fn hand_voice_id(hand: usize) -> VoiceId {
    VoiceId::new(format!("hand-{hand}-index-tip"))
}

/// A fingertip position in normalized image coordinates.
///
/// `x` and `y` are nominally in `[0, 1]`; values outside are clamped onto the
/// image edge when converted to pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackedPoint {
    /// Hand index reported by detection. Determines the voice id.
    pub hand: usize,
    /// Horizontal position, 0 = left edge.
    pub x: f32,
    /// Vertical position, 0 = top edge.
    pub y: f32,
}

impl TrackedPoint {
    /// Point for hand `hand` at `(x, y)`.
    pub const fn new(hand: usize, x: f32, y: f32) -> Self {
        Self { hand, x, y }
    }

    /// Voice id for this point's hand.
    pub fn voice_id(&self) -> VoiceId {
        hand_voice_id(self.hand)
    }
}

/// Convert a normalized coordinate to a pixel index inside `[0, extent - 1]`.
pub fn to_pixel(normalized: f32, extent: u32) -> i32 {
    let max = extent.saturating_sub(1) as i32;
    let scaled = (normalized * extent as f32).floor();
    if scaled.is_nan() {
        return 0;
    }
    (scaled.clamp(i32::MIN as f32, i32::MAX as f32) as i32).clamp(0, max)
}

/// Updates and samples produced for one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FramePlan {
    /// Update list for the registry, in point order.
    pub updates: Vec<ToneUpdate>,
    /// Matching debug samples, one per update.
    pub samples: Vec<ToneSample>,
}

/// Turns tracked points into registry updates.
///
/// ## Parameters
/// - `mapping`: Color → tone ranges
/// - `mirror`: Flip x before sampling (default off)
/// - `max_hands`: Points considered per frame, 1 to 8 (default 4)
#[derive(Clone, Debug, PartialEq)]
pub struct FrameDriver {
    mapping: ToneMapping,
    mirror: bool,
    max_hands: usize,
}

impl Default for FrameDriver {
    fn default() -> Self {
        Self::new(ToneMapping::default())
    }
}

impl FrameDriver {
    /// Driver with the given mapping, mirror off and four hands.
    pub fn new(mapping: ToneMapping) -> Self {
        Self {
            mapping,
            mirror: false,
            max_hands: DEFAULT_MAX_HANDS,
        }
    }

    /// Enable or disable mirror mode.
    pub fn with_mirror(mut self, mirror: bool) -> Self {
        self.mirror = mirror;
        self
    }

    /// Set the hand cap, clamped to 1..=8.
    pub fn with_max_hands(mut self, max_hands: usize) -> Self {
        self.set_max_hands(max_hands);
        self
    }

    /// Set the hand cap, clamped to 1..=8.
    pub fn set_max_hands(&mut self, max_hands: usize) {
        self.max_hands = max_hands.clamp(1, MAX_HANDS_LIMIT);
    }

    /// Enable or disable mirror mode.
    pub fn set_mirror(&mut self, mirror: bool) {
        self.mirror = mirror;
    }

    /// Replace the mapping ranges.
    pub fn set_mapping(&mut self, mapping: ToneMapping) {
        self.mapping = mapping;
    }

    /// Current mapping.
    pub fn mapping(&self) -> ToneMapping {
        self.mapping
    }

    /// Whether mirror mode is on.
    pub fn mirror(&self) -> bool {
        self.mirror
    }

    /// Current hand cap.
    pub fn max_hands(&self) -> usize {
        self.max_hands
    }

    /// Compute the updates for one frame without touching any voice.
    pub fn plan_frame(
        &self,
        points: &[TrackedPoint],
        sampler: Option<&dyn ColorSampler>,
    ) -> FramePlan {
        let mut plan = FramePlan::default();
        let Some(sampler) = sampler else {
            return plan;
        };
        let (width, height) = sampler.dimensions();

        for point in points.iter().take(self.max_hands) {
            let x = if self.mirror { 1.0 - point.x } else { point.x };
            let px = to_pixel(x, width);
            let py = to_pixel(point.y, height);
            let Some(color) = sampler.sample_at_pixel(px, py) else {
                continue;
            };

            let params = self.mapping.map(color);
            let id = point.voice_id();
            plan.samples.push(ToneSample {
                id: id.clone(),
                frequency: params.frequency,
                volume: params.volume,
                pan: params.pan,
                hue_byte: color.hue_byte,
                value_byte: color.value_byte,
            });
            plan.updates.push(ToneUpdate::new(id, params));
        }
        plan
    }

    /// Plan one frame, reconcile the registry with it and notify `observer`.
    pub fn process_frame<S: AudioSink, C: Clock>(
        &self,
        registry: &mut VoiceRegistry<S, C>,
        points: &[TrackedPoint],
        sampler: Option<&dyn ColorSampler>,
        observer: &mut dyn ToneObserver,
    ) -> SyncReport {
        let plan = self.plan_frame(points, sampler);
        let report = registry.sync_voices(&plan.updates);
        observer.observe(&plan.samples);
        report
    }
}
