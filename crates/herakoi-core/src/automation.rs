//! Timestamped parameter automation.
//!
//! [`ParamTimeline`] stores step and exponential-ramp events for one
//! parameter and answers "what is the value at time `t`". Semantics follow
//! the Web Audio `AudioParam` model:
//!
//! - Events are kept sorted by time; an event scheduled at the same time as an
//!   existing one is placed after it.
//! - Between events the value holds the last event's value, except when the
//!   next event is an exponential ramp, which interpolates from the previous
//!   event's `(value, time)`:
//!
//! ```text
//! v(t) = v0 * (v1 / v0) ^ ((t - t0) / (t1 - t0))
//! ```
//!
//! - A ramp whose endpoints are zero or have opposite signs holds `v0` until
//!   `t1`, then jumps.
//!
//! Used by [`RenderGraph`](crate::RenderGraph) on the audio side and as the
//! control-side mirror inside streaming sinks.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// One scheduled change of a parameter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AutomationEvent {
    /// Jump to `value` at `time`.
    SetValue {
        /// Target value.
        value: f32,
        /// Time in seconds.
        time: f64,
    },
    /// Arrive at `value` exponentially at `time`.
    ExponentialRamp {
        /// Target value.
        value: f32,
        /// Arrival time in seconds.
        time: f64,
    },
}

impl AutomationEvent {
    /// Time of the event in seconds.
    #[inline]
    pub fn time(&self) -> f64 {
        match *self {
            AutomationEvent::SetValue { time, .. }
            | AutomationEvent::ExponentialRamp { time, .. } => time,
        }
    }

    /// Value the parameter holds once the event has completed.
    #[inline]
    pub fn value(&self) -> f32 {
        match *self {
            AutomationEvent::SetValue { value, .. }
            | AutomationEvent::ExponentialRamp { value, .. } => value,
        }
    }
}

/// Sorted automation events for one parameter.
///
/// # Example
///
/// ```rust
/// use herakoi_core::ParamTimeline;
///
/// let mut gain = ParamTimeline::new(1.0);
/// gain.set_value_at_time(0.2, 0.0);
/// gain.exponential_ramp_to_value_at_time(0.001, 0.1);
///
/// assert_eq!(gain.value_at(0.0), 0.2);
/// assert!(gain.value_at(0.05) < 0.2);
/// assert_eq!(gain.value_at(0.2), 0.001);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ParamTimeline {
    default_value: f32,
    events: Vec<AutomationEvent>,
}

impl ParamTimeline {
    /// Create an empty timeline holding `default_value`.
    pub fn new(default_value: f32) -> Self {
        Self {
            default_value,
            events: Vec::new(),
        }
    }

    /// Schedule a step to `value` at `time`.
    pub fn set_value_at_time(&mut self, value: f32, time: f64) {
        self.insert(AutomationEvent::SetValue { value, time });
    }

    /// Schedule an exponential ramp arriving at `value` at `time`.
    pub fn exponential_ramp_to_value_at_time(&mut self, value: f32, time: f64) {
        self.insert(AutomationEvent::ExponentialRamp { value, time });
    }

    fn insert(&mut self, event: AutomationEvent) {
        let at = self.events.partition_point(|e| e.time() <= event.time());
        self.events.insert(at, event);
    }

    /// Value of the parameter at `time` seconds.
    pub fn value_at(&self, time: f64) -> f32 {
        let next = self.events.partition_point(|e| e.time() <= time);
        let (start_value, start_time) = match next.checked_sub(1) {
            Some(prev) => (self.events[prev].value(), self.events[prev].time()),
            None => (self.default_value, f64::NEG_INFINITY),
        };

        match self.events.get(next) {
            Some(&AutomationEvent::ExponentialRamp {
                value: end_value,
                time: end_time,
            }) if start_time.is_finite() => {
                exponential_interpolate(start_value, end_value, start_time, end_time, time)
            }
            _ => start_value,
        }
    }

    /// Drop events that can no longer influence values at or after `now`.
    ///
    /// The last event at or before `now` is kept as the anchor for whatever
    /// follows; if it is a ramp it becomes a step to its own endpoint.
    pub fn prune(&mut self, now: f64) {
        let next = self.events.partition_point(|e| e.time() <= now);
        let Some(anchor) = next.checked_sub(1) else {
            return;
        };
        let kept = self.events[anchor];
        self.events.drain(..anchor);
        self.events[0] = AutomationEvent::SetValue {
            value: kept.value(),
            time: kept.time(),
        };
    }

    /// Scheduled events, in time order.
    pub fn events(&self) -> &[AutomationEvent] {
        &self.events
    }

    /// Number of scheduled events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no events are scheduled.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

fn exponential_interpolate(v0: f32, v1: f32, t0: f64, t1: f64, t: f64) -> f32 {
    let same_sign_nonzero = (v0 > 0.0 && v1 > 0.0) || (v0 < 0.0 && v1 < 0.0);
    if !same_sign_nonzero || t1 <= t0 {
        return v0;
    }
    let progress = ((t - t0) / (t1 - t0)).clamp(0.0, 1.0);
    let ratio = f64::from(v1) / f64::from(v0);
    (f64::from(v0) * libm::pow(ratio, progress)) as f32
}
