//! Detection tracks: fingertip positions over time, stored as JSON.
//!
//! A track stands in for a live hand tracker. Each frame lists the points
//! detected in it; frames are spaced `frame_interval_ms` apart.
//!
//! ```json
//! {
//!   "frame_interval_ms": 33,
//!   "frames": [
//!     { "points": [{ "hand": 0, "x": 0.25, "y": 0.5 }] },
//!     { "points": [] }
//!   ]
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use herakoi_synth::TrackedPoint;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Frame spacing used when a track does not specify one (about 30 fps).
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 33;

fn default_frame_interval_ms() -> u64 {
    DEFAULT_FRAME_INTERVAL_MS
}

/// One detected fingertip.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    /// Hand index.
    pub hand: usize,
    /// Normalized horizontal position.
    pub x: f32,
    /// Normalized vertical position.
    pub y: f32,
}

impl From<TrackPoint> for TrackedPoint {
    fn from(point: TrackPoint) -> Self {
        TrackedPoint::new(point.hand, point.x, point.y)
    }
}

/// Points detected in one frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackFrame {
    /// Detected points, in detection order.
    #[serde(default)]
    pub points: Vec<TrackPoint>,
}

impl TrackFrame {
    /// Points as driver input.
    pub fn tracked_points(&self) -> Vec<TrackedPoint> {
        self.points.iter().copied().map(TrackedPoint::from).collect()
    }
}

/// A sequence of detection frames.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionTrack {
    /// Milliseconds between frames.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    /// Frames in playback order.
    #[serde(default)]
    pub frames: Vec<TrackFrame>,
}

impl Default for DetectionTrack {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_INTERVAL_MS)
    }
}

impl DetectionTrack {
    /// Empty track with the given frame spacing.
    pub fn new(frame_interval_ms: u64) -> Self {
        Self {
            frame_interval_ms,
            frames: Vec::new(),
        }
    }

    /// Built-in demo: `hands` fingertips sweeping left to right over
    /// `frames` frames, each on its own horizontal line. Hand `h` enters
    /// `h` eighths of the way in, so voices start at different times.
    pub fn horizontal_sweep(frames: usize, hands: usize, frame_interval_ms: u64) -> Self {
        let mut track = Self::new(frame_interval_ms);
        let last = frames.saturating_sub(1).max(1) as f32;
        for i in 0..frames {
            let x = i as f32 / last;
            let points = (0..hands)
                .filter(|h| i * 8 >= h * frames)
                .map(|h| TrackPoint {
                    hand: h,
                    x,
                    y: (h + 1) as f32 / (hands + 1) as f32,
                })
                .collect();
            track.frames.push(TrackFrame { points });
        }
        track
    }

    /// Parse a track from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a track file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let track = Self::from_json(&std::fs::read_to_string(path)?)?;
        tracing::info!(
            path = %path.display(),
            frames = track.frames.len(),
            frame_interval_ms = track.frame_interval_ms,
            "detection track loaded"
        );
        Ok(track)
    }

    /// Write the track to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Spacing between frames.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// Total playback length.
    pub fn duration(&self) -> Duration {
        self.frame_interval() * self.frames.len() as u32
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the track has no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let track = DetectionTrack::from_json(r#"{ "frames": [{}] }"#).unwrap();
        assert_eq!(track.frame_interval_ms, DEFAULT_FRAME_INTERVAL_MS);
        assert_eq!(track.len(), 1);
        assert!(track.frames[0].points.is_empty());
    }

    #[test]
    fn malformed_json_is_a_track_error() {
        let err = DetectionTrack::from_json("{ frames: ").unwrap_err();
        assert!(matches!(err, crate::Error::Track(_)));
    }

    #[test]
    fn sweep_moves_left_to_right() {
        let track = DetectionTrack::horizontal_sweep(5, 1, 20);
        let xs: Vec<f32> = track.frames.iter().map(|f| f.points[0].x).collect();
        assert_eq!(xs, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(track.duration(), Duration::from_millis(100));
    }

    #[test]
    fn sweep_staggers_hand_entry() {
        let track = DetectionTrack::horizontal_sweep(16, 2, 33);
        assert_eq!(track.frames[0].points.len(), 1);
        assert_eq!(track.frames[2].points.len(), 2);
        assert!(track.frames[15].points.iter().all(|p| p.y > 0.0 && p.y < 1.0));
    }

    #[test]
    fn frame_converts_to_tracked_points() {
        let frame = TrackFrame {
            points: vec![TrackPoint {
                hand: 2,
                x: 0.1,
                y: 0.9,
            }],
        };
        let points = frame.tracked_points();
        assert_eq!(points, vec![TrackedPoint::new(2, 0.1, 0.9)]);
        assert_eq!(points[0].voice_id().as_str(), "hand-2-index-tip");
    }
}
