use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;

use crate::models::{Cursor, Point, Resolution};

/// Index fingertip in the 21-point hand model
pub const INDEX_FINGER_TIP: usize = 8;
/// Thumb tip in the 21-point hand model
pub const THUMB_TIP: usize = 4;
/// Nose in the 33-point pose model
pub const NOSE: usize = 0;
/// Left wrist in the 33-point pose model
pub const LEFT_WRIST: usize = 15;
/// Right wrist in the 33-point pose model
pub const RIGHT_WRIST: usize = 16;

/// Detector output, normalized to 0..1 over the frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Scale into game space, truncating to whole pixels
    pub fn to_screen(&self, screen: Resolution) -> Point {
        Point::new(
            (self.x * screen.width as f32).trunc(),
            (self.y * screen.height as f32).trunc(),
        )
    }
}

/// The two landmarks of one hand the games care about
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hand {
    pub index_tip: Landmark,
    pub thumb_tip: Landmark,
}

impl Hand {
    /// Pick the fingertip and thumb tip out of a full landmark set
    pub fn from_landmarks(landmarks: &[Landmark]) -> Option<Self> {
        Some(Self {
            index_tip: *landmarks.get(INDEX_FINGER_TIP)?,
            thumb_tip: *landmarks.get(THUMB_TIP)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureReading {
    pub cursor: Point,
    pub pinching: bool,
    pub distance: f32,
}

impl From<GestureReading> for Cursor {
    fn from(reading: GestureReading) -> Self {
        Cursor {
            position: reading.cursor,
            active: reading.pinching,
        }
    }
}

/// Reduces a hand to a cursor at the fingertip/thumb midpoint and a pinch flag
#[derive(Debug, Clone)]
pub struct GestureCursor {
    pub screen: Resolution,
    pub pinch_threshold: f32,
}

impl GestureCursor {
    pub fn new(screen: Resolution, pinch_threshold: f32) -> Self {
        Self {
            screen,
            pinch_threshold,
        }
    }

    pub fn read(&self, hand: &Hand) -> GestureReading {
        let tip = hand.index_tip.to_screen(self.screen);
        let thumb = hand.thumb_tip.to_screen(self.screen);
        let distance = tip.distance(&thumb);
        GestureReading {
            cursor: tip.midpoint(&thumb),
            pinching: distance < self.pinch_threshold,
            distance,
        }
    }

    /// Reading for the first detected hand, if any
    pub fn read_first(&self, hands: &[Hand]) -> Option<GestureReading> {
        hands.first().map(|hand| self.read(hand))
    }
}

/// The external hand-landmark detector, one poll per tick.
/// `Ok(None)` ends the stream; an empty vector means no hand this tick.
pub trait LandmarkSource {
    fn next_hands(&mut self) -> Result<Option<Vec<Hand>>>;
}

fn load_recording<T: DeserializeOwned>(path: &Path, kind: &str) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} recording {}", kind, path.display()))?;
    serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse {} recording {}", kind, path.display()))
}

/// Per-tick hands recorded to YAML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LandmarkRecording {
    pub ticks: VecDeque<Vec<Hand>>,
}

impl LandmarkRecording {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        load_recording(path.as_ref(), "landmark")
    }
}

impl LandmarkSource for LandmarkRecording {
    fn next_hands(&mut self) -> Result<Option<Vec<Hand>>> {
        Ok(self.ticks.pop_front())
    }
}

/// The upper-body joints the pose games collide against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub nose: Landmark,
    pub left_wrist: Landmark,
    pub right_wrist: Landmark,
}

impl Pose {
    /// Pick the nose and both wrists out of a full pose landmark set
    pub fn from_landmarks(landmarks: &[Landmark]) -> Option<Self> {
        Some(Self {
            nose: *landmarks.get(NOSE)?,
            left_wrist: *landmarks.get(LEFT_WRIST)?,
            right_wrist: *landmarks.get(RIGHT_WRIST)?,
        })
    }
}

/// The external pose detector, one poll per tick.
/// `Ok(None)` ends the stream; an empty vector means nobody in frame.
pub trait PoseSource {
    fn next_poses(&mut self) -> Result<Option<Vec<Pose>>>;
}

/// Per-tick poses recorded to YAML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoseRecording {
    pub ticks: VecDeque<Vec<Pose>>,
}

impl PoseRecording {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        load_recording(path.as_ref(), "pose")
    }
}

impl PoseSource for PoseRecording {
    fn next_poses(&mut self) -> Result<Option<Vec<Pose>>> {
        Ok(self.ticks.pop_front())
    }
}
