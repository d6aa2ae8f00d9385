//! Single-target pointer tracking.
//!
//! The tracker turns each tick's unordered blob set into one persistent position.
//! While searching it locks onto the largest blob. Once locked it only follows the
//! blob nearest to the last position, and only when that blob is strictly within
//! the search radius; otherwise the position freezes. A second bright object
//! entering the frame therefore never steals the lock.

use tracing::{debug, info};

use crate::config::TrackerConfig;
use crate::models::{Blob, Point, Resolution};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackPhase {
    Searching,
    Locked,
}

/// The only state the vision pipeline carries between frames
#[derive(Debug, Clone, PartialEq)]
pub struct TrackState {
    pub phase: TrackPhase,
    pub last_position: Point,
    pub search_radius: f32,
}

impl TrackState {
    pub fn is_locked(&self) -> bool {
        self.phase == TrackPhase::Locked
    }
}

/// Result of one tracker tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackUpdate {
    /// A usable blob was selected this tick
    pub found: bool,
    /// Position after the tick; unchanged when nothing was found
    pub position: Point,
}

pub struct PointerTracker {
    state: TrackState,
    home: Point,
    sticky_lock: bool,
}

impl PointerTracker {
    /// Start searching, with the last position parked at the frame centre
    pub fn new(frame: Resolution, config: &TrackerConfig) -> Self {
        let home = frame.center();
        Self {
            state: TrackState {
                phase: TrackPhase::Searching,
                last_position: home,
                search_radius: config.search_radius,
            },
            home,
            sticky_lock: config.sticky_lock,
        }
    }

    pub fn state(&self) -> &TrackState {
        &self.state
    }

    pub fn sticky_lock(&self) -> bool {
        self.sticky_lock
    }

    /// Drop the lock. Only a game restart calls this; recalibrating the
    /// segmenter keeps the current lock.
    pub fn reset(&mut self) {
        self.state.phase = TrackPhase::Searching;
        self.state.last_position = self.home;
        debug!("Tracker reset");
    }

    pub fn update(&mut self, blobs: &[Blob]) -> TrackUpdate {
        let selected = match self.state.phase {
            TrackPhase::Searching => largest(blobs),
            TrackPhase::Locked => {
                nearest_within(blobs, &self.state.last_position, self.state.search_radius)
            }
        };

        match selected {
            Some(blob) => {
                if self.state.phase == TrackPhase::Searching {
                    info!(
                        x = blob.centroid.x,
                        y = blob.centroid.y,
                        area = blob.area,
                        "Tracker locked"
                    );
                }
                self.state.phase = TrackPhase::Locked;
                self.state.last_position = blob.centroid;
                TrackUpdate {
                    found: true,
                    position: blob.centroid,
                }
            }
            None => {
                if self.state.phase == TrackPhase::Locked && !self.sticky_lock {
                    info!("Tracker lost target, searching again");
                    self.state.phase = TrackPhase::Searching;
                }
                TrackUpdate {
                    found: false,
                    position: self.state.last_position,
                }
            }
        }
    }
}

/// Largest blob; the first one wins a tie
fn largest(blobs: &[Blob]) -> Option<&Blob> {
    let mut best: Option<&Blob> = None;
    for blob in blobs {
        if best.is_none_or(|b| blob.area > b.area) {
            best = Some(blob);
        }
    }
    best
}

/// Blob closest to `anchor`, provided it lies strictly inside `radius`
fn nearest_within<'a>(blobs: &'a [Blob], anchor: &Point, radius: f32) -> Option<&'a Blob> {
    let mut best: Option<&Blob> = None;
    let mut best_dist = radius;
    for blob in blobs {
        let dist = blob.centroid.distance(anchor);
        if dist < best_dist {
            best_dist = dist;
            best = Some(blob);
        }
    }
    best
}
