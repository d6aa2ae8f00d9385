#![allow(dead_code)]

use anyhow::Result;
use arcade_tracker::gesture::{Landmark, Pose};
use arcade_tracker::{
    AutoPilot, Blob, FrameSource, GameState, Hand, InputEvent, InputSource, Point, Resolution,
};
use image::{Rgb, RgbImage};
use std::collections::VecDeque;

pub const DARK: Rgb<u8> = Rgb([10, 10, 10]);
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Dark frame with a white square of side `size` centred on each spot
pub fn frame_with_spots(resolution: Resolution, spots: &[(u32, u32)], size: u32) -> RgbImage {
    let half = size / 2;
    RgbImage::from_fn(resolution.width, resolution.height, |x, y| {
        let lit = spots.iter().any(|&(cx, cy)| {
            x + half >= cx && x < cx + half && y + half >= cy && y < cy + half
        });
        if lit { WHITE } else { DARK }
    })
}

pub fn make_blob(label: u32, x: f32, y: f32, area: u32) -> Blob {
    Blob {
        label,
        centroid: Point::new(x, y),
        area,
    }
}

/// Renders one spot per read; `None` is a frame with nothing lit.
/// Reads listed in `failures` return an error instead of a frame.
pub struct SyntheticCamera {
    pub resolution: Resolution,
    pub spot_size: u32,
    spots: VecDeque<Option<(u32, u32)>>,
    failures: Vec<usize>,
    reads: usize,
}

impl SyntheticCamera {
    pub fn new(resolution: Resolution, spots: Vec<Option<(u32, u32)>>) -> Self {
        Self {
            resolution,
            spot_size: 12,
            spots: spots.into(),
            failures: Vec::new(),
            reads: 0,
        }
    }

    pub fn failing_on(mut self, reads: &[usize]) -> Self {
        self.failures = reads.to_vec();
        self
    }

    /// `frames` copies of the same spot
    pub fn hold(spot: (u32, u32), frames: usize) -> Vec<Option<(u32, u32)>> {
        vec![Some(spot); frames]
    }

    /// Spot moving from `from` to `to` in steps of at most `step` pixels along x
    pub fn sweep_x(from: (u32, u32), to_x: u32, step: u32) -> Vec<Option<(u32, u32)>> {
        let mut spots = Vec::new();
        let mut x = from.0;
        while x < to_x {
            x = (x + step).min(to_x);
            spots.push(Some((x, from.1)));
        }
        spots
    }
}

impl FrameSource for SyntheticCamera {
    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn read_frame(&mut self) -> Result<Option<RgbImage>> {
        let read = self.reads;
        self.reads += 1;
        if self.failures.contains(&read) {
            return Err(anyhow::anyhow!("Synthetic read failure on read {}", read));
        }
        Ok(self.spots.pop_front().map(|spot| {
            let spots: Vec<(u32, u32)> = spot.into_iter().collect();
            frame_with_spots(self.resolution, &spots, self.spot_size)
        }))
    }
}

/// Plays back scripted events first, then behaves like `AutoPilot`
pub struct ScriptedInput {
    script: VecDeque<Vec<InputEvent>>,
    fallback: AutoPilot,
}

impl ScriptedInput {
    pub fn new(script: Vec<Vec<InputEvent>>, name: &str) -> Self {
        Self {
            script: script.into(),
            fallback: AutoPilot::new(name),
        }
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self, state: GameState) -> Vec<InputEvent> {
        match self.script.pop_front() {
            Some(events) => events,
            None => self.fallback.poll(state),
        }
    }
}

/// A hand whose fingertip and thumb straddle `at` vertically, `gap` pixels apart
pub fn hand_with_gap(screen: Resolution, at: Point, gap: f32) -> Hand {
    let w = screen.width as f32;
    let h = screen.height as f32;
    Hand {
        index_tip: Landmark::new(at.x / w, (at.y - gap / 2.0) / h),
        thumb_tip: Landmark::new(at.x / w, (at.y + gap / 2.0) / h),
    }
}

pub fn pinching_at(screen: Resolution, at: Point) -> Vec<Hand> {
    vec![hand_with_gap(screen, at, 10.0)]
}

pub fn open_at(screen: Resolution, at: Point) -> Vec<Hand> {
    vec![hand_with_gap(screen, at, 100.0)]
}

fn normalized(screen: Resolution, at: Point) -> Landmark {
    Landmark::new(at.x / screen.width as f32, at.y / screen.height as f32)
}

/// A pose with the head and both wrists at the given game-space points
pub fn pose_at(screen: Resolution, nose: Point, left: Point, right: Point) -> Vec<Pose> {
    vec![Pose {
        nose: normalized(screen, nose),
        left_wrist: normalized(screen, left),
        right_wrist: normalized(screen, right),
    }]
}

pub fn assert_near(actual: Point, expected: Point, tolerance: f32) {
    assert!(
        actual.distance(&expected) <= tolerance,
        "expected {:?} within {} of {:?}",
        actual,
        tolerance,
        expected
    );
}
