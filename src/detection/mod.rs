pub mod blobs;
pub mod mapping;
pub mod segmentation;
pub mod tracker;

use anyhow::Result;
use image::RgbImage;
use std::path::PathBuf;
use tracing::debug;

use crate::config::ArcadeConfig;
use crate::course::CourseMask;
use crate::models::{Blob, Cursor, Point, Resolution};
use crate::pipeline::DebugConfig;

pub use blobs::BlobExtractor;
pub use mapping::CoordinateMapper;
pub use segmentation::{ColorBand, Hsv, Mask, Segmenter};
pub use tracker::{PointerTracker, TrackPhase, TrackState, TrackUpdate};

/// Everything the optical pipeline learned from one frame
#[derive(Debug, Clone)]
pub struct TrackingTick {
    pub blobs: Vec<Blob>,
    pub update: TrackUpdate,
    /// Tracked position in game space; inactive when nothing was found this tick
    pub cursor: Cursor,
}

/// Frame → Segmenter → BlobExtractor → PointerTracker → CoordinateMapper
pub struct TrackingPipeline {
    pub segmenter: Segmenter,
    pub extractor: BlobExtractor,
    pub tracker: PointerTracker,
    pub mapper: CoordinateMapper,
    debug: Option<DebugConfig>,
    tick: u64,
}

impl TrackingPipeline {
    pub fn new(config: &ArcadeConfig, camera: Resolution) -> Self {
        Self {
            segmenter: Segmenter::new(&config.segmentation),
            extractor: BlobExtractor::new(config.blobs.min_area),
            tracker: PointerTracker::new(camera, &config.tracker),
            mapper: CoordinateMapper::new(camera, config.display),
            debug: None,
            tick: 0,
        }
    }

    /// Save every tick's mask into `output_dir` (must be empty or non-existent)
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        self.debug = Some(DebugConfig::new(output_dir)?);
        Ok(self)
    }

    /// Segment and extract without touching tracker state
    pub fn detect(&self, frame: &RgbImage, gate: Option<&CourseMask>) -> (Mask, Vec<Blob>) {
        let mut mask = self.segmenter.segment(frame);
        if let Some(course) = gate {
            mask = course.gate(&mask);
        }
        let blobs = self.extractor.extract(&mask);
        (mask, blobs)
    }

    /// Run one frame through the whole pipeline.
    /// `gate` restricts detections to light seen over the course.
    pub fn process(&mut self, frame: &RgbImage, gate: Option<&CourseMask>) -> Result<TrackingTick> {
        let (mask, blobs) = self.detect(frame, gate);

        if let Some(debug_config) = &self.debug {
            debug_config.save_mask(self.tick, &mask)?;
        }
        self.tick += 1;

        let update = self.tracker.update(&blobs);
        let position = self.mapper.map(&update.position);
        debug!(
            blobs = blobs.len(),
            found = update.found,
            x = position.x,
            y = position.y,
            "Tracking tick"
        );

        Ok(TrackingTick {
            blobs,
            update,
            cursor: Cursor {
                position,
                active: update.found,
            },
        })
    }

    /// Last tracked position in game space
    pub fn last_screen_position(&self) -> Point {
        self.mapper.map(&self.tracker.state().last_position)
    }

    pub fn reset(&mut self) {
        self.tracker.reset();
    }
}
