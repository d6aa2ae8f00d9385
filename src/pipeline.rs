use anyhow::Result;
use image::GrayImage;
use std::path::PathBuf;
use tracing::debug;

use crate::models::{Cursor, Point, Resolution};

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
    /// Whether debug mode is enabled
    pub enabled: bool,
}

impl DebugConfig {
    /// Use `output_dir` for debug images. The directory must be empty or non-existent.
    pub fn new(output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        Ok(Self {
            output_dir,
            enabled: true,
        })
    }

    /// Save one tick's mask as `NNNNN_mask.png`
    pub fn save_mask(&self, tick: u64, mask: &GrayImage) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let path = self.output_dir.join(format!("{:05}_mask.png", tick));
        mask.save(&path)
            .map_err(|e| anyhow::anyhow!("Failed to save debug mask: {}", e))?;
        debug!(path = %path.display(), "Saved debug mask");
        Ok(())
    }
}

/// Context available to all cursor stages
#[derive(Clone, Debug, Default)]
pub struct PipelineContext {
    pub tick: u64,
}

/// One composable transformation of the per-tick cursor
pub trait CursorStage: Send {
    fn process(&mut self, cursor: Cursor, context: &PipelineContext) -> Cursor;

    /// Forget history; `anchor` seeds the stage when given
    fn reset(&mut self, anchor: Option<Point>);

    /// Human-readable name for this stage (used in log output)
    fn name(&self) -> &str;
}

/// Exponential smoothing: `current = lerp(current, target, alpha)`.
///
/// While the input is inactive the stage keeps easing towards the last
/// active target, so a follower keeps moving through brief dropouts. A
/// holding stage freezes instead and only moves on active input.
pub struct ExponentialSmoothing {
    pub alpha: f32,
    pub hold_on_dropout: bool,
    target: Option<Point>,
    current: Option<Point>,
}

impl ExponentialSmoothing {
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            hold_on_dropout: false,
            target: None,
            current: None,
        }
    }

    /// Freeze on inactive input instead of easing on
    pub fn holding(mut self) -> Self {
        self.hold_on_dropout = true;
        self
    }
}

impl CursorStage for ExponentialSmoothing {
    fn process(&mut self, cursor: Cursor, _context: &PipelineContext) -> Cursor {
        if cursor.active {
            self.target = Some(cursor.position);
        } else if self.hold_on_dropout {
            return Cursor {
                position: self.current.unwrap_or(cursor.position),
                active: false,
            };
        }
        let Some(target) = self.target else {
            return cursor;
        };
        let next = match self.current {
            Some(current) => current.lerp(&target, self.alpha),
            None => target,
        };
        self.current = Some(next);
        Cursor {
            position: next,
            active: cursor.active,
        }
    }

    fn reset(&mut self, anchor: Option<Point>) {
        self.target = anchor;
        self.current = anchor;
    }

    fn name(&self) -> &str {
        "Exponential Smoothing"
    }
}

/// Keep the cursor inside the display
pub struct ScreenClamp {
    pub bounds: Resolution,
}

impl CursorStage for ScreenClamp {
    fn process(&mut self, cursor: Cursor, _context: &PipelineContext) -> Cursor {
        let max_x = self.bounds.width.saturating_sub(1) as f32;
        let max_y = self.bounds.height.saturating_sub(1) as f32;
        Cursor {
            position: Point::new(
                cursor.position.x.clamp(0.0, max_x),
                cursor.position.y.clamp(0.0, max_y),
            ),
            active: cursor.active,
        }
    }

    fn reset(&mut self, _anchor: Option<Point>) {}

    fn name(&self) -> &str {
        "Screen Clamp"
    }
}

/// Composable cursor pipeline builder
pub struct CursorPipeline {
    stages: Vec<Box<dyn CursorStage>>,
    context: PipelineContext,
}

impl CursorPipeline {
    /// Create a new empty pipeline
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            context: PipelineContext::default(),
        }
    }

    /// Add a processing stage to the pipeline
    pub fn add_stage(mut self, stage: Box<dyn CursorStage>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage in order on this tick's cursor
    pub fn run(&mut self, cursor: Cursor) -> Cursor {
        let mut cursor = cursor;
        for stage in self.stages.iter_mut() {
            cursor = stage.process(cursor, &self.context);
        }
        self.context.tick += 1;
        cursor
    }

    pub fn reset(&mut self, anchor: Option<Point>) {
        for stage in self.stages.iter_mut() {
            stage.reset(anchor);
        }
    }
}

impl Default for CursorPipeline {
    fn default() -> Self {
        Self::new()
    }
}
