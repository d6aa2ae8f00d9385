//! Optical tracing game: steer a bright light along the circuit from the
//! start pad to the end pad without leaving the track.

use anyhow::{ensure, Result};
use image::RgbImage;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::{run_frame_loop, FrameGame, LaunchContext, Minigame, SessionReport, TickGame};
use crate::config::{ArcadeConfig, SolderTraceConfig};
use crate::course::{CourseMask, PathValidator};
use crate::detection::TrackingPipeline;
use crate::leaderboard::LeaderboardStore;
use crate::models::{Cursor, Point, Resolution};
use crate::pipeline::{CursorPipeline, ExponentialSmoothing, ScreenClamp};
use crate::session::{GameSession, GameState, InputEvent, Outcome, SessionConfig, SessionSignal};

pub struct SolderTrace {
    settings: SolderTraceConfig,
    tracking: TrackingPipeline,
    /// Detection → target → solder tip → screen
    smoothing: CursorPipeline,
    validator: PathValidator,
    session: GameSession,
    /// Mapped detection from the latest tick
    sighted: Option<Point>,
    player: Point,
    fail_ticks_left: u32,
}

impl SolderTrace {
    pub fn new(
        config: &ArcadeConfig,
        camera: Resolution,
        store: Option<Box<dyn LeaderboardStore>>,
    ) -> Result<Self> {
        let settings = config.solder_trace.clone();
        let course = Arc::new(CourseMask::build(&settings.course)?);
        ensure!(
            course.resolution() == config.display,
            "Course resolution {}x{} does not match the display {}x{}",
            course.resolution().width,
            course.resolution().height,
            config.display.width,
            config.display.height
        );

        let start = course.start_zone().center;
        let mut smoothing = CursorPipeline::new()
            .add_stage(Box::new(ExponentialSmoothing::new(settings.target_alpha).holding()))
            .add_stage(Box::new(ExponentialSmoothing::new(settings.follow_alpha)))
            .add_stage(Box::new(ScreenClamp {
                bounds: config.display,
            }));
        smoothing.reset(Some(start));

        let session = GameSession::new(
            SessionConfig {
                calibrate: true,
                record_failures: false,
                ..SessionConfig::default()
            },
            store,
        );

        Ok(Self {
            settings,
            tracking: TrackingPipeline::new(config, camera),
            smoothing,
            validator: PathValidator::new(course),
            session,
            sighted: None,
            player: start,
            fail_ticks_left: 0,
        })
    }

    /// Dump every tick's mask into `output_dir`
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        self.tracking = self.tracking.with_debug(output_dir)?;
        Ok(self)
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn tracking(&self) -> &TrackingPipeline {
        &self.tracking
    }

    pub fn validator(&self) -> &PathValidator {
        &self.validator
    }

    pub fn sighted(&self) -> Option<Point> {
        self.sighted
    }

    /// Solder tip position in game space
    pub fn player(&self) -> Point {
        self.player
    }

    /// Time-decayed score for reaching the end pad now
    pub fn finish_score(&self) -> i64 {
        let penalty =
            (self.session.elapsed().as_secs_f64() * self.settings.penalty_per_second as f64) as i64;
        (self.settings.base_score - penalty).max(self.settings.min_score)
    }

    fn try_begin(&mut self) {
        match self.sighted {
            Some(position) if self.validator.in_start_zone(&position) => {
                self.smoothing.reset(Some(position));
                self.player = position;
                self.session.begin_play();
            }
            Some(position) => debug!(
                x = position.x,
                y = position.y,
                "Light is outside the start zone"
            ),
            None => debug!("No light in view"),
        }
    }

    fn play(&mut self, cursor: Cursor, dt: Duration) -> Result<()> {
        self.session.advance(dt);
        self.player = self.smoothing.run(cursor).position;
        let tip = Point::new(self.player.x.trunc(), self.player.y.trunc());

        if !self.validator.is_on_track(&tip) {
            info!(x = tip.x, y = tip.y, "Solder tip left the track");
            self.session.finish(Outcome::Fail);
            self.fail_ticks_left = self.settings.fail_hold_ticks;
            return Ok(());
        }

        if self.validator.in_end_zone(&tip) {
            self.session.set_score(self.finish_score());
            self.session.finish(Outcome::Win);
            self.session.conclude()?;
        }
        Ok(())
    }

    /// Show the failure for a while, then hand over to the repair task
    fn hold_failure(&mut self) -> Result<SessionSignal> {
        if self.fail_ticks_left > 0 {
            self.fail_ticks_left -= 1;
            return Ok(SessionSignal::Continue);
        }
        self.session.conclude()?;
        info!("Launching repair task");
        Ok(SessionSignal::Quit)
    }

    fn restart(&mut self) {
        self.session.restart();
        self.tracking.reset();
        let start = self.validator.course().start_zone().center;
        self.smoothing.reset(Some(start));
        self.player = start;
        self.sighted = None;
        self.fail_ticks_left = 0;
    }

    fn repair_due(&self) -> bool {
        self.session.outcome() == Some(Outcome::Fail)
            && self.session.state() == GameState::ShowLeaderboard
    }
}

impl TickGame for SolderTrace {
    fn state(&self) -> GameState {
        self.session.state()
    }

    fn handle_input(&mut self, event: &InputEvent) -> Result<SessionSignal> {
        match (self.session.state(), event) {
            (GameState::Calibrate, InputEvent::Confirm) => self.try_begin(),
            (GameState::Calibrate, InputEvent::Sensitivity(delta)) => {
                self.tracking.segmenter.adjust_sensitivity(*delta);
            }
            _ => {
                let signal = self.session.handle_input(event)?;
                if signal != SessionSignal::Restart {
                    return Ok(signal);
                }
                self.restart();
            }
        }
        Ok(SessionSignal::Continue)
    }
}

impl FrameGame for SolderTrace {
    fn tick(&mut self, frame: &RgbImage, dt: Duration) -> Result<SessionSignal> {
        // Only light over the course may steer the tip during play
        let gate = match self.session.state() {
            GameState::Playing => Some(self.validator.course()),
            _ => None,
        };
        let reading = self.tracking.process(frame, gate)?;
        self.sighted = reading.cursor.active.then_some(reading.cursor.position);

        match self.session.state() {
            GameState::Playing => self.play(reading.cursor, dt)?,
            GameState::Failed => return self.hold_failure(),
            GameState::Won => self.session.conclude()?,
            _ => {}
        }
        Ok(SessionSignal::Continue)
    }
}

pub(crate) fn run(ctx: &mut LaunchContext) -> Result<SessionReport> {
    let camera = ctx
        .frames
        .as_ref()
        .map_or(ctx.config.camera, |frames| frames.resolution());
    let mut game = SolderTrace::new(&ctx.config, camera, ctx.leaderboard(Minigame::SolderTrace))?;
    if let Some(dir) = ctx.debug_dir.clone() {
        game = game.with_debug(dir)?;
    }

    let stats = run_frame_loop(&mut game, ctx)?;

    let mut report = SessionReport::new(Minigame::SolderTrace, &game.session, stats);
    if game.repair_due() {
        report.follow_up = Some(Minigame::WireConnect);
    }
    Ok(report)
}
