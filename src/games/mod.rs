pub mod it_defender;
pub mod robo_factory;
pub mod solder_trace;
pub mod wire_connect;

use anyhow::{Context, Result};
use image::RgbImage;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::capture::{CaptureThread, FrameSource};
use crate::config::ArcadeConfig;
use crate::gesture::{Hand, LandmarkSource, Pose, PoseSource};
use crate::input::InputSource;
use crate::leaderboard::{CsvLeaderboard, LeaderboardEntry, LeaderboardStore};
use crate::session::{GameSession, GameState, InputEvent, Outcome, SessionSignal};

pub use it_defender::ItDefender;
pub use robo_factory::RoboFactory;
pub use solder_trace::SolderTrace;
pub use wire_connect::WireConnect;

/// Every collaborator a minigame may need for one launch
pub struct LaunchContext {
    pub config: ArcadeConfig,
    /// Camera frames, for optically tracked games
    pub frames: Option<Box<dyn FrameSource + Send>>,
    /// Hand detector output, for landmark-driven games
    pub landmarks: Option<Box<dyn LandmarkSource>>,
    /// Pose detector output, for body-driven games
    pub poses: Option<Box<dyn PoseSource>>,
    pub input: Box<dyn InputSource>,
    /// Where the per-game leaderboard tables live; None disables them
    pub scores_dir: Option<PathBuf>,
    /// Where to dump per-tick masks
    pub debug_dir: Option<PathBuf>,
}

impl LaunchContext {
    pub fn leaderboard(&self, game: Minigame) -> Option<Box<dyn LeaderboardStore>> {
        self.scores_dir.as_ref().map(|dir| {
            Box::new(CsvLeaderboard::for_game(dir, game.namespace())) as Box<dyn LeaderboardStore>
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Minigame {
    /// Trace a circuit with a flashlight
    SolderTrace,
    /// Pinch-drag wires to their matching connectors
    WireConnect,
    /// Build robots from conveyor parts against the clock
    RoboFactory,
    /// Catch falling patches and dodge errors with your whole body
    ItDefender,
}

/// Which detector feeds a game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameInput {
    Camera,
    Hands,
    Pose,
}

impl Minigame {
    /// Leaderboard namespace
    pub fn namespace(&self) -> &'static str {
        match self {
            Minigame::SolderTrace => "solder_trace",
            Minigame::WireConnect => "wire_connect",
            Minigame::RoboFactory => "robo_factory",
            Minigame::ItDefender => "it_defender",
        }
    }

    pub fn input(&self) -> GameInput {
        match self {
            Minigame::SolderTrace => GameInput::Camera,
            Minigame::WireConnect | Minigame::RoboFactory => GameInput::Hands,
            Minigame::ItDefender => GameInput::Pose,
        }
    }

    /// Run the game until it quits or its inputs run dry, then hand control back
    pub fn launch(self, ctx: &mut LaunchContext) -> Result<SessionReport> {
        info!(game = self.namespace(), "Launching minigame");
        match self {
            Minigame::SolderTrace => solder_trace::run(ctx),
            Minigame::WireConnect => wire_connect::run(ctx),
            Minigame::RoboFactory => robo_factory::run(ctx),
            Minigame::ItDefender => it_defender::run(ctx),
        }
    }
}

/// What a finished launch hands back to its caller
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub game: Minigame,
    pub state: GameState,
    pub outcome: Option<Outcome>,
    pub score: i64,
    pub ticks: u64,
    pub skipped_ticks: u64,
    pub table: Vec<LeaderboardEntry>,
    /// Game the caller should launch next, if any
    pub follow_up: Option<Minigame>,
}

impl SessionReport {
    pub(crate) fn new(game: Minigame, session: &GameSession, stats: LoopStats) -> Self {
        Self {
            game,
            state: session.state(),
            outcome: session.outcome(),
            score: session.score(),
            ticks: stats.ticks,
            skipped_ticks: stats.skipped,
            table: session.table().to_vec(),
            follow_up: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct LoopStats {
    pub ticks: u64,
    pub skipped: u64,
}

/// Fixed-step clock; optionally sleeps to hold the step in wall-clock time
pub(crate) struct Pacer {
    step: Duration,
    realtime: bool,
    next: Instant,
}

impl Pacer {
    pub fn new(config: &ArcadeConfig) -> Self {
        Self {
            step: config.tick_step(),
            realtime: config.pace_ticks,
            next: Instant::now(),
        }
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    pub fn wait(&mut self) {
        if !self.realtime {
            return;
        }
        self.next += self.step;
        let now = Instant::now();
        if self.next > now {
            std::thread::sleep(self.next - now);
        } else {
            self.next = now;
        }
    }
}

/// The part of a game the tick loop talks to between updates
pub trait TickGame {
    fn state(&self) -> GameState;
    fn handle_input(&mut self, event: &InputEvent) -> Result<SessionSignal>;
}

/// A game fed by camera frames
pub trait FrameGame: TickGame {
    fn tick(&mut self, frame: &RgbImage, dt: Duration) -> Result<SessionSignal>;
}

/// A game fed by hand landmarks
pub trait LandmarkGame: TickGame {
    fn tick(&mut self, hands: &[Hand], dt: Duration) -> Result<SessionSignal>;
}

/// A game fed by body poses
pub trait PoseGame: TickGame {
    fn tick(&mut self, poses: &[Pose], dt: Duration) -> Result<SessionSignal>;
}

/// Drain input without blocking; true when the game asked to quit
fn drain_input(input: &mut dyn InputSource, game: &mut dyn TickGame) -> Result<bool> {
    for event in input.poll(game.state()) {
        if game.handle_input(&event)? == SessionSignal::Quit {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Tick loop for camera-driven games: input → frame → update → pace
pub(crate) fn run_frame_loop<G: FrameGame>(game: &mut G, ctx: &mut LaunchContext) -> Result<LoopStats> {
    let frames = ctx
        .frames
        .take()
        .ok_or_else(|| anyhow::anyhow!("This game needs a camera frame source"))?;

    let _capture: Option<CaptureThread>;
    let mut source: Box<dyn FrameSource> = if ctx.config.threaded_capture {
        let (capture, latest) = CaptureThread::spawn(frames);
        _capture = Some(capture);
        Box::new(latest)
    } else {
        _capture = None;
        frames
    };

    // The first acquisition doubles as the device check
    let mut pending = Some(
        source
            .read_frame()
            .context("Camera unavailable at startup")?
            .ok_or_else(|| anyhow::anyhow!("Camera produced no frames"))?,
    );

    let mut pacer = Pacer::new(&ctx.config);
    let mut stats = LoopStats::default();

    loop {
        if drain_input(ctx.input.as_mut(), game)? {
            break;
        }

        let frame = match pending.take() {
            Some(frame) => frame,
            None => match source.read_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => {
                    warn!("Skipping tick, frame read failed: {:#}", e);
                    stats.skipped += 1;
                    pacer.wait();
                    continue;
                }
            },
        };

        stats.ticks += 1;
        if game.tick(&frame, pacer.step())? == SessionSignal::Quit {
            break;
        }
        pacer.wait();
    }

    Ok(stats)
}

/// Tick loop for landmark-driven games
pub(crate) fn run_landmark_loop<G: LandmarkGame>(
    game: &mut G,
    ctx: &mut LaunchContext,
) -> Result<LoopStats> {
    let mut source = ctx
        .landmarks
        .take()
        .ok_or_else(|| anyhow::anyhow!("This game needs a hand landmark source"))?;
    run_detector_loop(game, ctx, || source.next_hands(), |game, hands, dt| {
        LandmarkGame::tick(game, hands, dt)
    })
}

/// Tick loop for pose-driven games
pub(crate) fn run_pose_loop<G: PoseGame>(game: &mut G, ctx: &mut LaunchContext) -> Result<LoopStats> {
    let mut source = ctx
        .poses
        .take()
        .ok_or_else(|| anyhow::anyhow!("This game needs a pose source"))?;
    run_detector_loop(game, ctx, || source.next_poses(), |game, poses, dt| {
        PoseGame::tick(game, poses, dt)
    })
}

/// Input → detections → update → pace, until the detector runs dry or the game quits
fn run_detector_loop<G, T, N, U>(
    game: &mut G,
    ctx: &mut LaunchContext,
    mut next: N,
    mut update: U,
) -> Result<LoopStats>
where
    G: TickGame,
    N: FnMut() -> Result<Option<Vec<T>>>,
    U: FnMut(&mut G, &[T], Duration) -> Result<SessionSignal>,
{
    let mut pacer = Pacer::new(&ctx.config);
    let mut stats = LoopStats::default();

    loop {
        if drain_input(ctx.input.as_mut(), game)? {
            break;
        }

        let detections = match next() {
            Ok(Some(detections)) => detections,
            Ok(None) => break,
            Err(e) => {
                warn!("Skipping tick, detector read failed: {:#}", e);
                stats.skipped += 1;
                pacer.wait();
                continue;
            }
        };

        stats.ticks += 1;
        if update(game, &detections, pacer.step())? == SessionSignal::Quit {
            break;
        }
        pacer.wait();
    }

    Ok(stats)
}
