//! Body-driven defence game: catch falling patches with either wrist, keep
//! errors away from your head and punch bosses apart before they land.
//! Health runs out eventually; the score goes to the leaderboard.

use anyhow::Result;
use std::time::Duration;
use tracing::{debug, info};

use super::{run_pose_loop, LaunchContext, Minigame, PoseGame, SessionReport, TickGame};
use crate::config::{ArcadeConfig, ItDefenderConfig};
use crate::gesture::Pose;
use crate::leaderboard::LeaderboardStore;
use crate::models::{Cursor, Point, Resolution};
use crate::pipeline::{CursorPipeline, ExponentialSmoothing};
use crate::session::{GameSession, GameState, InputEvent, SessionConfig, SessionSignal};

const ITEM_SIZE: f32 = 30.0;
const BOSS_SIZE: f32 = 50.0;
const BOSS_HP: u32 = 5;
/// Added to an item's size to get its hit radius
const HIT_MARGIN: f32 = 25.0;
const SPAWN_Y: f32 = -50.0;
const EDGE_MARGIN: f32 = 60.0;
/// Score needed to add 1.0 to the difficulty
const SCORE_PER_DIFFICULTY: f32 = 500.0;
/// Score needed to take one tick off the spawn interval
const SCORE_PER_SPAWN_TICK: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// Catch with a wrist
    Patch,
    /// Hurts when it reaches the head
    Error,
    /// Takes one hit per wrist entry; hurts when it lands or reaches the head
    Boss,
}

/// Spawn order: four errors, five patches and a boss in every ten
const KIND_CYCLE: [ItemKind; 10] = [
    ItemKind::Patch,
    ItemKind::Error,
    ItemKind::Patch,
    ItemKind::Error,
    ItemKind::Patch,
    ItemKind::Patch,
    ItemKind::Error,
    ItemKind::Patch,
    ItemKind::Error,
    ItemKind::Boss,
];

#[derive(Debug, Clone, PartialEq)]
pub struct FallingItem {
    pub kind: ItemKind,
    pub position: Point,
    /// Pixels per tick
    pub speed: f32,
    pub size: f32,
    pub hp: u32,
    in_left: bool,
    in_right: bool,
}

impl FallingItem {
    fn new(kind: ItemKind, position: Point, speed: f32) -> Self {
        let (size, hp, speed) = match kind {
            ItemKind::Boss => (BOSS_SIZE, BOSS_HP, speed * 0.5),
            _ => (ITEM_SIZE, 1, speed),
        };
        Self {
            kind,
            position,
            speed,
            size,
            hp,
            in_left: false,
            in_right: false,
        }
    }

    pub fn hit_radius(&self) -> f32 {
        self.size + HIT_MARGIN
    }

    fn reaches(&self, joint: Point) -> bool {
        self.position.distance(&joint) < self.hit_radius()
    }
}

/// Smoothed joints in game space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub nose: Point,
    pub left_hand: Point,
    pub right_hand: Point,
}

impl Body {
    /// Standing in the middle of the screen, hands low
    fn resting(screen: Resolution) -> Self {
        let center = screen.center();
        Self {
            nose: center,
            left_hand: Point::new(center.x - 50.0, center.y + 50.0),
            right_hand: Point::new(center.x + 50.0, center.y + 50.0),
        }
    }
}

/// Fall speed multiplier at `score`
pub fn difficulty(score: i64) -> f32 {
    1.0 + score as f32 / SCORE_PER_DIFFICULTY
}

/// Ticks between spawns at `score`
pub fn spawn_interval(settings: &ItDefenderConfig, score: i64) -> u32 {
    let shortened = settings.spawn_interval as i64 - score / SCORE_PER_SPAWN_TICK;
    shortened.max(settings.min_spawn_interval as i64) as u32
}

fn smoother(alpha: f32, anchor: Point) -> CursorPipeline {
    let mut pipeline = CursorPipeline::new().add_stage(Box::new(ExponentialSmoothing::new(alpha)));
    pipeline.reset(Some(anchor));
    pipeline
}

pub struct ItDefender {
    settings: ItDefenderConfig,
    screen: Resolution,
    session: GameSession,
    nose: CursorPipeline,
    left_hand: CursorPipeline,
    right_hand: CursorPipeline,
    body: Body,
    items: Vec<FallingItem>,
    spawn_timer: u32,
    spawned: u64,
    combo: u32,
    max_combo: u32,
}

impl ItDefender {
    pub fn new(config: &ArcadeConfig, store: Option<Box<dyn LeaderboardStore>>) -> Self {
        let settings = config.it_defender.clone();
        let body = Body::resting(config.display);
        let session = GameSession::new(
            SessionConfig {
                starting_health: Some(settings.starting_health),
                ..SessionConfig::default()
            },
            store,
        );
        Self {
            nose: smoother(settings.smoothing, body.nose),
            left_hand: smoother(settings.smoothing, body.left_hand),
            right_hand: smoother(settings.smoothing, body.right_hand),
            screen: config.display,
            settings,
            session,
            body,
            items: Vec::new(),
            spawn_timer: 0,
            spawned: 0,
            combo: 0,
            max_combo: 0,
        }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn body(&self) -> Body {
        self.body
    }

    pub fn items(&self) -> &[FallingItem] {
        &self.items
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn max_combo(&self) -> u32 {
        self.max_combo
    }

    /// Drop an item at `position`, falling at the current difficulty
    pub fn place_item(&mut self, kind: ItemKind, position: Point) {
        let speed = self.settings.fall_speed * difficulty(self.session.score());
        self.items.push(FallingItem::new(kind, position, speed));
    }

    fn track(&mut self, pose: &Pose) {
        self.body = Body {
            nose: self.nose.run(Cursor::active(pose.nose.to_screen(self.screen))).position,
            left_hand: self
                .left_hand
                .run(Cursor::active(pose.left_wrist.to_screen(self.screen)))
                .position,
            right_hand: self
                .right_hand
                .run(Cursor::active(pose.right_wrist.to_screen(self.screen)))
                .position,
        };
    }

    fn spawn(&mut self) {
        self.spawn_timer += 1;
        if self.spawn_timer <= spawn_interval(&self.settings, self.session.score()) {
            return;
        }
        self.spawn_timer = 0;

        let kind = KIND_CYCLE[(self.spawned % KIND_CYCLE.len() as u64) as usize];
        // Golden-ratio stepping spreads drop columns evenly across the screen
        let column = (self.spawned as f64 * 0.618_034).fract() as f32;
        let span = (self.screen.width as f32 - 2.0 * EDGE_MARGIN).max(0.0);
        self.spawned += 1;
        self.place_item(kind, Point::new(EDGE_MARGIN + column * span, SPAWN_Y));
    }

    fn break_combo(&mut self) {
        self.combo = 0;
    }

    /// Move one item and apply its collisions; None once it is gone
    fn resolve(&mut self, mut item: FallingItem) -> Option<FallingItem> {
        item.position.y += item.speed;
        let body = self.body;

        if item.position.y > self.screen.height as f32 {
            match item.kind {
                ItemKind::Patch => self.break_combo(),
                ItemKind::Boss => {
                    info!("Boss landed");
                    self.session.damage(self.settings.boss_damage);
                    self.break_combo();
                }
                ItemKind::Error => {}
            }
            return None;
        }

        match item.kind {
            ItemKind::Patch => {
                if item.reaches(body.left_hand) || item.reaches(body.right_hand) {
                    self.session
                        .add_score(self.settings.patch_points + self.combo as i64);
                    self.combo += 1;
                    self.max_combo = self.max_combo.max(self.combo);
                    return None;
                }
            }
            ItemKind::Error => {
                if item.reaches(body.nose) {
                    debug!(health = ?self.session.health(), "Error hit the head");
                    self.session.damage(self.settings.error_damage);
                    self.break_combo();
                    return None;
                }
            }
            ItemKind::Boss => {
                // A wrist scores one hit each time it enters the boss
                let in_left = item.reaches(body.left_hand);
                let in_right = item.reaches(body.right_hand);
                let hits = (in_left && !item.in_left) as u32 + (in_right && !item.in_right) as u32;
                item.in_left = in_left;
                item.in_right = in_right;
                item.hp = item.hp.saturating_sub(hits);

                if item.hp == 0 {
                    info!("Boss defeated");
                    self.session.add_score(self.settings.boss_points);
                    return None;
                }
                if item.reaches(body.nose) {
                    self.session.damage(self.settings.boss_damage);
                    self.break_combo();
                    return None;
                }
            }
        }
        Some(item)
    }

    fn update_items(&mut self) {
        let snapshot = std::mem::take(&mut self.items);
        let kept: Vec<FallingItem> = snapshot
            .into_iter()
            .filter_map(|item| self.resolve(item))
            .collect();
        self.items = kept;
    }

    fn restart(&mut self) {
        self.session.restart();
        self.body = Body::resting(self.screen);
        self.nose.reset(Some(self.body.nose));
        self.left_hand.reset(Some(self.body.left_hand));
        self.right_hand.reset(Some(self.body.right_hand));
        self.items.clear();
        self.spawn_timer = 0;
        self.spawned = 0;
        self.combo = 0;
        self.max_combo = 0;
    }
}

impl TickGame for ItDefender {
    fn state(&self) -> GameState {
        self.session.state()
    }

    fn handle_input(&mut self, event: &InputEvent) -> Result<SessionSignal> {
        let signal = self.session.handle_input(event)?;
        if signal == SessionSignal::Restart {
            self.restart();
            return Ok(SessionSignal::Continue);
        }
        Ok(signal)
    }
}

impl PoseGame for ItDefender {
    fn tick(&mut self, poses: &[Pose], dt: Duration) -> Result<SessionSignal> {
        match self.session.state() {
            GameState::Playing => {}
            GameState::Won | GameState::Failed => {
                self.session.conclude()?;
                return Ok(SessionSignal::Continue);
            }
            _ => return Ok(SessionSignal::Continue),
        }

        // Nothing falls while nobody is in frame
        let Some(pose) = poses.first() else {
            return Ok(SessionSignal::Continue);
        };
        self.track(pose);
        self.session.advance(dt);
        self.spawn();
        self.update_items();

        if self.session.state() == GameState::Failed {
            info!(
                score = self.session.score(),
                max_combo = self.max_combo,
                "System down"
            );
            self.session.conclude()?;
        }
        Ok(SessionSignal::Continue)
    }
}

pub(crate) fn run(ctx: &mut LaunchContext) -> Result<SessionReport> {
    let mut game = ItDefender::new(&ctx.config, ctx.leaderboard(Minigame::ItDefender));
    let stats = run_pose_loop(&mut game, ctx)?;
    Ok(SessionReport::new(Minigame::ItDefender, &game.session, stats))
}
