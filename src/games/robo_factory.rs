//! Time attack: grab parts off the conveyor belt and drop them into the
//! matching robot slots. Every finished robot scores a bonus; the clock
//! starts with the first pinch.

use anyhow::Result;
use std::time::Duration;
use tracing::{debug, info};

use super::{run_landmark_loop, LandmarkGame, LaunchContext, Minigame, SessionReport, TickGame};
use crate::config::{ArcadeConfig, RoboFactoryConfig};
use crate::gesture::{GestureCursor, Hand};
use crate::leaderboard::LeaderboardStore;
use crate::models::{Point, Rect, Resolution};
use crate::session::{GameSession, GameState, InputEvent, Outcome, SessionConfig, SessionSignal};

pub const PART_NAMES: [&str; 5] = ["legs", "torso", "head", "left_hand", "right_hand"];

const PART_SIZE: f32 = 60.0;
const GRAB_SLACK: f32 = 40.0;
const ROBOT_TOP: f32 = 120.0;
/// Spawned parts enter this far past the right edge, spaced by `BURST_SPACING`
const SPAWN_OFFSET: f32 = 60.0;
const BURST_SPACING: f32 = 100.0;
const BELT_HEIGHT_OFFSET: f32 = 70.0;
const MAX_BURST: u64 = 3;

/// Where one part of the robot goes
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub name: &'static str,
    pub center: Point,
    pub filled: bool,
}

/// A part riding the conveyor
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub id: u64,
    pub name: &'static str,
    pub rect: Rect,
    pub dragging: bool,
}

fn robot_slots(screen: Resolution) -> Vec<Slot> {
    let x = (screen.width / 2) as f32;
    let layout = [
        ("legs", x, ROBOT_TOP + 180.0),
        ("torso", x, ROBOT_TOP + 90.0),
        ("head", x, ROBOT_TOP),
        ("left_hand", x - 75.0, ROBOT_TOP + 130.0),
        ("right_hand", x + 75.0, ROBOT_TOP + 50.0),
    ];
    layout
        .into_iter()
        .map(|(name, x, y)| Slot {
            name,
            center: Point::new(x, y),
            filled: false,
        })
        .collect()
}

pub struct RoboFactory {
    settings: RoboFactoryConfig,
    screen: Resolution,
    gesture: GestureCursor,
    session: GameSession,
    slots: Vec<Slot>,
    parts: Vec<Part>,
    dragged: Option<u64>,
    /// The belt runs from the start; the clock waits for the first pinch
    clock_started: bool,
    spawn_timer: u32,
    bursts: u64,
    next_id: u64,
    robots_built: u32,
}

impl RoboFactory {
    pub fn new(config: &ArcadeConfig, store: Option<Box<dyn LeaderboardStore>>) -> Self {
        let settings = config.robo_factory.clone();
        let session = GameSession::new(
            SessionConfig {
                time_limit: Some(Duration::from_secs_f32(settings.duration_secs.max(0.0))),
                time_up: Outcome::Win,
                ..SessionConfig::default()
            },
            store,
        );
        Self {
            gesture: GestureCursor::new(config.display, settings.pinch_threshold),
            screen: config.display,
            settings,
            session,
            slots: robot_slots(config.display),
            parts: Vec::new(),
            dragged: None,
            clock_started: false,
            spawn_timer: 0,
            bursts: 0,
            next_id: 0,
            robots_built: 0,
        }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn robots_built(&self) -> u32 {
        self.robots_built
    }

    pub fn clock_started(&self) -> bool {
        self.clock_started
    }

    /// Put a part on the belt at `center`; returns its id
    pub fn place_part(&mut self, name: &'static str, center: Point) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.parts.push(Part {
            id,
            name,
            rect: Rect::from_center(center, PART_SIZE, PART_SIZE),
            dragging: false,
        });
        id
    }

    fn grab(&mut self, cursor: Point) {
        // Topmost part wins
        if let Some(part) = self
            .parts
            .iter_mut()
            .rev()
            .find(|part| part.rect.inflate(GRAB_SLACK, GRAB_SLACK).contains(&cursor))
        {
            debug!(part = part.name, "Part grabbed");
            part.dragging = true;
            self.dragged = Some(part.id);
        }
    }

    fn drag(&mut self, id: u64, cursor: Point) {
        match self.parts.iter_mut().find(|part| part.id == id) {
            Some(part) => part.rect = Rect::from_center(cursor, part.rect.width, part.rect.height),
            None => self.dragged = None,
        }
    }

    fn release(&mut self, id: u64) {
        self.dragged = None;
        let Some(index) = self.parts.iter().position(|part| part.id == id) else {
            return;
        };
        self.parts[index].dragging = false;

        let part_center = self.parts[index].rect.center();
        let name = self.parts[index].name;
        let snap = self.settings.snap_distance;
        if let Some(slot) = self
            .slots
            .iter_mut()
            .find(|slot| slot.name == name && !slot.filled && slot.center.distance(&part_center) < snap)
        {
            debug!(part = name, "Part fitted");
            slot.filled = true;
            self.parts.remove(index);
        }
    }

    fn check_robot(&mut self) {
        if !self.slots.iter().all(|slot| slot.filled) {
            return;
        }
        self.robots_built += 1;
        self.session.add_score(self.settings.robot_bonus);
        info!(robots = self.robots_built, score = self.session.score(), "Robot complete");
        for slot in self.slots.iter_mut() {
            slot.filled = false;
        }
    }

    /// Next part to hand the player; cycles through what the robot still misses
    fn next_spawn(&self) -> &'static str {
        let missing: Vec<&'static str> = self
            .slots
            .iter()
            .filter(|slot| !slot.filled)
            .map(|slot| slot.name)
            .collect();
        let pool = if missing.is_empty() {
            PART_NAMES.as_slice()
        } else {
            missing.as_slice()
        };
        pool[(self.next_id % pool.len() as u64) as usize]
    }

    fn spawn(&mut self) {
        self.spawn_timer += 1;
        if self.spawn_timer <= self.settings.spawn_interval {
            return;
        }
        self.spawn_timer = 0;
        let burst = 1 + self.bursts % MAX_BURST;
        self.bursts += 1;

        let y = self.screen.height as f32 - BELT_HEIGHT_OFFSET;
        for i in 0..burst {
            let name = self.next_spawn();
            let x = self.screen.width as f32 + SPAWN_OFFSET + i as f32 * BURST_SPACING;
            self.place_part(name, Point::new(x, y));
        }
    }

    /// Move the belt, then rebuild it from the parts still on screen
    fn advance_belt(&mut self) {
        let speed = self.settings.belt_speed;
        let snapshot = std::mem::take(&mut self.parts);
        self.parts = snapshot
            .into_iter()
            .map(|mut part| {
                if !part.dragging {
                    part.rect.x -= speed;
                }
                part
            })
            .filter(|part| part.rect.right() >= 0.0)
            .collect();
    }

    fn restart(&mut self) {
        self.session.restart();
        self.slots = robot_slots(self.screen);
        self.parts.clear();
        self.dragged = None;
        self.clock_started = false;
        self.spawn_timer = 0;
        self.bursts = 0;
        self.robots_built = 0;
    }
}

impl TickGame for RoboFactory {
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

impl LandmarkGame for RoboFactory {
    fn tick(&mut self, hands: &[Hand], dt: Duration) -> Result<SessionSignal> {
        match self.session.state() {
            GameState::Playing => {}
            GameState::Won | GameState::Failed => {
                self.session.conclude()?;
                return Ok(SessionSignal::Continue);
            }
            _ => return Ok(SessionSignal::Continue),
        }

        let reading = self.gesture.read_first(hands);
        let pinching = reading.is_some_and(|r| r.pinching);

        if pinching && !self.clock_started {
            self.clock_started = true;
            info!("Clock started");
        }
        if self.clock_started {
            self.session.advance(dt);
        }
        if matches!(self.session.state(), GameState::Won | GameState::Failed) {
            self.session.conclude()?;
            return Ok(SessionSignal::Continue);
        }

        match reading.filter(|r| r.pinching) {
            Some(r) => {
                if self.dragged.is_none() {
                    self.grab(r.cursor);
                }
                if let Some(id) = self.dragged {
                    self.drag(id, r.cursor);
                }
            }
            None => {
                if let Some(id) = self.dragged {
                    self.release(id);
                }
            }
        }
        self.check_robot();
        self.spawn();
        self.advance_belt();
        Ok(SessionSignal::Continue)
    }
}

pub(crate) fn run(ctx: &mut LaunchContext) -> Result<SessionReport> {
    let mut game = RoboFactory::new(&ctx.config, ctx.leaderboard(Minigame::RoboFactory));
    let stats = run_landmark_loop(&mut game, ctx)?;
    Ok(SessionReport::new(Minigame::RoboFactory, &game.session, stats))
}
