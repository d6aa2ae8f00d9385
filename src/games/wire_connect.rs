//! Repair task: pinch a wire on the left panel and drag it onto the
//! connector of the same colour on the right.

use anyhow::{ensure, Result};
use std::time::Duration;
use tracing::{debug, info};

use super::{run_landmark_loop, LandmarkGame, LaunchContext, Minigame, SessionReport, TickGame};
use crate::config::ArcadeConfig;
use crate::gesture::{GestureCursor, Hand};
use crate::models::{Cursor, Point, Rect};
use crate::pipeline::{CursorPipeline, ExponentialSmoothing};
use crate::session::{GameSession, GameState, InputEvent, Outcome, SessionConfig, SessionSignal};

/// Pinching over this button leaves the game
pub const EXIT_BUTTON: Rect = Rect::new(20.0, 20.0, 100.0, 50.0);

const CONNECTOR_SIZE: f32 = 40.0;
/// Distance from the screen edge to the outer side of a connector
const CONNECTOR_MARGIN: f32 = 50.0;
const GRAB_SLACK: f32 = 20.0;
const DROP_SLACK: f32 = 30.0;

/// A socket on the right panel
#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    pub color: String,
    pub rect: Rect,
    /// Where a connected wire ends
    pub anchor: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Wire {
    pub color: String,
    pub socket: Rect,
    pub start: Point,
    pub end: Point,
    pub dragging: bool,
    pub connected: bool,
}

impl Wire {
    fn reset(&mut self) {
        self.end = self.start;
        self.dragging = false;
        self.connected = false;
    }

    /// One tick of grab, drag and release
    fn update(&mut self, targets: &[Connector], cursor: Point, pinching: bool) {
        if self.connected {
            return;
        }
        if pinching {
            if !self.dragging && self.socket.inflate(GRAB_SLACK, GRAB_SLACK).contains(&cursor) {
                debug!(color = %self.color, "Wire grabbed");
                self.dragging = true;
            }
            if self.dragging {
                self.end = cursor;
            }
            return;
        }
        if !self.dragging {
            return;
        }

        let target = targets.iter().find(|target| {
            target.color == self.color
                && target.rect.inflate(DROP_SLACK, DROP_SLACK).contains(&cursor)
        });
        match target {
            Some(target) => {
                info!(color = %self.color, "Wire connected");
                self.end = target.anchor;
                self.connected = true;
                self.dragging = false;
            }
            None => self.reset(),
        }
    }
}

pub struct WireConnect {
    gesture: GestureCursor,
    smoothing: CursorPipeline,
    wires: Vec<Wire>,
    targets: Vec<Connector>,
    session: GameSession,
    cursor: Cursor,
}

impl WireConnect {
    pub fn new(config: &ArcadeConfig) -> Result<Self> {
        let layout = &config.wire_connect;
        ensure!(
            layout
                .left_order
                .iter()
                .all(|color| layout.right_order.contains(color)),
            "Every wire colour needs a connector on the right panel"
        );

        let width = config.display.width as f32;
        let row_y = |row: usize| layout.first_row_y + row as f32 * layout.row_spacing;

        let wires = layout
            .left_order
            .iter()
            .enumerate()
            .map(|(row, color)| {
                let y = row_y(row);
                let start = Point::new(CONNECTOR_MARGIN + CONNECTOR_SIZE, y);
                Wire {
                    color: color.clone(),
                    socket: Rect::new(
                        CONNECTOR_MARGIN,
                        y - CONNECTOR_SIZE / 2.0,
                        CONNECTOR_SIZE,
                        CONNECTOR_SIZE,
                    ),
                    start,
                    end: start,
                    dragging: false,
                    connected: false,
                }
            })
            .collect();

        let targets = layout
            .right_order
            .iter()
            .enumerate()
            .map(|(row, color)| {
                let y = row_y(row);
                let x = width - CONNECTOR_MARGIN - CONNECTOR_SIZE;
                Connector {
                    color: color.clone(),
                    rect: Rect::new(x, y - CONNECTOR_SIZE / 2.0, CONNECTOR_SIZE, CONNECTOR_SIZE),
                    anchor: Point::new(x, y),
                }
            })
            .collect();

        let mut smoothing = CursorPipeline::new();
        if let Some(alpha) = config.gesture.smoothing {
            smoothing = smoothing.add_stage(Box::new(ExponentialSmoothing::new(alpha)));
        }

        Ok(Self {
            gesture: GestureCursor::new(config.display, config.gesture.pinch_threshold),
            smoothing,
            wires,
            targets,
            session: GameSession::new(SessionConfig::default(), None),
            cursor: Cursor::default(),
        })
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn wires(&self) -> &[Wire] {
        &self.wires
    }

    pub fn targets(&self) -> &[Connector] {
        &self.targets
    }

    /// Cursor position, active while pinching
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    fn restart(&mut self) {
        self.session.restart();
        self.wires.iter_mut().for_each(Wire::reset);
        self.smoothing.reset(None);
    }
}

impl TickGame for WireConnect {
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

impl LandmarkGame for WireConnect {
    fn tick(&mut self, hands: &[Hand], dt: Duration) -> Result<SessionSignal> {
        let Some(reading) = self.gesture.read_first(hands) else {
            // Losing the hand drops whatever was held
            for wire in self.wires.iter_mut().filter(|wire| wire.dragging) {
                wire.reset();
            }
            self.cursor.active = false;
            return Ok(SessionSignal::Continue);
        };

        let position = self.smoothing.run(Cursor::active(reading.cursor)).position;
        self.cursor = Cursor {
            position,
            active: reading.pinching,
        };

        if reading.pinching && EXIT_BUTTON.contains(&position) {
            info!("Exit button pressed");
            return Ok(SessionSignal::Quit);
        }

        if self.session.state() != GameState::Playing {
            return Ok(SessionSignal::Continue);
        }
        self.session.advance(dt);

        // One wire at a time
        let dragging_any = self.wires.iter().any(|wire| wire.dragging);
        for wire in self
            .wires
            .iter_mut()
            .filter(|wire| !dragging_any || wire.dragging)
        {
            wire.update(&self.targets, position, reading.pinching);
        }

        if self.wires.iter().all(|wire| wire.connected) {
            self.session.finish(Outcome::Win);
            self.session.conclude()?;
        }
        Ok(SessionSignal::Continue)
    }
}

pub(crate) fn run(ctx: &mut LaunchContext) -> Result<SessionReport> {
    let mut game = WireConnect::new(&ctx.config)?;
    let stats = run_landmark_loop(&mut game, ctx)?;
    Ok(SessionReport::new(Minigame::WireConnect, &game.session, stats))
}
