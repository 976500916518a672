use egui::Pos2;
use log::debug;
use serde::{Deserialize, Serialize};

use super::{PointerEvent, PointerEventKind};
use crate::util::{TimerQueue, TimerToken, Timestamp};

/// Represents a recognized gesture. Positions are device coordinates relative
/// to the target element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// Short press released without moving
    Tap { position: Pos2 },
    /// Press held still for the long-press time
    LongPoint { position: Pos2 },
    /// Press moved past the drag threshold; `origin` is where it went down
    DragStart { origin: Pos2 },
    DragMove { position: Pos2 },
    DragEnd { position: Pos2 },
}

/// Configuration for gesture recognition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Displacement from the press origin beyond which a press becomes a drag
    pub drag_threshold: f32,
    /// Time a press must be held still to become a long point (seconds)
    pub long_press_time: f64,
    /// Longest press still reported as a tap (seconds)
    pub max_tap_time: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            drag_threshold: 5.0,
            long_press_time: 0.5,
            max_tap_time: 0.3,
        }
    }
}

/// Where the current press is in its life cycle.
///
/// A press leaves `Pressing` for exactly one of `Dragging` or `LongPressed`,
/// so it can never be both a drag and a long point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PressState {
    Idle,
    Pressing {
        origin: Pos2,
        started_at: Timestamp,
        long_press: TimerToken,
    },
    Dragging,
    LongPressed,
}

impl PressState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Pressing { .. } => "Pressing",
            Self::Dragging => "Dragging",
            Self::LongPressed => "LongPressed",
        }
    }
}

/// Classifies the normalized pointer stream into taps, drags and long points.
///
/// The long-press timer lives in an internal [`TimerQueue`]; the event loop
/// must call [`GestureRecognizer::poll`] whenever it gets control so a held
/// press fires without further input. Every `handle` call also fires an
/// overdue timer first, so the order of outcomes never depends on how often
/// the loop polls.
#[derive(Debug)]
pub struct GestureRecognizer {
    config: GestureConfig,
    state: PressState,
    timers: TimerQueue,
}

impl Default for GestureRecognizer {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

impl GestureRecognizer {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            state: PressState::Idle,
            timers: TimerQueue::new(),
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn state(&self) -> PressState {
        self.state
    }

    /// Deadline of the pending long-press timer, if any
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.timers.next_deadline()
    }

    /// Drop the current press without emitting anything
    pub fn reset(&mut self) {
        if let PressState::Pressing { long_press, .. } = self.state {
            self.timers.cancel(long_press);
        }
        if self.state != PressState::Idle {
            debug!("Gesture reset from {}", self.state.name());
        }
        self.state = PressState::Idle;
    }

    /// Fire the long-press timer if its deadline has passed
    pub fn poll(&mut self, now: Timestamp) -> Option<Gesture> {
        let mut fired = None;
        for token in self.timers.take_due(now) {
            if let PressState::Pressing {
                origin, long_press, ..
            } = self.state
            {
                if long_press == token {
                    debug!("Long point at {:?}", origin);
                    self.state = PressState::LongPressed;
                    fired = Some(Gesture::LongPoint { position: origin });
                }
            }
        }
        fired
    }

    /// Feed one normalized event, returning the gestures it completes in order
    pub fn handle(&mut self, event: &PointerEvent) -> Vec<Gesture> {
        let now = event.sample.timestamp;
        let position = event.sample.position;
        let mut gestures: Vec<Gesture> = self.poll(now).into_iter().collect();

        match (event.kind, self.state) {
            (PointerEventKind::Start, _) => {
                self.reset();
                let long_press = self.timers.schedule(now, self.config.long_press_time);
                self.state = PressState::Pressing {
                    origin: position,
                    started_at: now,
                    long_press,
                };
                debug!("Press at {:?}", position);
            }
            (
                PointerEventKind::Move,
                PressState::Pressing {
                    origin, long_press, ..
                },
            ) => {
                if (position - origin).length() > self.config.drag_threshold {
                    self.timers.cancel(long_press);
                    self.state = PressState::Dragging;
                    debug!("Drag start from {:?}", origin);
                    gestures.push(Gesture::DragStart { origin });
                    gestures.push(Gesture::DragMove { position });
                }
            }
            (PointerEventKind::Move, PressState::Dragging) => {
                gestures.push(Gesture::DragMove { position });
            }
            (
                PointerEventKind::End,
                PressState::Pressing {
                    origin,
                    started_at,
                    long_press,
                },
            ) => {
                self.timers.cancel(long_press);
                self.state = PressState::Idle;
                if now - started_at < self.config.max_tap_time {
                    debug!("Tap at {:?}", origin);
                    gestures.push(Gesture::Tap { position: origin });
                }
            }
            (PointerEventKind::End, PressState::Dragging) => {
                self.state = PressState::Idle;
                debug!("Drag end at {:?}", position);
                gestures.push(Gesture::DragEnd { position });
            }
            (PointerEventKind::End, PressState::LongPressed) => {
                self.state = PressState::Idle;
            }
            (PointerEventKind::Cancel, _) => {
                self.reset();
            }
            _ => {}
        }

        gestures
    }
}
