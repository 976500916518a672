use std::collections::HashSet;

use egui::{Context, PointerButton};

use super::{RawInput, TouchPhase};
use crate::util::Timestamp;

/// Converts egui's raw event list into [`RawInput`] for the normalizer.
///
/// egui reports touches one contact at a time, so the handler keeps the set of
/// contacts currently down to fill in `touch_count` the way a browser would.
#[derive(Debug, Default)]
pub struct InputHandler {
    active_touches: HashSet<(u64, u64)>,
}

impl InputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of touch contacts currently on the surface
    pub fn touch_count(&self) -> usize {
        self.active_touches.len()
    }

    /// Process this frame's egui input, stamping every event with `timestamp`
    pub fn process_input(&mut self, ctx: &Context, timestamp: Timestamp) -> Vec<RawInput> {
        let events = ctx.input(|input| input.events.clone());
        self.translate(&events, timestamp)
    }

    pub fn translate(&mut self, events: &[egui::Event], timestamp: Timestamp) -> Vec<RawInput> {
        let mut out = Vec::new();
        for event in events {
            match event {
                egui::Event::PointerButton {
                    pos,
                    button: PointerButton::Primary,
                    pressed,
                    ..
                } => {
                    out.push(if *pressed {
                        RawInput::MouseDown {
                            position: *pos,
                            timestamp,
                        }
                    } else {
                        RawInput::MouseUp {
                            position: *pos,
                            timestamp,
                        }
                    });
                }
                egui::Event::PointerMoved(pos) => {
                    out.push(RawInput::MouseMove {
                        position: *pos,
                        timestamp,
                    });
                }
                egui::Event::Touch {
                    device_id,
                    id,
                    phase,
                    pos,
                    ..
                } => {
                    let key = (device_id.0, id.0);
                    let phase = match phase {
                        egui::TouchPhase::Start => {
                            self.active_touches.insert(key);
                            TouchPhase::Start
                        }
                        egui::TouchPhase::Move => TouchPhase::Move,
                        egui::TouchPhase::End => {
                            self.active_touches.remove(&key);
                            TouchPhase::End
                        }
                        egui::TouchPhase::Cancel => {
                            self.active_touches.remove(&key);
                            TouchPhase::Cancel
                        }
                    };
                    out.push(RawInput::Touch {
                        phase,
                        position: *pos,
                        touch_count: self.active_touches.len(),
                        timestamp,
                    });
                }
                _ => {}
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{Modifiers, TouchDeviceId, TouchId, pos2};

    fn touch(id: u64, phase: egui::TouchPhase) -> egui::Event {
        egui::Event::Touch {
            device_id: TouchDeviceId(0),
            id: TouchId(id),
            phase,
            pos: pos2(id as f32, 0.0),
            force: None,
        }
    }

    #[test]
    fn test_translate_pointer_events() {
        let mut handler = InputHandler::new();
        let events = vec![
            egui::Event::PointerButton {
                pos: pos2(1.0, 2.0),
                button: PointerButton::Primary,
                pressed: true,
                modifiers: Modifiers::default(),
            },
            egui::Event::PointerMoved(pos2(3.0, 4.0)),
            egui::Event::PointerButton {
                pos: pos2(3.0, 4.0),
                button: PointerButton::Secondary,
                pressed: true,
                modifiers: Modifiers::default(),
            },
        ];

        let raw = handler.translate(&events, 2.5);
        assert_eq!(
            raw,
            vec![
                RawInput::MouseDown {
                    position: pos2(1.0, 2.0),
                    timestamp: 2.5
                },
                RawInput::MouseMove {
                    position: pos2(3.0, 4.0),
                    timestamp: 2.5
                },
            ]
        );
    }

    #[test]
    fn test_touch_count_tracks_contacts() {
        let mut handler = InputHandler::new();
        let raw = handler.translate(
            &[
                touch(1, egui::TouchPhase::Start),
                touch(2, egui::TouchPhase::Start),
                touch(2, egui::TouchPhase::End),
                touch(1, egui::TouchPhase::Cancel),
            ],
            0.0,
        );

        let counts: Vec<usize> = raw
            .iter()
            .map(|r| match r {
                RawInput::Touch { touch_count, .. } => *touch_count,
                _ => usize::MAX,
            })
            .collect();
        assert_eq!(counts, vec![1, 2, 1, 0]);
        assert_eq!(handler.touch_count(), 0);
    }
}
