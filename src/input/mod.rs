use egui::{Pos2, Rect};
use log::debug;

use crate::util::Timestamp;

mod gestures;
mod handler;
pub mod listener;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use gestures::{Gesture, GestureConfig, GestureRecognizer, PressState};
pub use handler::InputHandler;
pub use listener::{ListenerKind, Subscription};

/// Number of simultaneous contacts at which touch input stops being drawing
/// input and turns into a browser gesture that has to be suppressed.
pub const MULTI_TOUCH_CONTACTS: usize = 2;

/// Returns true if a touch event with this many contacts must have its
/// default behavior (pinch-zoom, scroll) prevented
pub fn should_suppress(touch_count: usize) -> bool {
    touch_count >= MULTI_TOUCH_CONTACTS
}

/// Which device family a raw event came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Mouse,
    Touch,
}

/// Phase of a touch event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Start,
    Move,
    End,
    Cancel,
}

/// Low-level input as delivered by the platform.
///
/// Positions are in page space; the normalizer makes them relative to the
/// target element. `touch_count` is the number of contacts still on the
/// surface after the event, as a browser `TouchEvent.touches` reports it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawInput {
    MouseDown {
        position: Pos2,
        timestamp: Timestamp,
    },
    MouseMove {
        position: Pos2,
        timestamp: Timestamp,
    },
    MouseUp {
        position: Pos2,
        timestamp: Timestamp,
    },
    Touch {
        phase: TouchPhase,
        position: Pos2,
        touch_count: usize,
        timestamp: Timestamp,
    },
}

impl RawInput {
    pub fn position(&self) -> Pos2 {
        match self {
            Self::MouseDown { position, .. }
            | Self::MouseMove { position, .. }
            | Self::MouseUp { position, .. }
            | Self::Touch { position, .. } => *position,
        }
    }

    pub fn timestamp(&self) -> Timestamp {
        match self {
            Self::MouseDown { timestamp, .. }
            | Self::MouseMove { timestamp, .. }
            | Self::MouseUp { timestamp, .. }
            | Self::Touch { timestamp, .. } => *timestamp,
        }
    }
}

/// A single pointer reading in device coordinates relative to the target element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub timestamp: Timestamp,
    pub position: Pos2,
    /// Contacts still down after this event
    pub pointer_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEventKind {
    Start,
    Move,
    End,
    /// The press was taken over by a multi-touch gesture or cancelled by the
    /// platform. Nothing more arrives for it.
    Cancel,
}

/// One event of the unified pointer stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub sample: PointerSample,
}

/// Result of normalizing one raw event
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Normalized {
    pub event: Option<PointerEvent>,
    /// The platform default for the raw event must be prevented
    pub prevent_default: bool,
}

impl Normalized {
    fn dropped() -> Self {
        Self::default()
    }

    fn emit(kind: PointerEventKind, sample: PointerSample) -> Self {
        Self {
            event: Some(PointerEvent { kind, sample }),
            prevent_default: false,
        }
    }
}

/// Turns mouse and touch events into a single start/move/end stream.
///
/// Only one press is tracked at a time and it stays with the device family
/// that started it. As soon as a touch event reports two or more contacts,
/// the current press is cancelled and every touch event is swallowed until
/// all fingers have left the surface.
#[derive(Debug, Clone)]
pub struct PointerNormalizer {
    target_origin: Pos2,
    active: Option<InputSource>,
    suppressed: bool,
}

impl Default for PointerNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PointerNormalizer {
    pub fn new() -> Self {
        Self {
            target_origin: Pos2::ZERO,
            active: None,
            suppressed: false,
        }
    }

    /// Update the target element rectangle (e.g. if the window is resized)
    pub fn set_target_rect(&mut self, rect: Rect) {
        self.target_origin = rect.min;
    }

    pub fn active_source(&self) -> Option<InputSource> {
        self.active
    }

    pub fn is_suppressing(&self) -> bool {
        self.suppressed
    }

    /// Forget any press in progress
    pub fn reset(&mut self) {
        self.active = None;
        self.suppressed = false;
    }

    pub fn normalize(&mut self, raw: RawInput) -> Normalized {
        let position = raw.position();
        if !position.x.is_finite() || !position.y.is_finite() || !raw.timestamp().is_finite() {
            return Normalized::dropped();
        }

        match raw {
            RawInput::Touch {
                phase,
                position,
                touch_count,
                timestamp,
            } => self.normalize_touch(phase, position, touch_count, timestamp),
            RawInput::MouseDown {
                position,
                timestamp,
            } => {
                if self.active.is_some() {
                    return Normalized::dropped();
                }
                self.active = Some(InputSource::Mouse);
                Normalized::emit(PointerEventKind::Start, self.sample(position, 1, timestamp))
            }
            RawInput::MouseMove {
                position,
                timestamp,
            } => {
                if self.active != Some(InputSource::Mouse) {
                    return Normalized::dropped();
                }
                Normalized::emit(PointerEventKind::Move, self.sample(position, 1, timestamp))
            }
            RawInput::MouseUp {
                position,
                timestamp,
            } => {
                if self.active != Some(InputSource::Mouse) {
                    return Normalized::dropped();
                }
                self.active = None;
                Normalized::emit(PointerEventKind::End, self.sample(position, 0, timestamp))
            }
        }
    }

    fn normalize_touch(
        &mut self,
        phase: TouchPhase,
        position: Pos2,
        touch_count: usize,
        timestamp: Timestamp,
    ) -> Normalized {
        if matches!(phase, TouchPhase::Start | TouchPhase::Move) && should_suppress(touch_count) {
            let cancelled = self.active.take().map(|_| PointerEvent {
                kind: PointerEventKind::Cancel,
                sample: self.sample(position, touch_count, timestamp),
            });
            if !self.suppressed {
                debug!("Suppressing multi-touch gesture ({} contacts)", touch_count);
            }
            self.suppressed = true;
            return Normalized {
                event: cancelled,
                prevent_default: true,
            };
        }

        if self.suppressed {
            if touch_count == 0 && matches!(phase, TouchPhase::End | TouchPhase::Cancel) {
                self.suppressed = false;
            }
            return Normalized::dropped();
        }

        let sample = self.sample(position, touch_count, timestamp);
        match phase {
            TouchPhase::Start => {
                if self.active.is_some() {
                    return Normalized::dropped();
                }
                self.active = Some(InputSource::Touch);
                Normalized::emit(PointerEventKind::Start, sample)
            }
            TouchPhase::Move if self.active == Some(InputSource::Touch) => {
                Normalized::emit(PointerEventKind::Move, sample)
            }
            TouchPhase::End if self.active == Some(InputSource::Touch) && touch_count == 0 => {
                self.active = None;
                Normalized::emit(PointerEventKind::End, sample)
            }
            TouchPhase::Cancel if self.active == Some(InputSource::Touch) => {
                self.active = None;
                Normalized::emit(PointerEventKind::Cancel, sample)
            }
            _ => Normalized::dropped(),
        }
    }

    fn sample(&self, position: Pos2, pointer_count: usize, timestamp: Timestamp) -> PointerSample {
        PointerSample {
            timestamp,
            position: Pos2::ZERO + (position - self.target_origin),
            pointer_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    fn touch(phase: TouchPhase, x: f32, y: f32, touch_count: usize) -> RawInput {
        RawInput::Touch {
            phase,
            position: pos2(x, y),
            touch_count,
            timestamp: 0.0,
        }
    }

    fn kind(normalized: Normalized) -> Option<PointerEventKind> {
        normalized.event.map(|e| e.kind)
    }

    #[test]
    fn test_positions_are_relative_to_target() {
        let mut normalizer = PointerNormalizer::new();
        normalizer.set_target_rect(Rect::from_min_size(pos2(10.0, 20.0), egui::vec2(100.0, 100.0)));

        let out = normalizer.normalize(RawInput::MouseDown {
            position: pos2(15.0, 50.0),
            timestamp: 1.0,
        });
        let event = out.event.unwrap();
        assert_eq!(event.kind, PointerEventKind::Start);
        assert_eq!(event.sample.position, pos2(5.0, 30.0));
        assert_eq!(event.sample.timestamp, 1.0);
    }

    #[test]
    fn test_mouse_hover_is_dropped() {
        let mut normalizer = PointerNormalizer::new();
        let out = normalizer.normalize(RawInput::MouseMove {
            position: pos2(1.0, 1.0),
            timestamp: 0.0,
        });
        assert_eq!(out, Normalized::default());
    }

    #[test]
    fn test_single_touch_stream() {
        let mut normalizer = PointerNormalizer::new();
        let start = normalizer.normalize(touch(TouchPhase::Start, 1.0, 1.0, 1));
        assert_eq!(kind(start), Some(PointerEventKind::Start));
        let moved = normalizer.normalize(touch(TouchPhase::Move, 2.0, 1.0, 1));
        assert_eq!(kind(moved), Some(PointerEventKind::Move));
        let end = normalizer.normalize(touch(TouchPhase::End, 2.0, 1.0, 0));
        assert_eq!(kind(end), Some(PointerEventKind::End));
        assert_eq!(normalizer.active_source(), None);
    }

    #[test]
    fn test_second_contact_cancels_and_suppresses() {
        let mut normalizer = PointerNormalizer::new();
        normalizer.normalize(touch(TouchPhase::Start, 1.0, 1.0, 1));

        let out = normalizer.normalize(touch(TouchPhase::Start, 50.0, 50.0, 2));
        assert!(out.prevent_default);
        assert_eq!(kind(out), Some(PointerEventKind::Cancel));

        // Pinch movement and the lifting of the fingers are swallowed
        let out = normalizer.normalize(touch(TouchPhase::Move, 60.0, 60.0, 2));
        assert!(out.prevent_default);
        assert_eq!(kind(out), None);
        assert_eq!(kind(normalizer.normalize(touch(TouchPhase::End, 60.0, 60.0, 1))), None);
        assert_eq!(kind(normalizer.normalize(touch(TouchPhase::Move, 1.0, 1.0, 1))), None);
        assert_eq!(kind(normalizer.normalize(touch(TouchPhase::End, 1.0, 1.0, 0))), None);
        assert!(!normalizer.is_suppressing());

        // A fresh single touch works again
        let fresh = normalizer.normalize(touch(TouchPhase::Start, 1.0, 1.0, 1));
        assert_eq!(kind(fresh), Some(PointerEventKind::Start));
    }

    #[test]
    fn test_multi_touch_start_without_press_only_suppresses() {
        let mut normalizer = PointerNormalizer::new();
        let out = normalizer.normalize(touch(TouchPhase::Start, 1.0, 1.0, 2));
        assert!(out.prevent_default);
        assert_eq!(out.event, None);
    }

    #[test]
    fn test_press_stays_with_its_source() {
        let mut normalizer = PointerNormalizer::new();
        normalizer.normalize(RawInput::MouseDown {
            position: pos2(1.0, 1.0),
            timestamp: 0.0,
        });
        assert_eq!(kind(normalizer.normalize(touch(TouchPhase::Start, 1.0, 1.0, 1))), None);
        assert_eq!(kind(normalizer.normalize(touch(TouchPhase::End, 1.0, 1.0, 0))), None);
        assert_eq!(
            kind(normalizer.normalize(RawInput::MouseUp {
                position: pos2(1.0, 1.0),
                timestamp: 0.1,
            })),
            Some(PointerEventKind::End)
        );
    }

    #[test]
    fn test_non_finite_input_is_dropped() {
        let mut normalizer = PointerNormalizer::new();
        let out = normalizer.normalize(RawInput::MouseDown {
            position: pos2(f32::NAN, 1.0),
            timestamp: 0.0,
        });
        assert_eq!(out, Normalized::default());
        assert_eq!(normalizer.active_source(), None);
    }

    #[test]
    fn test_touch_cancel_from_platform() {
        let mut normalizer = PointerNormalizer::new();
        normalizer.normalize(touch(TouchPhase::Start, 1.0, 1.0, 1));
        assert_eq!(
            kind(normalizer.normalize(touch(TouchPhase::Cancel, 1.0, 1.0, 0))),
            Some(PointerEventKind::Cancel)
        );
    }
}
