use egui::{Color32, Pos2};

use crate::palette::StrokeStyle;

/// A finished stroke, kept for inspection after its pixels were committed
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    points: Vec<Pos2>,
    style: StrokeStyle,
}

/// The stroke currently being drawn
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveStroke {
    points: Vec<Pos2>,
    style: StrokeStyle,
}

impl Stroke {
    pub fn new(style: StrokeStyle, points: Vec<Pos2>) -> Self {
        Self { points, style }
    }

    pub fn points(&self) -> &[Pos2] {
        &self.points
    }

    pub fn style(&self) -> StrokeStyle {
        self.style
    }

    pub fn color(&self) -> Color32 {
        self.style.color
    }

    pub fn width(&self) -> f32 {
        self.style.width
    }

    /// Number of line segments in the polyline
    pub fn segment_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }
}

impl ActiveStroke {
    /// Start a stroke; the style is frozen from here on
    pub fn new(style: StrokeStyle) -> Self {
        Self {
            points: Vec::new(),
            style,
        }
    }

    /// Append a point, returning the previous point if this closes a segment
    pub fn add_point(&mut self, point: Pos2) -> Option<Pos2> {
        let previous = self.points.last().copied();
        self.points.push(point);
        previous
    }

    pub fn points(&self) -> &[Pos2] {
        &self.points
    }

    pub fn style(&self) -> StrokeStyle {
        self.style
    }

    pub fn finish(self) -> Stroke {
        Stroke::new(self.style, self.points)
    }
}
