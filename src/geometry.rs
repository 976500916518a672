use egui::{Pos2, Vec2, pos2, vec2};

/// Logical size of the painted image, fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ImageSpace {
    pub width: u32,
    pub height: u32,
}

impl ImageSpace {
    /// Both dimensions are forced to at least 1 pixel.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn size(&self) -> Vec2 {
        vec2(self.width as f32, self.height as f32)
    }

    /// Clamp a point into `[0, width] x [0, height]`
    pub fn clamp(&self, point: Pos2) -> Pos2 {
        pos2(
            between(0.0, point.x, self.width as f32),
            between(0.0, point.y, self.height as f32),
        )
    }
}

/// On-screen size of the canvas element in device pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSpace {
    width: f32,
    height: f32,
}

impl ViewportSpace {
    /// Degenerate sizes (zero, negative, NaN) become 1 so scaling never divides by zero.
    pub fn new(width: f32, height: f32) -> Self {
        let sane = |v: f32| if v.is_finite() && v >= 1.0 { v } else { 1.0 };
        Self {
            width: sane(width),
            height: sane(height),
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn size(&self) -> Vec2 {
        vec2(self.width, self.height)
    }
}

/// Map a device-space point on the canvas element into image space.
///
/// Each axis is scaled on its own, so the image stretches to fill the element
/// whatever the two aspect ratios are. The result is clamped into the image,
/// never rejected.
pub fn map_to_image(device: Pos2, viewport: ViewportSpace, image: ImageSpace) -> Pos2 {
    let scale_x = image.width as f32 / viewport.width;
    let scale_y = image.height as f32 / viewport.height;
    let x = if device.x.is_finite() { device.x * scale_x } else { 0.0 };
    let y = if device.y.is_finite() { device.y * scale_y } else { 0.0 };
    image.clamp(pos2(x, y))
}

/// Clamp `n` into `[min, max]`.
///
/// Contradictory bounds are a caller bug; they trip a debug assertion and
/// collapse onto `min` in release builds.
pub fn between(min: f32, n: f32, max: f32) -> f32 {
    debug_assert!(
        min <= max,
        "Contradictory numbers: min {min} must be less than or equal to max {max}"
    );
    if min > max {
        return min;
    }
    n.max(min).min(max)
}

/// Distance from a point to a line segment
pub(crate) fn distance_to_line_segment(point: Pos2, line_start: Pos2, line_end: Pos2) -> f32 {
    let line_vec = line_end - line_start;
    let point_vec = point - line_start;

    let len_sq = line_vec.length_sq();
    if len_sq == 0.0 {
        return point_vec.length();
    }

    let t = (point_vec.dot(line_vec) / len_sq).clamp(0.0, 1.0);
    let projection = line_start + line_vec * t;
    (point - projection).length()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_scales_each_axis_independently() {
        let viewport = ViewportSpace::new(400.0, 200.0);
        let image = ImageSpace::new(200, 400);

        let mapped = map_to_image(pos2(100.0, 50.0), viewport, image);
        assert_eq!(mapped, pos2(50.0, 100.0));
    }

    #[test]
    fn test_map_clamps_outside_points() {
        let viewport = ViewportSpace::new(100.0, 100.0);
        let image = ImageSpace::new(50, 80);

        assert_eq!(map_to_image(pos2(-10.0, 500.0), viewport, image), pos2(0.0, 80.0));
        assert_eq!(map_to_image(pos2(f32::NAN, 10.0), viewport, image), pos2(0.0, 8.0));
    }

    #[test]
    fn test_map_stays_in_bounds_across_viewport() {
        let viewport = ViewportSpace::new(333.0, 97.0);
        let image = ImageSpace::new(1024, 768);

        for xi in 0..=33 {
            for yi in 0..=9 {
                let device = pos2(xi as f32 * 10.1, yi as f32 * 10.7);
                let mapped = map_to_image(device, viewport, image);
                assert!((0.0..=1024.0).contains(&mapped.x), "x out of range: {mapped:?}");
                assert!((0.0..=768.0).contains(&mapped.y), "y out of range: {mapped:?}");
            }
        }
    }

    #[test]
    fn test_degenerate_viewport_does_not_divide_by_zero() {
        let viewport = ViewportSpace::new(0.0, -3.0);
        assert_eq!(viewport.size(), vec2(1.0, 1.0));

        let mapped = map_to_image(pos2(0.5, 0.5), viewport, ImageSpace::new(10, 10));
        assert_eq!(mapped, pos2(5.0, 5.0));
    }

    #[test]
    fn test_between() {
        assert_eq!(between(0.0, -1.0, 10.0), 0.0);
        assert_eq!(between(0.0, 5.0, 10.0), 5.0);
        assert_eq!(between(0.0, 11.0, 10.0), 10.0);
    }

    #[test]
    fn test_distance_to_line_segment() {
        let a = pos2(0.0, 0.0);
        let b = pos2(10.0, 0.0);
        assert_eq!(distance_to_line_segment(pos2(5.0, 3.0), a, b), 3.0);
        assert_eq!(distance_to_line_segment(pos2(13.0, 4.0), a, b), 5.0);
        assert_eq!(distance_to_line_segment(pos2(3.0, 4.0), a, a), 5.0);
    }
}
