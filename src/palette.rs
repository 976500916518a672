use egui::Color32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Built-in stroke colors, in menu order
pub const STROKE_COLORS: [&str; 5] = ["#f33", "#090", "#36f", "#fff", "#333"];
pub const DEFAULT_COLOR_INDEX: usize = 4;
/// Built-in stroke widths in image pixels, in menu order
pub const STROKE_WIDTHS: [f32; 3] = [2.0, 5.0, 10.0];
pub const DEFAULT_WIDTH_INDEX: usize = 1;

/// Errors raised while loading or validating a palette
#[derive(Debug, Error)]
pub enum PaletteError {
    #[error("Failed to parse palette: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Palette has no {0}")]
    Empty(&'static str),

    #[error("Default {what} index {index} is out of range (len {len})")]
    DefaultOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Invalid color: {0:?}")]
    BadColor(String),

    #[error("Invalid stroke width: {0}")]
    BadWidth(f32),
}

/// Color and width applied to a stroke. Captured when the stroke begins and
/// never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Color32,
    pub width: f32,
}

impl StrokeStyle {
    pub fn new(color: Color32, width: f32) -> Self {
        Self { color, width }
    }
}

/// Which palette entries are currently selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleChoice {
    pub color_index: usize,
    pub width_index: usize,
}

/// Fixed ordered lists of selectable colors and widths, each with a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    colors: Vec<String>,
    widths: Vec<f32>,
    default_color: usize,
    default_width: usize,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: STROKE_COLORS.iter().map(|c| (*c).to_owned()).collect(),
            widths: STROKE_WIDTHS.to_vec(),
            default_color: DEFAULT_COLOR_INDEX,
            default_width: DEFAULT_WIDTH_INDEX,
        }
    }
}

impl Palette {
    pub fn new(
        colors: Vec<String>,
        widths: Vec<f32>,
        default_color: usize,
        default_width: usize,
    ) -> Result<Self, PaletteError> {
        let palette = Self {
            colors,
            widths,
            default_color,
            default_width,
        };
        palette.validate()?;
        Ok(palette)
    }

    /// Load a palette from JSON, e.g.
    /// `{"colors":["#000"],"widths":[3.0],"default_color":0,"default_width":0}`
    pub fn from_json(json: &str) -> Result<Self, PaletteError> {
        let palette: Self = serde_json::from_str(json)?;
        palette.validate()?;
        Ok(palette)
    }

    pub fn validate(&self) -> Result<(), PaletteError> {
        if self.colors.is_empty() {
            return Err(PaletteError::Empty("colors"));
        }
        if self.widths.is_empty() {
            return Err(PaletteError::Empty("widths"));
        }
        if self.default_color >= self.colors.len() {
            return Err(PaletteError::DefaultOutOfRange {
                what: "color",
                index: self.default_color,
                len: self.colors.len(),
            });
        }
        if self.default_width >= self.widths.len() {
            return Err(PaletteError::DefaultOutOfRange {
                what: "width",
                index: self.default_width,
                len: self.widths.len(),
            });
        }
        for color in &self.colors {
            if parse_hex_color(color).is_none() {
                return Err(PaletteError::BadColor(color.clone()));
            }
        }
        if let Some(width) = self.widths.iter().find(|w| !w.is_finite() || **w <= 0.0) {
            return Err(PaletteError::BadWidth(*width));
        }
        Ok(())
    }

    pub fn colors(&self) -> &[String] {
        &self.colors
    }

    pub fn widths(&self) -> &[f32] {
        &self.widths
    }

    pub fn color(&self, index: usize) -> Option<Color32> {
        self.colors.get(index).and_then(|c| parse_hex_color(c))
    }

    pub fn width(&self, index: usize) -> Option<f32> {
        self.widths.get(index).copied()
    }

    pub fn default_choice(&self) -> StyleChoice {
        StyleChoice {
            color_index: self.default_color,
            width_index: self.default_width,
        }
    }

    /// Returns true if both indices point at palette entries
    pub fn contains(&self, choice: StyleChoice) -> bool {
        choice.color_index < self.colors.len() && choice.width_index < self.widths.len()
    }

    /// Resolve a choice to concrete style values, falling back to the defaults
    /// for indices outside the palette.
    pub fn resolve(&self, choice: StyleChoice) -> StrokeStyle {
        let color = self
            .color(choice.color_index)
            .or_else(|| self.color(self.default_color))
            .unwrap_or(Color32::BLACK);
        let width = self
            .width(choice.width_index)
            .or_else(|| self.width(self.default_width))
            .unwrap_or(1.0);
        StrokeStyle::new(color, width)
    }

    pub fn default_style(&self) -> StrokeStyle {
        self.resolve(self.default_choice())
    }
}

/// Parse a CSS hex color, `#rgb` or `#rrggbb`
pub fn parse_hex_color(text: &str) -> Option<Color32> {
    let hex = text.strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let expand = |i: usize| channel(&hex[i..=i]).map(|v| v * 17);
            Some(Color32::from_rgb(expand(0)?, expand(1)?, expand(2)?))
        }
        6 => Some(Color32::from_rgb(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#f33"), Some(Color32::from_rgb(255, 51, 51)));
        assert_eq!(parse_hex_color("#336699"), Some(Color32::from_rgb(0x33, 0x66, 0x99)));
        assert_eq!(parse_hex_color("333"), None);
        assert_eq!(parse_hex_color("#12"), None);
        assert_eq!(parse_hex_color("#ggg"), None);
    }

    #[test]
    fn test_default_palette() {
        let palette = Palette::default();
        assert!(palette.validate().is_ok());
        assert_eq!(
            palette.default_style(),
            StrokeStyle::new(Color32::from_rgb(0x33, 0x33, 0x33), 5.0)
        );
    }

    #[test]
    fn test_resolve_out_of_range_falls_back_to_default() {
        let palette = Palette::default();
        let style = palette.resolve(StyleChoice {
            color_index: 99,
            width_index: 0,
        });
        assert_eq!(style.color, Color32::from_rgb(0x33, 0x33, 0x33));
        assert_eq!(style.width, 2.0);
    }

    #[test]
    fn test_palette_from_json() {
        let json = r##"{
            "colors": ["#000", "#ffffff"],
            "widths": [1.0, 3.0],
            "default_color": 1,
            "default_width": 0
        }"##;
        let palette = Palette::from_json(json).unwrap();
        assert_eq!(palette.default_style(), StrokeStyle::new(Color32::WHITE, 1.0));
    }

    #[test]
    fn test_palette_validation_errors() {
        assert!(matches!(
            Palette::new(vec![], vec![1.0], 0, 0),
            Err(PaletteError::Empty("colors"))
        ));
        assert!(matches!(
            Palette::new(vec!["#000".into()], vec![1.0], 0, 3),
            Err(PaletteError::DefaultOutOfRange { what: "width", .. })
        ));
        assert!(matches!(
            Palette::new(vec!["red".into()], vec![1.0], 0, 0),
            Err(PaletteError::BadColor(_))
        ));
        assert!(matches!(
            Palette::new(vec!["#000".into()], vec![0.0], 0, 0),
            Err(PaletteError::BadWidth(_))
        ));
        assert!(matches!(Palette::from_json("{"), Err(PaletteError::Json(_))));
    }
}
