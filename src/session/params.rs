use std::fmt;

use log::warn;

use crate::geometry::{ImageSpace, ViewportSpace};

/// Margin kept free on each side of the viewport when the image size is
/// derived from it
pub const APP_SPACE: f32 = 16.0;

/// Largest accepted image side; larger requests are clamped. A 4096x4096
/// RGBA surface is 64 MiB, and 4096 is the smallest texture limit common on
/// WebGL and mobile GPUs.
pub const MAX_IMAGE_SIDE: u32 = 4096;

/// The only `newType` that carries an explicit size
pub const NEW_TYPE_SIZE: &str = "size";

/// Optional query-style parameters a session is started with
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionParams {
    pub new_type: Option<String>,
    pub height: Option<String>,
    pub width: Option<String>,
}

impl SessionParams {
    /// Explicit `newType=size` request
    pub fn sized(width: impl Into<String>, height: impl Into<String>) -> Self {
        Self {
            new_type: Some(NEW_TYPE_SIZE.to_owned()),
            height: Some(height.into()),
            width: Some(width.into()),
        }
    }

    /// Parse `newType=size&height=200&width=300`, with or without a leading `?`.
    /// Keys and values are form-decoded (`+` and `%XX`). Unknown keys are
    /// ignored; the last occurrence of a key wins.
    pub fn from_query(query: &str) -> Self {
        let mut params = Self::default();
        for pair in query.trim_start_matches('?').split('&') {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = decode_component(value);
            match decode_component(key).as_str() {
                "newType" => params.new_type = Some(value),
                "height" => params.height = Some(value),
                "width" => params.width = Some(value),
                _ => {}
            }
        }
        params
    }
}

/// A session parameter that was rejected and replaced by a fallback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidParameterWarning {
    pub parameter: &'static str,
    pub value: Option<String>,
}

impl fmt::Display for InvalidParameterWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "Invalid parameter {}={:?}", self.parameter, value),
            None => write!(f, "Missing parameter {}", self.parameter),
        }
    }
}

/// Decide the image size for a new session.
///
/// `newType=size` takes `width`/`height` from the parameters, each falling
/// back to 1 when unusable. Any other `newType` is rejected and, like no
/// `newType` at all, sizes the image to the viewport minus [`APP_SPACE`] on
/// each side.
pub fn resolve_image_space(
    params: &SessionParams,
    viewport: ViewportSpace,
) -> (ImageSpace, Vec<InvalidParameterWarning>) {
    let mut warnings = Vec::new();

    match params.new_type.as_deref() {
        Some(NEW_TYPE_SIZE) => {
            let mut dimension = |parameter: &'static str, value: &Option<String>| {
                parse_dimension(value.as_deref()).unwrap_or_else(|| {
                    warnings.push(InvalidParameterWarning {
                        parameter,
                        value: value.clone(),
                    });
                    1
                })
            };
            let width = dimension("width", &params.width);
            let height = dimension("height", &params.height);
            for warning in &warnings {
                warn!("{}, using 1", warning);
            }
            let requested = ImageSpace::new(width, height);
            let (space, capped) = limit_image_space(requested, MAX_IMAGE_SIDE);
            warnings.extend(capped);
            return (space, warnings);
        }
        Some(other) if !other.is_empty() => {
            let warning = InvalidParameterWarning {
                parameter: "newType",
                value: Some(other.to_owned()),
            };
            warn!("Invalid parameters: {}", warning);
            warnings.push(warning);
        }
        _ => {}
    }

    let (space, capped) = limit_image_space(viewport_image_space(viewport), MAX_IMAGE_SIDE);
    warnings.extend(capped);
    (space, warnings)
}

/// Viewport minus the app margin on each side, never below 1x1
pub fn viewport_image_space(viewport: ViewportSpace) -> ImageSpace {
    let side = |v: f32| (v - APP_SPACE * 2.0).round().max(1.0) as u32;
    ImageSpace::new(side(viewport.width()), side(viewport.height()))
}

/// Shrink `space` so neither side exceeds `max_side`, e.g. the largest texture
/// the GPU accepts. Every clamped side is reported.
pub fn limit_image_space(
    space: ImageSpace,
    max_side: u32,
) -> (ImageSpace, Vec<InvalidParameterWarning>) {
    let max_side = max_side.max(1);
    let mut warnings = Vec::new();
    let mut limit = |parameter: &'static str, side: u32| {
        if side <= max_side {
            return side;
        }
        warnings.push(InvalidParameterWarning {
            parameter,
            value: Some(side.to_string()),
        });
        max_side
    };
    let limited = ImageSpace::new(limit("width", space.width), limit("height", space.height));
    for warning in &warnings {
        warn!("{}, using {}", warning, max_side);
    }
    (limited, warnings)
}

/// Decode `application/x-www-form-urlencoded` text. Malformed escapes are kept
/// as they are.
fn decode_component(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => decoded.push(b' '),
            b'%' => match bytes.get(i + 1..i + 3).and_then(hex_byte) {
                Some(byte) => {
                    decoded.push(byte);
                    i += 2;
                }
                None => decoded.push(b'%'),
            },
            other => decoded.push(other),
        }
        i += 1;
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

fn hex_byte(pair: &[u8]) -> Option<u8> {
    let digit = |b: u8| (b as char).to_digit(16);
    Some((digit(pair[0])? * 16 + digit(pair[1])?) as u8)
}

fn parse_dimension(value: Option<&str>) -> Option<u32> {
    let number: f64 = value?.trim().parse().ok()?;
    if !number.is_finite() || number <= 0.0 {
        return None;
    }
    Some(number.round().max(1.0).min(u32::MAX as f64) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_query() {
        let params = SessionParams::from_query("?newType=size&height=200&width=0&foo=bar");
        assert_eq!(params, SessionParams::sized("0", "200"));
        assert_eq!(SessionParams::from_query(""), SessionParams::default());
    }

    #[test]
    fn test_from_query_decodes_escapes() {
        let params = SessionParams::from_query("new%54ype=size&width=%32%30&height=1%2E5e1&x=%zz");
        assert_eq!(params, SessionParams::sized("20", "1.5e1"));
        assert_eq!(decode_component("a+b%20c%"), "a b c%");
        assert_eq!(decode_component("%zz%4"), "%zz%4");
    }

    #[test]
    fn test_limit_image_space() {
        let (space, warnings) = limit_image_space(ImageSpace::new(5000, 300), 2048);
        assert_eq!(space, ImageSpace::new(2048, 300));
        assert_eq!(
            warnings,
            vec![InvalidParameterWarning {
                parameter: "width",
                value: Some("5000".into()),
            }]
        );

        let (space, warnings) = limit_image_space(ImageSpace::new(300, 200), 2048);
        assert_eq!(space, ImageSpace::new(300, 200));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_oversized_request_is_capped_with_warning() {
        let params = SessionParams::sized("16384", "16384");
        let (space, warnings) = resolve_image_space(&params, ViewportSpace::new(1.0, 1.0));
        assert_eq!(space, ImageSpace::new(MAX_IMAGE_SIDE, MAX_IMAGE_SIDE));
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].to_string(), "Invalid parameter width=\"16384\"");
    }

    #[test]
    fn test_explicit_size() {
        let viewport = ViewportSpace::new(800.0, 600.0);
        let (space, warnings) = resolve_image_space(&SessionParams::sized("300", "200"), viewport);
        assert_eq!(space, ImageSpace::new(300, 200));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_invalid_dimensions_default_to_one() {
        let viewport = ViewportSpace::new(800.0, 600.0);
        for bad in ["0", "-5", "abc", "", "NaN", "inf"] {
            let (space, warnings) = resolve_image_space(&SessionParams::sized(bad, "20"), viewport);
            assert_eq!(space, ImageSpace::new(1, 20), "width {bad:?}");
            assert_eq!(warnings.len(), 1);
            assert_eq!(warnings[0].parameter, "width");
        }
    }

    #[test]
    fn test_missing_dimension_defaults_to_one() {
        let params = SessionParams {
            new_type: Some("size".into()),
            height: None,
            width: Some("12.6".into()),
        };
        let (space, warnings) = resolve_image_space(&params, ViewportSpace::new(100.0, 100.0));
        assert_eq!(space, ImageSpace::new(13, 1));
        assert_eq!(warnings[0].to_string(), "Missing parameter height");
    }

    #[test]
    fn test_huge_dimension_is_capped() {
        let params = SessionParams::sized("1e12", "5");
        let (space, _) = resolve_image_space(&params, ViewportSpace::new(1.0, 1.0));
        assert_eq!(space.width, MAX_IMAGE_SIDE);
    }

    #[test]
    fn test_unknown_new_type_falls_back_to_viewport() {
        let params = SessionParams {
            new_type: Some("photo".into()),
            height: Some("10".into()),
            width: Some("10".into()),
        };
        let (space, warnings) = resolve_image_space(&params, ViewportSpace::new(400.0, 300.0));
        assert_eq!(space, ImageSpace::new(368, 268));
        assert_eq!(warnings[0].parameter, "newType");
    }

    #[test]
    fn test_viewport_smaller_than_margin() {
        assert_eq!(viewport_image_space(ViewportSpace::new(20.0, 40.0)), ImageSpace::new(1, 8));
    }
}
