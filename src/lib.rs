#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod error;
pub mod geometry;
pub mod input;
pub mod palette;
pub mod renderer;
pub mod session;
pub mod settings;
pub mod stroke;
pub mod texture;
pub mod util;

pub use app::PaintApp;
pub use error::{PaintError, PaintResult};
pub use geometry::{ImageSpace, ViewportSpace, map_to_image};
pub use input::{Gesture, GestureConfig, GestureRecognizer, PointerNormalizer, RawInput};
pub use palette::{Palette, StrokeStyle, StyleChoice};
pub use renderer::{ExportedImage, StrokeRenderer};
pub use session::{PaintSession, SessionParams};
pub use stroke::Stroke;
