use egui::{ColorImage, Context, TextureHandle, TextureId, TextureOptions};
use log::debug;

use crate::renderer::CanvasSurface;

/// GPU copy of the canvas surface, re-uploaded only when the surface changed
#[derive(Default)]
pub struct CanvasTexture {
    handle: Option<TextureHandle>,
    /// (surface version, width, height) of the last upload
    uploaded: Option<(u64, u32, u32)>,
}

impl CanvasTexture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure the texture shows `surface` and return its id
    pub fn sync(&mut self, ctx: &Context, surface: &CanvasSurface) -> TextureId {
        let key = (surface.version(), surface.width(), surface.height());
        match self.handle.as_mut() {
            Some(handle) if self.uploaded == Some(key) => return handle.id(),
            Some(handle) => handle.set(color_image(surface), TextureOptions::LINEAR),
            None => {
                let image = color_image(surface);
                self.handle = Some(ctx.load_texture("canvas", image, TextureOptions::LINEAR));
            }
        }
        debug!("Uploaded canvas texture v{}", key.0);
        self.uploaded = Some(key);
        self.handle.as_ref().map_or(TextureId::default(), TextureHandle::id)
    }

    /// Forget the texture, e.g. when the session starts over
    pub fn clear(&mut self) {
        self.handle = None;
        self.uploaded = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.handle.is_some()
    }
}

fn color_image(surface: &CanvasSurface) -> ColorImage {
    ColorImage::from_rgba_unmultiplied(
        [surface.width() as usize, surface.height() as usize],
        surface.pixels().as_raw(),
    )
}
