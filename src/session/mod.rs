//! The paint session: wires input, gestures, coordinate mapping and the
//! renderer together and owns the session-wide state.

use egui::Rect;
use log::{debug, error, info, warn};

use crate::error::{PaintError, PaintResult};
use crate::geometry::{ImageSpace, ViewportSpace, map_to_image};
use crate::input::{
    Gesture, GestureConfig, GestureRecognizer, PointerEventKind, PointerNormalizer, RawInput,
};
use crate::palette::{Palette, StrokeStyle, StyleChoice};
use crate::renderer::StrokeRenderer;
use crate::util::Timestamp;

mod collaborators;
mod params;

#[cfg(not(target_arch = "wasm32"))]
pub use collaborators::DirectoryStore;
pub use collaborators::{
    AnonymousAuth, Auth, MemoryStore, Navigator, RouteQueue, UploadError, UploadRequest, Uploader,
};
pub use params::{
    APP_SPACE, InvalidParameterWarning, MAX_IMAGE_SIDE, SessionParams, limit_image_space,
    resolve_image_space, viewport_image_space,
};

/// Where a successful save goes
pub const HISTORY_PATH: &str = "/history";
/// Where "start new" goes
pub const NEW_PATH: &str = "/new";

/// Everything about a session that changes through user actions
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub viewport: ViewportSpace,
    pub image_space: ImageSpace,
    pub style: StyleChoice,
    /// First-run hint; a long point anywhere dismisses it
    pub tutorial_visible: bool,
    pub menu_visible: bool,
    /// An upload is pending; the canvas must not be touched
    pub saving: bool,
}

impl SessionState {
    /// Returns true if pointer input over the canvas draws
    pub fn canvas_active(&self) -> bool {
        !self.tutorial_visible && !self.menu_visible && !self.saving
    }
}

/// What one raw event did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputOutcome {
    /// The platform default (pinch-zoom, scroll) must be prevented
    pub prevent_default: bool,
    /// Gestures acted on, in order
    pub gestures: Vec<Gesture>,
}

/// Orchestrates one drawing session from start to save.
#[derive(Debug)]
pub struct PaintSession {
    state: SessionState,
    palette: Palette,
    normalizer: PointerNormalizer,
    recognizer: GestureRecognizer,
    canvas: Option<StrokeRenderer>,
    warnings: Vec<InvalidParameterWarning>,
}

impl PaintSession {
    /// Fix the session geometry and initial state. The canvas itself is not
    /// materialized until [`PaintSession::materialize_canvas`].
    pub fn start(
        params: &SessionParams,
        viewport: ViewportSpace,
        palette: Palette,
        gestures: GestureConfig,
    ) -> Self {
        let (image_space, warnings) = resolve_image_space(params, viewport);
        info!(
            "Starting session: image {}x{}, viewport {}x{}",
            image_space.width,
            image_space.height,
            viewport.width(),
            viewport.height()
        );
        Self {
            state: SessionState {
                viewport,
                image_space,
                style: palette.default_choice(),
                tutorial_visible: true,
                menu_visible: true,
                saving: false,
            },
            palette,
            normalizer: PointerNormalizer::new(),
            recognizer: GestureRecognizer::new(gestures),
            canvas: None,
            warnings,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Session parameters that were rejected at start
    pub fn warnings(&self) -> &[InvalidParameterWarning] {
        &self.warnings
    }

    pub fn style(&self) -> StrokeStyle {
        self.palette.resolve(self.state.style)
    }

    pub fn canvas(&self) -> Option<&StrokeRenderer> {
        self.canvas.as_ref()
    }

    /// Create the drawing surface if it does not exist yet
    pub fn materialize_canvas(&mut self) -> &StrokeRenderer {
        let image_space = self.state.image_space;
        self.canvas.get_or_insert_with(|| {
            debug!("Canvas materialized");
            StrokeRenderer::new(image_space)
        })
    }

    /// Drop the drawing surface, e.g. when its element goes away
    pub fn release_canvas(&mut self) -> Option<StrokeRenderer> {
        self.recognizer.reset();
        self.canvas.take()
    }

    /// Update the canvas element rectangle in page space.
    ///
    /// The image is stretched over the whole element, so the element size is
    /// the viewport points are mapped from. The image size never changes.
    pub fn set_target_rect(&mut self, rect: Rect) {
        self.normalizer.set_target_rect(rect);
        let viewport = ViewportSpace::new(rect.width(), rect.height());
        if viewport != self.state.viewport {
            debug!(
                "Viewport resized to {}x{}",
                viewport.width(),
                viewport.height()
            );
            self.state.viewport = viewport;
        }
    }

    /// Shrink the image so neither side exceeds `max_side`, e.g. the GPU
    /// texture limit. Only possible before the canvas materializes; returns
    /// true if the image space changed.
    pub fn limit_image_side(&mut self, max_side: u32) -> bool {
        if self.canvas.is_some() {
            warn!("Canvas already materialized, keeping its size");
            return false;
        }
        let (image_space, warnings) = limit_image_space(self.state.image_space, max_side);
        if warnings.is_empty() {
            return false;
        }
        self.state.image_space = image_space;
        self.warnings.extend(warnings);
        true
    }

    /// Earliest time [`PaintSession::tick`] has work to do
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.recognizer.next_deadline()
    }

    fn listening(&self) -> bool {
        self.state.tutorial_visible || self.state.canvas_active()
    }

    /// Feed one raw input event
    pub fn handle_input(&mut self, raw: RawInput) -> InputOutcome {
        let normalized = self.normalizer.normalize(raw);
        let mut outcome = InputOutcome {
            prevent_default: normalized.prevent_default,
            gestures: Vec::new(),
        };
        let Some(event) = normalized.event else {
            return outcome;
        };
        // Samples arriving while the menu is open are discarded outright.
        if !self.listening() {
            return outcome;
        }

        if event.kind == PointerEventKind::Cancel {
            self.close_stroke();
        }
        for gesture in self.recognizer.handle(&event) {
            self.dispatch(gesture);
            outcome.gestures.push(gesture);
        }
        outcome
    }

    /// Let timers fire. Call whenever the event loop gets control.
    pub fn tick(&mut self, now: Timestamp) -> Vec<Gesture> {
        let Some(gesture) = self.recognizer.poll(now) else {
            return Vec::new();
        };
        if !self.listening() {
            return Vec::new();
        }
        self.dispatch(gesture);
        vec![gesture]
    }

    fn dispatch(&mut self, gesture: Gesture) {
        match gesture {
            Gesture::LongPoint { .. } => {
                if self.state.tutorial_visible {
                    info!("Tutorial dismissed");
                    self.state.tutorial_visible = false;
                    self.deactivate_canvas();
                } else if !self.state.menu_visible {
                    self.show_menu();
                }
            }
            Gesture::DragStart { origin } => {
                if !self.state.canvas_active() {
                    return;
                }
                let style = self.style();
                let point = self.to_image(origin);
                if let Some(canvas) = self.canvas.as_mut() {
                    canvas.begin_stroke(style);
                    canvas.extend_stroke(point);
                }
            }
            Gesture::DragMove { position } => {
                if !self.state.canvas_active() {
                    return;
                }
                let point = self.to_image(position);
                if let Some(canvas) = self.canvas.as_mut() {
                    canvas.extend_stroke(point);
                }
            }
            Gesture::DragEnd { .. } => self.close_stroke(),
            Gesture::Tap { position } => debug!("Tap at {:?} ignored", position),
        }
    }

    fn to_image(&self, device: egui::Pos2) -> egui::Pos2 {
        map_to_image(device, self.state.viewport, self.state.image_space)
    }

    fn close_stroke(&mut self) {
        if let Some(canvas) = self.canvas.as_mut() {
            canvas.end_stroke();
        }
    }

    fn deactivate_canvas(&mut self) {
        self.recognizer.reset();
        self.close_stroke();
    }

    /// Open the menu; drawing input stops until it is dismissed
    pub fn show_menu(&mut self) {
        if !self.state.menu_visible {
            info!("Menu opened");
        }
        self.state.menu_visible = true;
        self.deactivate_canvas();
    }

    /// Close the menu and hand input back to the canvas
    pub fn dismiss_menu(&mut self) {
        if self.state.tutorial_visible || !self.state.menu_visible {
            return;
        }
        info!("Menu closed");
        self.state.menu_visible = false;
        self.recognizer.reset();
    }

    /// Select a palette color. Returns false for an index outside the palette.
    pub fn select_color(&mut self, index: usize) -> bool {
        if index >= self.palette.colors().len() {
            warn!("Ignoring unknown color index {}", index);
            return false;
        }
        self.state.style.color_index = index;
        info!("Stroke color set to {}", self.palette.colors()[index]);
        true
    }

    /// Select a palette width. Returns false for an index outside the palette.
    pub fn select_width(&mut self, index: usize) -> bool {
        let Some(width) = self.palette.width(index) else {
            warn!("Ignoring unknown width index {}", index);
            return false;
        };
        self.state.style.width_index = index;
        info!("Stroke width set to {}", width);
        true
    }

    /// Restore a previously selected style if it fits this palette
    pub fn restore_style(&mut self, choice: StyleChoice) -> bool {
        if !self.palette.contains(choice) {
            return false;
        }
        self.state.style = choice;
        true
    }

    pub fn start_new(&mut self, navigator: &mut dyn Navigator) {
        navigator.navigate(NEW_PATH);
    }

    /// First half of a save: check readiness and export the surface.
    ///
    /// Fails with [`PaintError::NotReady`] before touching anything when the
    /// canvas has not materialized or no user id is available. On success the
    /// session is marked as saving and input stays suspended until
    /// [`PaintSession::finish_save`].
    pub fn begin_save(&mut self, auth: &dyn Auth) -> PaintResult<UploadRequest> {
        if self.state.saving {
            return Err(PaintError::SaveInProgress);
        }
        let canvas = self.canvas.as_mut().ok_or(PaintError::NotReady("Canvas"))?;
        let owner_id = auth.current_user_id().ok_or(PaintError::NotReady("User"))?;

        canvas.end_stroke();
        let blob = canvas.export()?;
        self.state.saving = true;
        self.recognizer.reset();
        Ok(UploadRequest { blob, owner_id })
    }

    /// Second half of a save: navigate away on success, stay put on failure
    pub fn finish_save(
        &mut self,
        result: Result<(), UploadError>,
        navigator: &mut dyn Navigator,
    ) -> PaintResult<()> {
        self.state.saving = false;
        match result {
            Ok(()) => {
                info!("Upload succeeded");
                navigator.navigate(HISTORY_PATH);
                Ok(())
            }
            Err(err) => {
                error!("Upload failed: {}", err);
                Err(err.into())
            }
        }
    }

    /// Export, upload and navigate in one go
    pub async fn save(
        &mut self,
        auth: &dyn Auth,
        uploader: &dyn Uploader,
        navigator: &mut dyn Navigator,
    ) -> PaintResult<()> {
        let request = self.begin_save(auth)?;
        let result = uploader.upload(request).await;
        self.finish_save(result, navigator)
    }
}
