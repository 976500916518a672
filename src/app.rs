use std::time::Duration;

use egui::{Align2, Color32, Rect, Sense, pos2, vec2};
use futures::channel::oneshot;
use futures::executor::LocalPool;
use futures::task::LocalSpawnExt as _;
use log::{error, info, warn};

use crate::geometry::ViewportSpace;
use crate::input::{GestureConfig, InputHandler};
use crate::palette::{Palette, parse_hex_color};
use crate::session::{
    AnonymousAuth, HISTORY_PATH, NEW_PATH, PaintSession, RouteQueue, SessionParams, UploadError,
    Uploader,
};
use crate::settings::PaintSettings;
use crate::texture::CanvasTexture;
use crate::util::current_time_secs;

const TUTORIAL_HINT: &str = "Hint: long tap to open menu.";

/// Things the menu asked for during this frame
enum MenuAction {
    Color(usize),
    Width(usize),
    Save,
    New,
    Close,
}

/// The eframe shell around a [`PaintSession`]
pub struct PaintApp {
    params: SessionParams,
    palette: Palette,
    gestures: GestureConfig,
    settings: PaintSettings,
    session: Option<PaintSession>,
    input: InputHandler,
    texture: CanvasTexture,
    auth: AnonymousAuth,
    uploader: Box<dyn Uploader>,
    routes: RouteQueue,
    pool: LocalPool,
    pending_save: Option<oneshot::Receiver<Result<(), UploadError>>>,
    notice: Option<String>,
    #[cfg(target_arch = "wasm32")]
    _zoom_guard: Option<crate::input::Subscription>,
}

impl PaintApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>, params: SessionParams) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::light());

        #[cfg(not(target_arch = "wasm32"))]
        let uploader: Box<dyn Uploader> = Box::new(crate::session::DirectoryStore::new("uploads"));
        #[cfg(target_arch = "wasm32")]
        let uploader: Box<dyn Uploader> = Box::new(crate::session::MemoryStore::new());

        Self {
            params,
            palette: Palette::default(),
            gestures: GestureConfig::default(),
            settings: PaintSettings::load(cc.storage),
            session: None,
            input: InputHandler::new(),
            texture: CanvasTexture::new(),
            auth: AnonymousAuth::new(),
            uploader,
            routes: RouteQueue::new(),
            pool: LocalPool::new(),
            pending_save: None,
            notice: None,
            #[cfg(target_arch = "wasm32")]
            _zoom_guard: install_zoom_guard(),
        }
    }

    fn start_session(&mut self, screen: Rect, max_texture_side: usize) -> PaintSession {
        let viewport = ViewportSpace::new(screen.width(), screen.height());
        let mut session = PaintSession::start(
            &self.params,
            viewport,
            self.palette.clone(),
            self.gestures.clone(),
        );
        // The whole surface is uploaded as one texture
        session.limit_image_side(u32::try_from(max_texture_side).unwrap_or(u32::MAX));
        if let Some(choice) = self.settings.style_for(&self.palette) {
            session.restore_style(choice);
        }
        self.texture.clear();
        session
    }

    fn follow_routes(&mut self) {
        for path in self.routes.drain() {
            match path.as_str() {
                NEW_PATH => {
                    // A fresh canvas sized from the viewport
                    self.params = SessionParams::default();
                    self.notice = None;
                }
                HISTORY_PATH => self.notice = Some("Saved.".to_owned()),
                other => warn!("No page for {}", other),
            }
            self.session = None;
        }
    }

    fn poll_save(&mut self) {
        let Some(receiver) = self.pending_save.as_mut() else {
            return;
        };
        self.pool.run_until_stalled();
        let result = match receiver.try_recv() {
            Ok(None) => return,
            Ok(Some(result)) => result,
            Err(oneshot::Canceled) => Err(UploadError::Rejected("upload was dropped".to_owned())),
        };
        self.pending_save = None;
        if let Some(session) = self.session.as_mut() {
            if let Err(err) = session.finish_save(result, &mut self.routes) {
                self.notice = Some(err.to_string());
            }
        }
    }

    fn begin_save(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let request = match session.begin_save(&self.auth) {
            Ok(request) => request,
            Err(err) => {
                error!("Save failed: {}", err);
                self.notice = Some(err.to_string());
                return;
            }
        };
        self.notice = None;

        let upload = self.uploader.upload(request);
        let (sender, receiver) = oneshot::channel();
        let spawned = self.pool.spawner().spawn_local(async move {
            // The receiver only goes away with the app.
            let _ = sender.send(upload.await);
        });
        match spawned {
            Ok(()) => self.pending_save = Some(receiver),
            Err(err) => {
                let result = Err(UploadError::Rejected(err.to_string()));
                if let Err(err) = session.finish_save(result, &mut self.routes) {
                    self.notice = Some(err.to_string());
                }
            }
        }
    }

    fn apply(&mut self, action: MenuAction) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match action {
            MenuAction::Color(index) => {
                if session.select_color(index) {
                    self.settings.style = Some(session.state().style);
                }
            }
            MenuAction::Width(index) => {
                if session.select_width(index) {
                    self.settings.style = Some(session.state().style);
                }
            }
            MenuAction::Close => session.dismiss_menu(),
            MenuAction::New => session.start_new(&mut self.routes),
            MenuAction::Save => self.begin_save(),
        }
    }
}

fn menu_ui(ui: &mut egui::Ui, session: &PaintSession) -> Option<MenuAction> {
    let mut action = None;
    let palette = session.palette();
    let current = session.state().style;

    ui.horizontal(|ui| {
        for (index, hex) in palette.colors().iter().enumerate() {
            let fill = parse_hex_color(hex).unwrap_or(Color32::BLACK);
            let mut button = egui::Button::new("").fill(fill).min_size(vec2(32.0, 32.0));
            if index == current.color_index {
                button = button.stroke(egui::Stroke::new(3.0, Color32::DARK_GRAY));
            }
            if ui.add(button).clicked() {
                action = Some(MenuAction::Color(index));
            }
        }
    });
    ui.horizontal(|ui| {
        for (index, width) in palette.widths().iter().enumerate() {
            if ui
                .selectable_label(index == current.width_index, format!("{width}px"))
                .clicked()
            {
                action = Some(MenuAction::Width(index));
            }
        }
    });
    ui.separator();
    ui.horizontal(|ui| {
        let saving = session.state().saving;
        if ui.add_enabled(!saving, egui::Button::new("Save")).clicked() {
            action = Some(MenuAction::Save);
        }
        if ui.add_enabled(!saving, egui::Button::new("New")).clicked() {
            action = Some(MenuAction::New);
        }
        if ui.button("Close").clicked() {
            action = Some(MenuAction::Close);
        }
    });
    action
}

#[cfg(target_arch = "wasm32")]
fn install_zoom_guard() -> Option<crate::input::Subscription> {
    let document = web_sys::window()?.document()?;
    crate::input::web::install_zoom_guard(&document)
        .map_err(|err| log::warn!("Zoom guard not installed: {:?}", err))
        .ok()
}

impl eframe::App for PaintApp {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        self.settings.store(storage);
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.follow_routes();
        self.poll_save();

        let screen = ctx.screen_rect();
        if self.session.is_none() {
            let max_texture_side = ctx.input(|i| i.max_texture_side);
            let session = self.start_session(screen, max_texture_side);
            info!("Session ready");
            self.session = Some(session);
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        // The canvas fills the screen; mapping follows its current size.
        session.set_target_rect(screen);
        session.materialize_canvas();

        let now = current_time_secs();
        for raw in self.input.process_input(ctx, now) {
            session.handle_input(raw);
        }
        session.tick(now);

        let texture_id = session
            .canvas()
            .map(|canvas| self.texture.sync(ctx, canvas.surface()));

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                ui.allocate_rect(screen, Sense::hover());
                if let Some(texture_id) = texture_id {
                    let uv = Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));
                    ui.painter().image(texture_id, screen, uv, Color32::WHITE);
                }
            });

        let state = session.state().clone();
        let mut action = None;
        if state.tutorial_visible {
            egui::Area::new(egui::Id::new("tutorial"))
                .anchor(Align2::CENTER_CENTER, vec2(0.0, 0.0))
                .interactable(false)
                .show(ctx, |ui| {
                    egui::Frame::popup(ui.style()).show(ui, |ui| ui.heading(TUTORIAL_HINT));
                });
        } else if state.menu_visible {
            egui::Window::new("Menu")
                .collapsible(false)
                .resizable(false)
                .anchor(Align2::CENTER_CENTER, vec2(0.0, 0.0))
                .show(ctx, |ui| {
                    action = menu_ui(ui, session);
                    if state.saving {
                        ui.label("Saving...");
                    }
                    if let Some(notice) = &self.notice {
                        ui.colored_label(Color32::DARK_RED, notice);
                    }
                });
        }

        let deadline = session.next_deadline();
        if let Some(action) = action {
            self.apply(action);
        }

        if self.pending_save.is_some() {
            ctx.request_repaint();
        } else if let Some(deadline) = deadline {
            ctx.request_repaint_after(Duration::from_secs_f64((deadline - now).max(0.0)));
        }
    }
}
