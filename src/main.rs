#![warn(clippy::all, rust_2018_idioms)]
// Hide the console window on Windows in release
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use fingerpaint::session::SessionParams;

// When compiling natively:
#[cfg(not(target_arch = "wasm32"))]
fn main() -> eframe::Result {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    // `fingerpaint "newType=size&width=640&height=480"`
    let params = std::env::args()
        .nth(1)
        .map(|query| SessionParams::from_query(&query))
        .unwrap_or_default();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([800.0, 600.0])
            .with_min_inner_size([200.0, 200.0]),
        ..Default::default()
    };
    eframe::run_native(
        "fingerpaint",
        native_options,
        Box::new(|cc| Ok(Box::new(fingerpaint::PaintApp::new(cc, params)))),
    )
}

// When compiling to web using trunk:
#[cfg(target_arch = "wasm32")]
fn main() {
    use wasm_bindgen::JsCast as _;

    // Redirect `log` message to `console.log` and friends:
    eframe::WebLogger::init(log::LevelFilter::Debug).ok();

    let web_options = eframe::WebOptions::default();
    let params = fingerpaint::input::web::location_query()
        .map(|query| SessionParams::from_query(&query))
        .unwrap_or_default();

    wasm_bindgen_futures::spawn_local(async {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document to attach to");
            return;
        };

        let canvas = match document.get_element_by_id("the_canvas_id") {
            Some(element) => element.dyn_into::<web_sys::HtmlCanvasElement>(),
            None => {
                log::error!("Failed to find the_canvas_id");
                return;
            }
        };
        let canvas = match canvas {
            Ok(canvas) => canvas,
            Err(_) => {
                log::error!("the_canvas_id was not a HtmlCanvasElement");
                return;
            }
        };

        let start_result = eframe::WebRunner::new()
            .start(
                canvas,
                web_options,
                Box::new(|cc| Ok(Box::new(fingerpaint::PaintApp::new(cc, params)))),
            )
            .await;

        if let Err(err) = start_result {
            log::error!("Failed to start eframe: {:?}", err);
        }
    });
}
