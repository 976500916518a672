//! Browser-only listener registration.

use wasm_bindgen::JsCast as _;
use wasm_bindgen::prelude::*;
use web_sys::{AddEventListenerOptions, Document, EventTarget, TouchEvent};

use super::{ListenerKind, Subscription, should_suppress};

/// Register document-level `touchstart` and `touchmove` listeners that cancel
/// pinch-zoom as soon as a second finger is down. Both are non-passive, so
/// `preventDefault` takes effect. The listeners live as long as the returned
/// handle.
pub fn install_zoom_guard(document: &Document) -> Result<Subscription, JsValue> {
    let closure = Closure::<dyn FnMut(TouchEvent)>::new(|event: TouchEvent| {
        if should_suppress(event.touches().length() as usize) {
            event.prevent_default();
        }
    });

    let options = AddEventListenerOptions::new();
    options.set_passive(false);

    let target: EventTarget = document.clone().into();
    for kind in ListenerKind::ZOOM_GUARD {
        target.add_event_listener_with_callback_and_add_event_listener_options(
            kind.event_name(),
            closure.as_ref().unchecked_ref(),
            &options,
        )?;
        log::debug!("Installed non-passive {} listener", kind.event_name());
    }

    Ok(Subscription::new(move || {
        for kind in ListenerKind::ZOOM_GUARD {
            if let Err(err) = target.remove_event_listener_with_callback(
                kind.event_name(),
                closure.as_ref().unchecked_ref(),
            ) {
                log::warn!("Failed to remove {} listener: {:?}", kind.event_name(), err);
            }
        }
        drop(closure);
    }))
}

/// Query string of the current page, without the leading `?`
pub fn location_query() -> Option<String> {
    let search = web_sys::window()?.location().search().ok()?;
    Some(search.trim_start_matches('?').to_owned())
}
