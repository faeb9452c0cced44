//! Event binding.
//!
//! Two flavours: [`listen`] for page-lifetime listeners (the closure is
//! leaked, like the rest of the page chrome) and [`Listener`] for anything
//! mounted inside a popup or drawer, which unbinds when dropped.
//!
//! Handlers that may unmount their own popup must do that work inside
//! `wasm_bindgen_futures::spawn_local`, never synchronously, so a listener is
//! never dropped while it is running.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{AddEventListenerOptions, Event, EventTarget};

/// Attach a sync click handler for the lifetime of the page.
macro_rules! on_click {
    ($el:expr, $cb:expr) => {{
        let cb = Closure::wrap(Box::new($cb) as Box<dyn FnMut(web_sys::MouseEvent)>);
        let _ = $el.add_event_listener_with_callback("click", cb.as_ref().unchecked_ref());
        cb.forget();
    }};
}

fn typed<E, F>(mut handler: F) -> Closure<dyn FnMut(Event)>
where
    E: JsCast + 'static,
    F: FnMut(E) + 'static,
{
    Closure::wrap(Box::new(move |event: Event| {
        if let Ok(event) = event.dyn_into::<E>() {
            handler(event);
        }
    }) as Box<dyn FnMut(Event)>)
}

/// Page-lifetime listener.
pub fn listen<E, F>(target: &EventTarget, event: &str, handler: F)
where
    E: JsCast + 'static,
    F: FnMut(E) + 'static,
{
    let cb = typed(handler);
    let _ = target.add_event_listener_with_callback(event, cb.as_ref().unchecked_ref());
    cb.forget();
}

/// A bound listener; removed from its target on drop.
pub struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    pub fn new<E, F>(target: &EventTarget, event: &'static str, handler: F) -> Self
    where
        E: JsCast + 'static,
        F: FnMut(E) + 'static,
    {
        let callback = typed(handler);
        let _ = target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref());
        Self {
            target: target.clone(),
            event,
            callback,
        }
    }

    /// Passive listener, for touch handlers that never call `preventDefault`.
    pub fn passive<E, F>(target: &EventTarget, event: &'static str, handler: F) -> Self
    where
        E: JsCast + 'static,
        F: FnMut(E) + 'static,
    {
        let callback = typed(handler);
        let options = AddEventListenerOptions::new();
        options.set_passive(true);
        let _ = target.add_event_listener_with_callback_and_add_event_listener_options(
            event,
            callback.as_ref().unchecked_ref(),
            &options,
        );
        Self {
            target: target.clone(),
            event,
            callback,
        }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
    }
}

/// `true` when the event fired on `el` itself rather than a descendant.
pub fn targets(event: &Event, el: &JsValue) -> bool {
    event
        .target()
        .is_some_and(|t| JsValue::from(t) == *el)
}
