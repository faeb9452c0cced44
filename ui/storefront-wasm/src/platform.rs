//! Page-provided globals.
//!
//! The webstore template injects `__kTemplateConstants`, a `__` translation
//! function, and the hosted checkout script (`Tebex`). None of them is
//! guaranteed to exist, so every accessor degrades quietly.

use crate::dom;
use gloo_console::warn;
use js_sys::Reflect;
use sf_api_types::{CheckoutConfig, TemplateConstants};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::MediaQueryList;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = "__", catch)]
    fn translate_global(text: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_namespace = ["Tebex", "checkout"], js_name = init, catch)]
    fn checkout_init(config: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(js_namespace = ["Tebex", "checkout"], js_name = launch, catch)]
    fn checkout_launch() -> Result<(), JsValue>;

    #[wasm_bindgen(js_namespace = ["Tebex", "checkout"], js_name = on, catch)]
    fn checkout_on(event: &JsValue, handler: &js_sys::Function) -> Result<(), JsValue>;

    #[wasm_bindgen(js_namespace = ["navigator", "clipboard"], js_name = writeText, catch)]
    fn clipboard_write_text(text: &str) -> Result<js_sys::Promise, JsValue>;
}

const CONSTANTS_GLOBAL: &str = "__kTemplateConstants";

/// Localize `text` through the page's `__`, falling back to the input.
pub fn translate(text: &str) -> String {
    translate_global(text)
        .ok()
        .and_then(|v| v.as_string())
        .unwrap_or_else(|| text.to_owned())
}

pub fn template_constants() -> TemplateConstants {
    let raw = Reflect::get(&js_sys::global(), &JsValue::from_str(CONSTANTS_GLOBAL))
        .unwrap_or(JsValue::UNDEFINED);
    if raw.is_undefined() || raw.is_null() {
        return TemplateConstants::default();
    }
    serde_wasm_bindgen::from_value(raw).unwrap_or_else(|e| {
        warn!(format!("{CONSTANTS_GLOBAL} is malformed: {e}"));
        TemplateConstants::default()
    })
}

fn global_path(path: &[&str]) -> Option<JsValue> {
    let mut value: JsValue = js_sys::global().into();
    for key in path {
        value = Reflect::get(&value, &JsValue::from_str(key)).ok()?;
        if value.is_undefined() || value.is_null() {
            return None;
        }
    }
    Some(value)
}

pub fn checkout_loaded() -> bool {
    global_path(&["Tebex", "checkout"]).is_some()
}

/// Run `handler` on every `PAYMENT_COMPLETE` from the hosted checkout.
pub fn on_payment_complete<F>(mut handler: F) -> Result<(), JsValue>
where
    F: FnMut() + 'static,
{
    let event = global_path(&["Tebex", "events", "PAYMENT_COMPLETE"])
        .ok_or_else(|| JsValue::from_str("Tebex.events.PAYMENT_COMPLETE is missing"))?;
    let cb = Closure::wrap(Box::new(move |_: JsValue| handler()) as Box<dyn FnMut(JsValue)>);
    checkout_on(&event, cb.as_ref().unchecked_ref())?;
    cb.forget();
    Ok(())
}

pub fn launch_checkout(config: &CheckoutConfig) -> Result<(), JsValue> {
    let value = serde_wasm_bindgen::to_value(config)?;
    checkout_init(&value)?;
    checkout_launch()
}

/// Write `text` to the clipboard. Resolves when the browser accepted it.
pub async fn copy_to_clipboard(text: &str) -> Result<(), JsValue> {
    let promise = clipboard_write_text(text)?;
    wasm_bindgen_futures::JsFuture::from(promise).await?;
    Ok(())
}

fn media_query(query: &str) -> Option<MediaQueryList> {
    dom::window().match_media(query).ok().flatten()
}

pub fn is_touch_device() -> bool {
    media_query("(pointer: coarse)").is_some_and(|m| m.matches())
}

pub fn large_breakpoint() -> Option<MediaQueryList> {
    media_query("(width > 960px)")
}

// ── localStorage ──

/// `localStorage` as a [`sf_storage::KeyValueStore`]. Values are stored raw.
pub struct BrowserStore {
    storage: web_sys::Storage,
}

impl BrowserStore {
    pub fn open() -> Option<Self> {
        let storage = dom::window().local_storage().ok()??;
        Some(Self { storage })
    }
}

impl sf_storage::KeyValueStore for BrowserStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).ok()?
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(e) = self.storage.set_item(key, value) {
            warn!(format!("localStorage.setItem({key}) failed"), e);
        }
    }

    fn remove(&self, key: &str) {
        let _ = self.storage.remove_item(key);
    }
}
