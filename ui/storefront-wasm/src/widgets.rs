//! Small page widgets: countdowns and copy-to-clipboard buttons.

use crate::dom;
use crate::platform;
use crate::state::App;
use gloo_timers::callback::Interval;
use gloo_timers::future::sleep;
use sf_core::registry::Scope;
use sf_core::timing::format_countdown;
use std::cell::Cell;
use std::time::Duration;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Element, MouseEvent};

const COPIED_FOR: Duration = Duration::from_secs(3);

fn now_secs() -> i64 {
    (js_sys::Date::now() / 1000.0).floor() as i64
}

fn tick(el: &Element, ends_on: i64) -> bool {
    match format_countdown(ends_on - now_secs()) {
        Some(text) => {
            el.set_text_content(Some(&text));
            true
        }
        None => {
            el.set_text_content(Some(&platform::translate("Time Expired")));
            false
        }
    }
}

/// `[data-countdown]` holds seconds until the end. Each element is started
/// once; its interval stops at expiry.
pub fn countdowns(app: &App, root: &Element, scope: Scope) {
    for el in dom::query_all_within(root, "[data-countdown]") {
        if app.countdowns.has(&el) {
            continue;
        }
        let Some(seconds) = dom::data(&el, "countdown").and_then(|s| s.trim().parse::<i64>().ok()) else {
            continue;
        };
        app.countdowns.add(&el);

        let ends_on = now_secs() + seconds;
        if !tick(&el, ends_on) {
            continue;
        }
        let key = app.new_timer_key();
        let app2 = app.clone();
        let running = Cell::new(true);
        let interval = Interval::new(1000, move || {
            if running.get() && !tick(&el, ends_on) {
                running.set(false);
                let app = app2.clone();
                wasm_bindgen_futures::spawn_local(async move { app.cancel_interval(scope, key) });
            }
        });
        app.keep_interval(scope, key, interval);
    }
}

/// `[data-copy]` copies its value and shows "Copied!" for a moment.
pub fn copy_buttons() {
    for el in dom::query_all("[data-copy]") {
        let target = el.clone();
        on_click!(el, move |_: MouseEvent| {
            let el = target.clone();
            wasm_bindgen_futures::spawn_local(async move {
                copy(&el).await;
            });
        });
    }
}

async fn copy(el: &Element) {
    let text = dom::data(el, "copy").unwrap_or_default();
    if let Err(e) = platform::copy_to_clipboard(&text).await {
        gloo_console::warn!("clipboard write failed", e);
        return;
    }
    let content = el.inner_html();
    el.set_inner_html(&platform::translate("Copied!"));
    sleep(COPIED_FOR).await;
    el.set_inner_html(&content);
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn intervals(app: &App, scope: Scope) -> usize {
        app.mounted.borrow().get(&scope).map_or(0, |m| m.intervals.len())
    }

    #[wasm_bindgen_test]
    fn a_countdown_starts_once_per_element() {
        let app = App::new("http://localhost".into(), "http://localhost/".into(), "Store".into());
        let root = dom::create_element("div").unwrap();
        root.set_inner_html(r#"<span data-countdown="90061"></span><span data-countdown="0"></span>"#);
        let scope = Scope::Popup(950);

        countdowns(&app, &root, scope);
        countdowns(&app, &root, scope);

        assert_eq!(intervals(&app, scope), 1);
        let spans = dom::query_all_within(&root, "[data-countdown]");
        assert_eq!(spans[1].text_content().as_deref(), Some("Time Expired"));
        assert!(spans.iter().all(|el| !el.has_attribute("data-countdown-set")));
    }
}

