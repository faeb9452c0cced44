//! Wire a freshly mounted subtree (the page at boot, or a popup's content).

use crate::dom;
use crate::events::Listener;
use crate::forms;
use crate::package;
use crate::popup;
use crate::state::App;
use crate::widgets;
use sf_core::registry::Scope;
use sf_core::routing;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlAnchorElement, MouseEvent};

pub fn wire(app: &App, root: &Element, scope: Scope) {
    popup_links(app, root, scope);
    package::wire_all(app, root, scope);
    basket_buttons(app, root, scope);
    widgets::countdowns(app, root, scope);
    forms::bind_quote_form(app, root, scope);
}

/// Links to popup-eligible pages open in place unless marked `data-no-popup`.
fn popup_links(app: &App, root: &Element, scope: Scope) {
    for link in dom::query_all_within(root, "a[href]:not([data-no-popup])") {
        let Ok(link) = link.dyn_into::<HtmlAnchorElement>() else {
            continue;
        };
        if !routing::is_popup_url(&app.origin, &link.href()) {
            continue;
        }
        let app2 = app.clone();
        let href = link.href();
        app.keep(
            scope,
            Listener::new(&link, "click", move |e: MouseEvent| {
                if popup::open_link(&app2, &href) {
                    e.prevent_default();
                }
            }),
        );
    }
}

fn basket_buttons(app: &App, root: &Element, scope: Scope) {
    for button in dom::query_all_within(root, "button.open-basket") {
        let app2 = app.clone();
        app.keep(
            scope,
            Listener::new(&button, "click", move |e: MouseEvent| {
                e.prevent_default();
                let app = app2.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    popup::open_basket(&app, true).await;
                });
            }),
        );
    }
}
