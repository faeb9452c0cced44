//! Site navigation: open/close, submenu toggles, and the mobile drawer.

use crate::dom;
use crate::drawer::Drawer;
use crate::events;
use crate::platform;
use crate::state::App;
use sf_api_types::SwipeDirection;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Element, Event, HtmlElement, MouseEvent};

const OPEN_CLASS: &str = "show-navigation";

fn parts() -> Option<(HtmlElement, Element)> {
    let container: HtmlElement = dom::query(".site-navigation")?.dyn_into().ok()?;
    let menu = dom::query_within(&container, ".menu")?;
    Some((container, menu))
}

fn is_open() -> bool {
    dom::has_class(&dom::body(), OPEN_CLASS)
}

pub fn open(app: &App) {
    dom::add_class(&dom::body(), OPEN_CLASS);
    update_drawer(app);
}

pub fn close(app: &App) {
    dom::remove_class(&dom::body(), OPEN_CLASS);
    update_drawer(app);
}

/// Small screens get a swipe-left drawer while the menu is open.
pub fn update_drawer(app: &App) {
    let Some((container, menu)) = parts() else {
        return;
    };
    let previous = app.navigation.borrow_mut().take();
    if let Some(drawer) = previous {
        drawer.destroy();
    }

    let large = platform::large_breakpoint().is_some_and(|m| m.matches());
    if large || !is_open() {
        return;
    }
    let on_close = {
        let app = app.clone();
        move || close(&app)
    };
    let drawer = Drawer::attach(&container, &menu, SwipeDirection::Left, on_close);
    *app.navigation.borrow_mut() = drawer;
}

/// Expand one submenu item and collapse its siblings; a second click collapses it.
fn toggle_item(button: &Element) {
    let Some(item) = button.parent_element() else {
        return;
    };
    if dom::has_class(&item, "expanded") {
        dom::remove_class(&item, "expanded");
        return;
    }
    dom::add_class(&item, "expanded");
    let Some(list) = item.parent_element() else {
        return;
    };
    let siblings = list.children();
    for i in 0..siblings.length() {
        if let Some(other) = siblings.item(i) {
            if other != item {
                dom::remove_class(&other, "expanded");
            }
        }
    }
}

pub fn init(app: &App) {
    let Some((container, _)) = parts() else {
        return;
    };
    let Some(toggle) = dom::query(".toggle-navigation") else {
        return;
    };

    {
        let app = app.clone();
        on_click!(toggle, move |_: MouseEvent| {
            if is_open() {
                close(&app);
            } else {
                open(&app);
            }
        });
    }
    if let Some(close_button) = dom::query_within(&container, ".close-navigation") {
        let app = app.clone();
        on_click!(close_button, move |_: MouseEvent| close(&app));
    }
    {
        let app = app.clone();
        let backdrop: JsValue = container.clone().into();
        on_click!(container, move |e: MouseEvent| {
            if events::targets(&e, &backdrop) {
                close(&app);
            }
        });
    }
    for button in dom::query_all_within(&container, ".toggle") {
        let target = button.clone();
        on_click!(button, move |_: MouseEvent| toggle_item(&target));
    }

    update_drawer(app);
    if let Some(query) = platform::large_breakpoint() {
        let app = app.clone();
        events::listen(&query, "change", move |_: Event| update_drawer(&app));
    }
}
