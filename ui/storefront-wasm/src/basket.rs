//! The basket popup: quantity editing, removal, refresh, and checkout.

use crate::api;
use crate::checkout;
use crate::dom;
use crate::events::Listener;
use crate::package;
use crate::popup::{self, Popup};
use crate::state::{App, DebounceGroup};
use crate::toast;
use gloo_console::warn;
use gloo_timers::future::sleep;
use sf_api_types::{BASKET_PATH, PackageId, ToastKind};
use sf_basket::{BasketSync, StorefrontUi};
use sf_core::QUANTITY_DEBOUNCE;
use sf_core::quantity::{BasketQuantities, QuantityPush};
use std::rc::Rc;
use web_sys::{Element, Event, HtmlElement, HtmlInputElement, MouseEvent};

/// Parts of the basket swapped in place on refresh.
const REFRESHED: [&str; 5] = [
    ".basket-header",
    ".basket-second-header",
    ".basket-content",
    ".basket-checkout .total",
    ".basket-redeem .redeemed",
];

/// Re-fetch the basket and swap its parts in place. An emptied basket closes.
pub async fn refresh(app: &App) -> bool {
    let Some(popup) = app.basket_popup() else {
        warn!("refresh(): basket is not mounted");
        return false;
    };
    let html = match api::fetch_page(&app.url(BASKET_PATH), None).await {
        Ok(html) => html,
        Err(err) => {
            warn!(format!("refresh(): could not fetch basket: {err}"));
            return false;
        }
    };
    let Some(found) = dom::extract(&html, "form.basket") else {
        popup::close_popup(app, &popup, true, true);
        return false;
    };

    for selector in REFRESHED {
        let Some(current) = dom::query_within(&popup.content, selector) else {
            continue;
        };
        let Ok(Some(fresh)) = found.content.query_selector(selector) else {
            continue;
        };
        if let Err(e) = current.replace_with_with_node_1(&fresh) {
            warn!(format!("refresh(): could not replace {selector}"), e);
        }
    }
    bind(app, &popup);
    true
}

/// (Re)wire everything inside the basket. Previous bindings are dropped first.
pub fn bind(app: &App, popup: &Rc<Popup>) {
    app.drop_scope(popup.scope);
    let root: &Element = &popup.content;

    for item in dom::query_all_within(root, ".basket-item") {
        let (Some(package_id), Some(input)) = (dom::data(&item, "package"), package::quantity_input(&item)) else {
            continue;
        };
        let quantity = package::bounds_of(&input).clamp_input(&input.value());
        app.ledger.borrow_mut().observe(&PackageId(package_id), quantity);
    }

    for field in dom::query_all_within(root, ".quantity-field") {
        let Some(input) = package::quantity_input(&field) else {
            continue;
        };
        let package_id = dom::closest(&field, ".basket-item")
            .and_then(|item| dom::data(&item, "package"))
            .map(PackageId);
        for (selector, up) in [("button.decrease", false), ("button.increase", true)] {
            let Some(button) = dom::query_within(&field, selector) else {
                continue;
            };
            let app2 = app.clone();
            let input = input.clone();
            let content = popup.content.clone();
            let package_id = package_id.clone();
            app.keep(
                popup.scope,
                Listener::new(&button, "click", move |e: MouseEvent| {
                    e.prevent_default();
                    package::step(&input, up);
                    mirror(&app2, package_id.as_ref(), &input);
                    schedule(&app2, &content);
                }),
            );
        }
        let app2 = app.clone();
        let content = popup.content.clone();
        let field = input.clone();
        app.keep(
            popup.scope,
            Listener::new(&input, "input", move |_: Event| {
                mirror(&app2, package_id.as_ref(), &field);
                schedule(&app2, &content);
            }),
        );
    }

    for link in dom::query_all_within(root, ".basket-item a.remove") {
        let Some(package_id) = dom::closest(&link, ".basket-item")
            .and_then(|item| dom::data(&item, "package"))
            .map(PackageId)
        else {
            continue;
        };
        let app2 = app.clone();
        let content = popup.content.clone();
        app.keep(
            popup.scope,
            Listener::new(&link, "click", move |e: MouseEvent| {
                e.prevent_default();
                let app = app2.clone();
                let content = content.clone();
                let package_id = package_id.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    remove(&app, &content, &package_id).await;
                });
            }),
        );
    }

    checkout::bind_button(app, root, popup.scope);
}

/// Show a basket edit on the package's widgets at once; the push is debounced.
fn mirror(app: &App, package_id: Option<&PackageId>, input: &HtmlInputElement) {
    let Some(quantity) = package::bounds_of(input).parse_input(&input.value()) else {
        return;
    };
    let text = quantity.to_string();
    if input.value().trim() != text {
        input.set_value(&text);
    }
    if let Some(package_id) = package_id {
        package::render_package(app, package_id, quantity);
    }
}

fn schedule(app: &App, content: &HtmlElement) {
    let ticket = app.debounce.borrow_mut().trigger(&DebounceGroup::Basket);
    let app = app.clone();
    let content = content.clone();
    wasm_bindgen_futures::spawn_local(async move {
        sleep(QUANTITY_DEBOUNCE).await;
        let fire = app.debounce.borrow_mut().fire(&DebounceGroup::Basket, ticket);
        if fire {
            quantities_changed(&app, &content).await;
        }
    });
}

async fn quantities_changed(app: &App, content: &HtmlElement) {
    let mut quantities = BasketQuantities::new();
    for item in dom::query_all_within(content, ".basket-item") {
        let (Some(package_id), Some(input)) = (dom::data(&item, "package"), package::quantity_input(&item)) else {
            continue;
        };
        let package_id = PackageId(package_id);
        let Some(quantity) = package::bounds_of(&input).parse_input(&input.value()) else {
            // Left empty: restore the known quantity and leave the line alone.
            let shown = app.ledger.borrow().shown(&package_id);
            input.set_value(&shown.to_string());
            continue;
        };
        package::render_package(app, &package_id, quantity);
        quantities.set(package_id, input.name(), quantity);
    }
    if quantities.is_empty() {
        return;
    }

    dom::add_class(content, "updating");
    let settled = BasketSync::new(&app.backend, &app.ledger)
        .push_basket(&quantities)
        .await;
    let mut failed = false;
    for (package_id, settlement) in &settled {
        if !package::apply_settlement(app, package_id, *settlement) {
            failed = true;
        }
    }
    if failed {
        toast::new_toast(&app.translate("Failed to update basket"), ToastKind::Error);
    }

    if app.is_basket_open() {
        refresh(app).await;
    }
    dom::remove_class(content, "updating");
}

async fn remove(app: &App, content: &HtmlElement, package_id: &PackageId) {
    dom::add_class(content, "updating");
    let result = BasketSync::new(&app.backend, &app.ledger)
        .push(&QuantityPush::Remove(package_id.clone()))
        .await;
    match result {
        Ok(()) => package::package_state_changed(app, package_id, 0).await,
        Err(err) => {
            warn!(format!("remove(): {package_id}: {err}"));
            toast::new_toast(&app.translate("Failed to update basket"), ToastKind::Error);
            refresh(app).await;
        }
    }
    dom::remove_class(content, "updating");
}
