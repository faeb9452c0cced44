//! Product action widgets (`.product-actions[data-package]`).
//!
//! Each mounted widget is registered under its package so that every copy of
//! the same package (page, product popup) renders the same quantity.

use crate::basket;
use crate::dom;
use crate::events::Listener;
use crate::popup;
use crate::state::{App, DebounceGroup};
use crate::toast;
use gloo_console::warn;
use gloo_timers::future::sleep;
use sf_api_types::{AddPackageRequest, PackageId, PurchaseType, ToastKind};
use sf_basket::{BasketSync, StorefrontUi};
use sf_core::QUANTITY_DEBOUNCE;
use sf_core::ledger::Settlement;
use sf_core::quantity::{QuantityBounds, parse_quantity};
use sf_core::registry::{Scope, WidgetId};
use wasm_bindgen::JsCast;
use web_sys::{Element, Event, HtmlInputElement, MouseEvent};

pub fn quantity_input(within: &Element) -> Option<HtmlInputElement> {
    dom::query_within(within, "input.quantity")?.dyn_into().ok()
}

pub fn bounds_of(input: &HtmlInputElement) -> QuantityBounds {
    QuantityBounds::from_attrs(
        input.get_attribute("min").as_deref(),
        input.get_attribute("max").as_deref(),
    )
}

/// One stepper click. Garbage in the input counts as the lower bound.
pub fn step(input: &HtmlInputElement, up: bool) {
    let bounds = bounds_of(input);
    let current = parse_quantity(&input.value()).unwrap_or_else(|| i64::from(bounds.min));
    let next = if up {
        bounds.increment(current)
    } else {
        bounds.decrement(current)
    };
    input.set_value(&next.to_string());
}

/// Show the add buttons at zero, the quantity stepper otherwise.
pub fn render(actions: &Element, quantity: u32) {
    let empty = quantity == 0;
    for button in dom::query_all_within(actions, ".add, .subscribe") {
        dom::set_hidden(&button, !empty);
    }
    if let Some(field) = dom::query_within(actions, ".quantity-field") {
        dom::set_hidden(&field, empty);
        if let Some(input) = quantity_input(&field) {
            input.set_value(&quantity.to_string());
        }
    }
    if let Some(cta) = dom::query_within(actions, ".open-basket-cta") {
        dom::set_hidden(&cta, empty);
    }
}

pub fn render_package(app: &App, package_id: &PackageId, quantity: u32) {
    let instances: Vec<Element> = app.widgets.borrow().instances(package_id).cloned().collect();
    for actions in &instances {
        render(actions, quantity);
    }
}

/// Clamp an edited input in place and show the result on every other copy of
/// the package at once. Only the push waits for the debounce.
fn mirror(app: &App, id: WidgetId, input: &HtmlInputElement) {
    let Some(quantity) = bounds_of(input).parse_input(&input.value()) else {
        return;
    };
    let text = quantity.to_string();
    if input.value().trim() != text {
        input.set_value(&text);
    }
    let siblings: Vec<Element> = app.widgets.borrow().siblings(id).cloned().collect();
    for actions in &siblings {
        render(actions, quantity);
    }
}

/// Apply a settled push to every instance. `false` when the push failed.
pub fn apply_settlement(app: &App, package_id: &PackageId, settlement: Settlement) -> bool {
    match settlement {
        Settlement::Confirmed(_) => true,
        Settlement::RolledBack(quantity) => {
            render_package(app, package_id, quantity);
            false
        }
        Settlement::Kept(_) => false,
    }
}

fn widget(app: &App, id: WidgetId) -> Option<(Element, PackageId)> {
    let widgets = app.widgets.borrow();
    Some((widgets.get(id)?.clone(), widgets.package_of(id)?.clone()))
}

/// Register and wire every widget under `root`.
pub fn wire_all(app: &App, root: &Element, scope: Scope) {
    for actions in dom::query_all_within(root, ".product-actions[data-package]") {
        wire(app, &actions, scope);
    }
}

fn wire(app: &App, actions: &Element, scope: Scope) {
    let Some(package_id) = dom::data(actions, "package").map(PackageId) else {
        return;
    };
    let raw_type = dom::data(actions, "package-type").unwrap_or_default();
    let input = quantity_input(actions);
    if let Some(input) = &input {
        let quantity = bounds_of(input).clamp_input(&input.value());
        app.ledger.borrow_mut().observe(&package_id, quantity);
    }
    let id = app
        .widgets
        .borrow_mut()
        .register(package_id.clone(), scope, actions.clone());

    for (selector, purchase_type) in [(".add", PurchaseType::Single), (".subscribe", PurchaseType::Subscribe)] {
        let Some(button) = dom::query_within(actions, selector) else {
            continue;
        };
        let app2 = app.clone();
        app.keep(
            scope,
            Listener::new(&button, "click", move |e: MouseEvent| {
                e.prevent_default();
                let app = app2.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    add_clicked(&app, id, purchase_type).await;
                });
            }),
        );
    }

    if let Some(gift) = dom::query_within(actions, ".gift") {
        let app2 = app.clone();
        let package_id = package_id.clone();
        app.keep(
            scope,
            Listener::new(&gift, "click", move |e: MouseEvent| {
                e.prevent_default();
                let app = app2.clone();
                let package_id = package_id.clone();
                let raw_type = raw_type.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    if let Some(purchase_type) = app.actions().gift_clicked(&package_id, &raw_type).await {
                        app.open_gift_form(&package_id, purchase_type);
                    }
                });
            }),
        );
    }

    let Some(input) = input else {
        return;
    };
    for (selector, up) in [("button.decrease", false), ("button.increase", true)] {
        let Some(button) = dom::query_within(actions, selector) else {
            continue;
        };
        let app2 = app.clone();
        let input = input.clone();
        app.keep(
            scope,
            Listener::new(&button, "click", move |e: MouseEvent| {
                e.prevent_default();
                step(&input, up);
                mirror(&app2, id, &input);
                schedule(&app2, id);
            }),
        );
    }
    let app2 = app.clone();
    let field = input.clone();
    app.keep(
        scope,
        Listener::new(&input, "input", move |_: Event| {
            mirror(&app2, id, &field);
            schedule(&app2, id);
        }),
    );
}

async fn add_clicked(app: &App, id: WidgetId, purchase_type: PurchaseType) {
    let Some((actions, package_id)) = widget(app, id) else {
        return;
    };
    if !app.widgets.borrow_mut().begin_update(id) {
        return;
    }
    let parked = app.constants.must_login();
    if !parked {
        dom::add_class(&actions, "updating");
    }
    let outcome = app.actions().add_clicked(&package_id, purchase_type).await;
    dom::remove_class(&actions, "updating");
    app.widgets.borrow_mut().finish_update(id);
    let Some(outcome) = outcome else {
        return;
    };

    if outcome.closes_origin() {
        if let Some(parent) = app.popup_containing(&actions) {
            popup::close_popup(app, &parent, true, true);
        }
    }
    app.actions()
        .follow_up(AddPackageRequest::new(package_id, purchase_type), outcome)
        .await;
}

fn schedule(app: &App, id: WidgetId) {
    let group = DebounceGroup::Widget(id);
    let ticket = app.debounce.borrow_mut().trigger(&group);
    let app = app.clone();
    wasm_bindgen_futures::spawn_local(async move {
        sleep(QUANTITY_DEBOUNCE).await;
        let fire = app.debounce.borrow_mut().fire(&group, ticket);
        if fire {
            quantity_changed(&app, id).await;
        }
    });
}

async fn quantity_changed(app: &App, id: WidgetId) {
    let Some((actions, package_id)) = widget(app, id) else {
        return;
    };
    let Some(input) = quantity_input(&actions) else {
        return;
    };
    let Some(quantity) = bounds_of(&input).parse_input(&input.value()) else {
        // Cleared and left empty: show the known quantity again, push nothing.
        let shown = app.ledger.borrow().shown(&package_id);
        render_package(app, &package_id, shown);
        return;
    };
    if !app.widgets.borrow_mut().begin_update(id) {
        // Still busy with an earlier push or add; retry once it is done.
        schedule(app, id);
        return;
    }

    dom::add_class(&actions, "updating");
    render_package(app, &package_id, quantity);

    let settlement = BasketSync::new(&app.backend, &app.ledger)
        .push_package(&package_id, &input.name(), quantity)
        .await;
    if !apply_settlement(app, &package_id, settlement) {
        toast::new_toast(&app.translate("Failed to update basket"), ToastKind::Error);
    }

    if app.is_basket_open() {
        basket::refresh(app).await;
    }
    dom::remove_class(&actions, "updating");
    app.widgets.borrow_mut().finish_update(id);
}

/// A package's basket quantity changed server-side (added, removed).
pub async fn package_state_changed(app: &App, package_id: &PackageId, count: u32) {
    app.widgets.borrow_mut().settle(package_id);
    app.ledger.borrow_mut().observe(package_id, count);
    let instances: Vec<Element> = app.widgets.borrow().instances(package_id).cloned().collect();
    for actions in &instances {
        dom::remove_class(actions, "updating");
        render(actions, count);
    }

    if count > 0 {
        popup::open_basket(app, true).await;
    } else if app.is_basket_open() {
        if !basket::refresh(app).await {
            warn!(format!("basket refresh after removing {package_id} failed"));
        }
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    const WIDGET: &str = r#"<div class="product-actions" data-package="14">
        <button class="add" hidden>Add</button>
        <div class="quantity-field">
            <button class="decrease">-</button>
            <input class="quantity" name="quantity[14]" value="1" min="0">
            <button class="increase">+</button>
        </div>
    </div>"#;

    fn mounted(html: &str) -> Element {
        let root = dom::create_element("div").unwrap();
        root.set_inner_html(html);
        dom::body().append_child(&root).unwrap();
        root.into()
    }

    fn app() -> App {
        App::new("http://localhost".into(), "http://localhost/".into(), "Store".into())
    }

    #[wasm_bindgen_test]
    fn a_stepper_click_updates_every_copy_at_once() {
        let app = app();
        let grid = mounted(WIDGET);
        let product = mounted(WIDGET);
        wire_all(&app, &grid, Scope::Page);
        wire_all(&app, &product, Scope::Popup(900));

        let increase: web_sys::HtmlElement = dom::query_within(&grid, "button.increase")
            .unwrap()
            .dyn_into()
            .unwrap();
        increase.click();

        assert_eq!(quantity_input(&grid).unwrap().value(), "2");
        assert_eq!(quantity_input(&product).unwrap().value(), "2");
        grid.remove();
        product.remove();
    }

    #[wasm_bindgen_test]
    fn typing_is_mirrored_but_a_cleared_field_is_not() {
        let app = app();
        let grid = mounted(WIDGET);
        let product = mounted(WIDGET);
        wire_all(&app, &grid, Scope::Page);
        wire_all(&app, &product, Scope::Popup(901));

        let input = quantity_input(&grid).unwrap();
        input.set_value("4");
        input.dispatch_event(&Event::new("input").unwrap()).unwrap();
        assert_eq!(quantity_input(&product).unwrap().value(), "4");

        input.set_value("");
        input.dispatch_event(&Event::new("input").unwrap()).unwrap();
        assert_eq!(quantity_input(&product).unwrap().value(), "4");
        assert_eq!(input.value(), "");
        grid.remove();
        product.remove();
    }
}

