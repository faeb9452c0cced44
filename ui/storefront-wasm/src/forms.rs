//! Form popups (package options, gift recipient) and the quote form.

use crate::api;
use crate::dom;
use crate::events::Listener;
use crate::popup::{self, DismissFn, Frame, Popup};
use crate::state::App;
use crate::toast;
use futures::channel::oneshot;
use gloo_console::warn;
use gloo_timers::future::sleep;
use sf_api_types::{
    ADD_PATH_PREFIX, AddPackageRequest, BASKET_HASH, PackageId, PurchaseType, ToastKind,
    package_page_path,
};
use sf_basket::StorefrontUi;
use sf_core::registry::Scope;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    DocumentFragment, Element, Event, HtmlElement, HtmlFormElement, HtmlInputElement, UrlSearchParams,
};

const LANDING_REDIRECT_DELAY: Duration = Duration::from_secs(3);

type Resolve = Rc<dyn Fn(bool)>;

fn resolver() -> (Resolve, oneshot::Receiver<bool>) {
    let (tx, rx) = oneshot::channel();
    let tx = RefCell::new(Some(tx));
    let resolve: Resolve = Rc::new(move |added: bool| {
        if let Some(tx) = tx.borrow_mut().take() {
            let _ = tx.send(added);
        }
    });
    (resolve, rx)
}

/// Show the server-rendered options form for a package and submit it.
/// Resolves once the package was added (`true`) or the popup was dismissed
/// or the submit failed (`false`).
pub async fn open_options_popup(
    app: &App,
    package_id: &PackageId,
    purchase_type: PurchaseType,
    form: DocumentFragment,
    gift_to: Option<String>,
) -> bool {
    let mut request = AddPackageRequest::new(package_id.clone(), purchase_type);
    request.gift_to = gift_to;
    match mount_options(app, request, form) {
        Ok(Some(rx)) => rx.await.unwrap_or(false),
        Ok(None) => false,
        Err(e) => {
            warn!("open_options_popup(): could not build popup", e);
            false
        }
    }
}

fn mount_options(
    app: &App,
    request: AddPackageRequest,
    form: DocumentFragment,
) -> Result<Option<oneshot::Receiver<bool>>, JsValue> {
    let (resolve, rx) = resolver();
    let on_dismiss: DismissFn = {
        let resolve = resolve.clone();
        Rc::new(move |app: &App, popup: &Rc<Popup>| {
            popup::close_popup(app, popup, false, true);
            resolve(false);
        })
    };
    let popup = Popup::mount(
        app,
        Frame {
            url: None,
            class_name: "product-options-popup",
            content_tag: "div",
            content_class_name: "store-product-options",
            cache: false,
            swipe: None,
            close_on_escape: false,
        },
        on_dismiss,
    )?;
    dom::set_scroll_lock(true);
    popup.content.append_child(&form)?;

    let Some(form) = dom::query_within(&popup.content, "form")
        .and_then(|f| f.dyn_into::<HtmlFormElement>().ok())
    else {
        warn!("open_options_popup(): options page has no form");
        popup::close_popup(app, &popup, false, true);
        return Ok(None);
    };

    let app2 = app.clone();
    let weak = Rc::downgrade(&popup);
    let target = form.clone();
    app.keep(
        popup.scope,
        Listener::new(&form, "submit", move |e: Event| {
            e.prevent_default();
            let app = app2.clone();
            let weak = weak.clone();
            let form = target.clone();
            let request = request.clone();
            let resolve = resolve.clone();
            wasm_bindgen_futures::spawn_local(async move {
                submit_options(&app, weak, &form, &request, resolve).await;
            });
        }),
    );
    Ok(Some(rx))
}

async fn submit_options(
    app: &App,
    popup: Weak<Popup>,
    form: &HtmlFormElement,
    request: &AddPackageRequest,
    resolve: Resolve,
) {
    if !form.report_validity() {
        toast::new_toast(&app.translate("Please fill in all fields"), ToastKind::Error);
        return;
    }

    let actions = dom::query_within(form, ".actions");
    if let Some(actions) = &actions {
        dom::add_class(actions, "updating");
    }
    let fields = api::form_fields(form);
    let added = app.actions().submit_options(request, &fields).await;
    if let Some(actions) = &actions {
        dom::remove_class(actions, "updating");
    }

    if added {
        if let Some(popup) = popup.upgrade() {
            popup::close_popup(app, &popup, false, true);
        }
        app.package_state_changed(&request.package_id, 1).await;
    }
    resolve(added);
}

/// Ask for the recipient's username, then add the package as a gift.
pub fn open_gift_form(app: &App, package_id: &PackageId, purchase_type: PurchaseType) -> Result<(), JsValue> {
    let on_dismiss: DismissFn = Rc::new(|app: &App, popup: &Rc<Popup>| {
        popup::close_popup(app, popup, false, true);
    });
    let popup = Popup::mount(
        app,
        Frame {
            url: None,
            class_name: "gift-form-popup",
            content_tag: "form",
            content_class_name: "text-content store-form",
            cache: false,
            swipe: None,
            close_on_escape: false,
        },
        on_dismiss,
    )?;

    let heading = dom::create_element("h2")?;
    heading.set_text_content(Some(&app.translate("Gift this package")));

    let input: HtmlInputElement = dom::create_element("input")?.unchecked_into();
    input.set_type("text");
    input.set_name("username");
    input.set_class_name("form-control");
    input.set_required(true);
    input.set_placeholder(&app.translate("Enter a username to gift this package to"));

    let actions = dom::create_element("div")?;
    actions.set_class_name("actions");
    let send = dom::create_element("button")?;
    send.set_class_name("btn-primary");
    send.set_attribute("type", "submit")?;
    send.set_text_content(Some(&app.translate("Send gift")));
    actions.append_child(&send)?;

    let first = popup.content.first_child();
    let field: &HtmlElement = &input;
    for node in [&heading, field, &actions] {
        popup.content.insert_before(node, first.as_ref())?;
    }

    let app2 = app.clone();
    let weak = Rc::downgrade(&popup);
    let package_id = package_id.clone();
    let username = input.clone();
    let form = popup.content.clone();
    app.keep(
        popup.scope,
        Listener::new(&popup.content, "submit", move |e: Event| {
            e.prevent_default();
            let app = app2.clone();
            let weak = weak.clone();
            let package_id = package_id.clone();
            let recipient = username.value();
            let actions = dom::query_within(&form, ".actions");
            wasm_bindgen_futures::spawn_local(async move {
                submit_gift(&app, weak, actions, &package_id, purchase_type, &recipient).await;
            });
        }),
    );

    input.focus()?;
    Ok(())
}

async fn submit_gift(
    app: &App,
    popup: Weak<Popup>,
    actions: Option<Element>,
    package_id: &PackageId,
    purchase_type: PurchaseType,
    username: &str,
) {
    if let Some(actions) = &actions {
        dom::add_class(actions, "updating");
    }
    let submitted = app.actions().submit_gift(package_id, purchase_type, username).await;
    if let Some(actions) = &actions {
        dom::remove_class(actions, "updating");
    }
    let Some((request, outcome)) = submitted else {
        return;
    };

    if outcome.closes_origin() {
        if let Some(popup) = popup.upgrade() {
            popup::close_popup(app, &popup, false, true);
        }
    }
    app.actions().follow_up(request, outcome).await;
}

/// Quote request form inside a quote popup.
pub fn bind_quote_form(app: &App, root: &Element, scope: Scope) {
    let Some(form) = dom::query_within(root, ".store-quote form")
        .and_then(|f| f.dyn_into::<HtmlFormElement>().ok())
    else {
        return;
    };

    let app2 = app.clone();
    let target = form.clone();
    app.keep(
        scope,
        Listener::new(&form, "submit", move |e: Event| {
            e.prevent_default();
            let app = app2.clone();
            let form = target.clone();
            wasm_bindgen_futures::spawn_local(async move {
                submit_quote(&app, &form).await;
            });
        }),
    );
}

async fn submit_quote(app: &App, form: &HtmlFormElement) {
    let fields = api::form_fields(form);
    let result = api::post_form(&form.action(), &fields).await;
    if let Some(popup) = app.popup_containing(form) {
        popup::close_popup(app, &popup, true, true);
    }
    match result {
        Ok(()) => toast::new_toast(&app.translate("Subscribed successfully!"), ToastKind::Success),
        Err(err) => {
            warn!(format!("quote request failed: {err}"));
            toast::new_toast(&app.translate("Failed to subscribe"), ToastKind::Error);
        }
    }
}

/// Landing on `/checkout/packages/add/{id}/{type}` after login with an
/// options form in the page: show it as a popup, then move on.
pub async fn options_after_login(app: &App) {
    let location = dom::window().location();
    let Ok(pathname) = location.pathname() else {
        return;
    };
    let Some(rest) = pathname.strip_prefix(ADD_PATH_PREFIX) else {
        return;
    };
    let mut segments = rest.split('/');
    let (Some(id), Some(raw_type)) = (segments.next(), segments.next()) else {
        return;
    };
    if id.is_empty() || raw_type.is_empty() {
        return;
    }
    let Some(inline) = dom::query("[data-popup].store-product-options") else {
        return;
    };

    let gift_to = location
        .search()
        .ok()
        .and_then(|search| UrlSearchParams::new_with_str(&search).ok())
        .and_then(|params| params.get("username"))
        .filter(|u| !u.is_empty());
    let form = dom::move_children(&inline);
    inline.remove();

    let package_id = PackageId::from(id);
    let added = open_options_popup(app, &package_id, PurchaseType::sanitize(raw_type), form, gift_to).await;
    if added {
        dom::navigate(&app.url(&format!("/{BASKET_HASH}")));
    } else {
        sleep(LANDING_REDIRECT_DELAY).await;
        app.navigate(&package_page_path(&package_id));
    }
}
