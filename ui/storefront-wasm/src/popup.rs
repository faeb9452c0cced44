//! Floating popups and the history entries that back them.
//!
//! Every popup (URL-backed or form) is a [`Popup`] owned by the app's popup
//! list. Its listeners and drawer live on the struct, and the widgets wired
//! inside it live in its registry scope, so unmounting releases all of them.

use crate::api;
use crate::dom;
use crate::drawer::Drawer;
use crate::events::{self, Listener};
use crate::mount;
use crate::platform;
use crate::state::App;
use gloo_console::warn;
use gloo_timers::future::sleep;
use sf_api_types::{BASKET_PATH, HistoryState, LOGIN_PATH, SwipeDirection};
use sf_basket::BackendError;
use sf_core::REMOVAL_SLACK;
use sf_core::history::{MountPlan, NavEffect};
use sf_core::registry::Scope;
use sf_core::routing::{self, PopupRoute};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use wasm_bindgen::prelude::*;
use web_sys::{AbortController, AbortSignal, HtmlElement, KeyboardEvent, MouseEvent, PopStateEvent};

/// What a backdrop click, the close button, or Escape does to a popup.
pub type DismissFn = Rc<dyn Fn(&App, &Rc<Popup>)>;

/// Static shape of a popup container.
pub struct Frame<'a> {
    pub url: Option<&'a str>,
    pub class_name: &'a str,
    pub content_tag: &'a str,
    pub content_class_name: &'a str,
    pub cache: bool,
    pub swipe: Option<SwipeDirection>,
    pub close_on_escape: bool,
}

pub struct Popup {
    pub url: Option<String>,
    pub container: HtmlElement,
    pub content: HtmlElement,
    pub scope: Scope,
    cache: bool,
    swipe: Option<SwipeDirection>,
    title: RefCell<Option<String>>,
    abort: Option<AbortController>,
    cancelled: Cell<bool>,
    wired: Cell<bool>,
    drawer: RefCell<Option<Drawer>>,
    listeners: RefCell<Vec<Listener>>,
}

impl Popup {
    /// Build the container, append it to `body`, and register it with the app.
    pub fn mount(app: &App, frame: Frame<'_>, on_dismiss: DismissFn) -> Result<Rc<Self>, JsValue> {
        let container = dom::create_element("div")?;
        container.set_class_name("popup");
        dom::add_classes(&container, frame.class_name);
        if let Some(url) = frame.url {
            container.set_attribute("data-url", url)?;
        }

        let scroll = dom::create_element("div")?;
        scroll.set_class_name("popup-scroll-cont");
        container.append_child(&scroll)?;

        let content = dom::create_element(frame.content_tag)?;
        content.set_class_name("popup-content");
        dom::add_classes(&content, frame.content_class_name);

        let close = dom::create_element("button")?;
        close.set_class_name("popup-close");
        // Form popups wrap their content in a <form>; never submit it.
        close.set_attribute("type", "button")?;
        close.set_text_content(Some(&platform::translate("Close")));
        content.append_child(&close)?;
        scroll.append_child(&content)?;

        let abort = match frame.url {
            Some(_) => Some(AbortController::new()?),
            None => None,
        };

        let popup = Rc::new_cyclic(|weak: &Weak<Popup>| {
            let dismiss = move || {
                let weak = weak.clone();
                let app = app.clone();
                let on_dismiss = on_dismiss.clone();
                move || {
                    if let Some(popup) = weak.upgrade() {
                        on_dismiss(&app, &popup);
                    }
                }
            };

            let mut listeners = Vec::new();
            {
                let dismiss = dismiss();
                let backdrop: JsValue = scroll.clone().into();
                listeners.push(Listener::new(&scroll, "mousedown", move |e: MouseEvent| {
                    if events::targets(&e, &backdrop) {
                        dismiss();
                    }
                }));
            }
            {
                let dismiss = dismiss();
                listeners.push(Listener::new(&close, "click", move |_: MouseEvent| dismiss()));
            }
            if frame.close_on_escape {
                let dismiss = dismiss();
                listeners.push(Listener::new(&dom::document(), "keydown", move |e: KeyboardEvent| {
                    if e.key() == "Escape" {
                        dismiss();
                    }
                }));
            }

            Popup {
                url: frame.url.map(str::to_owned),
                container: container.clone(),
                content: content.clone(),
                scope: app.new_popup_scope(),
                cache: frame.cache,
                swipe: frame.swipe,
                title: RefCell::new(None),
                abort,
                cancelled: Cell::new(false),
                wired: Cell::new(false),
                drawer: RefCell::new(None),
                listeners: RefCell::new(listeners),
            }
        });

        dom::body().append_child(&container)?;
        app.popups.borrow_mut().push(popup.clone());
        Ok(popup)
    }

    pub fn title(&self) -> Option<String> {
        self.title.borrow().clone()
    }

    fn signal(&self) -> Option<AbortSignal> {
        self.abort.as_ref().map(AbortController::signal)
    }

    /// Abort an in-flight content fetch and discard whatever arrives.
    pub fn cancel(&self) {
        self.cancelled.set(true);
        if let Some(abort) = &self.abort {
            abort.abort();
        }
    }

    /// `true` the first time only; scope wiring runs once per mount.
    pub fn take_wiring(&self) -> bool {
        !self.wired.replace(true)
    }

    /// (Re)attach the swipe drawer after the popup became visible.
    fn attach_drawer(self: &Rc<Self>, app: &App) {
        let Some(direction) = self.swipe else {
            return;
        };
        if self.drawer.borrow().as_ref().is_some_and(Drawer::is_active) {
            return;
        }
        let weak = Rc::downgrade(self);
        let app = app.clone();
        let remove = !self.cache;
        let drawer = Drawer::attach(&self.container, &self.content, direction, move || {
            if let Some(popup) = weak.upgrade() {
                close_popup(&app, &popup, true, remove);
            }
        });
        *self.drawer.borrow_mut() = drawer;
    }
}

/// Hide a popup. With `remove`, it leaves the DOM once the fade is over.
pub fn close_popup(app: &App, popup: &Rc<Popup>, push_history: bool, remove: bool) {
    dom::set_scroll_lock(false);

    if popup.container.hidden() {
        return;
    }

    if remove {
        let fade = dom::fade_duration(&popup.container) + REMOVAL_SLACK;
        let app = app.clone();
        let popup = popup.clone();
        wasm_bindgen_futures::spawn_local(async move {
            sleep(fade).await;
            if popup.container.hidden() {
                unmount(&app, &popup);
            }
        });
    }

    popup.container.set_hidden(true);

    if popup.url.is_some() {
        let effects = app.history.borrow_mut().close_popup(push_history);
        apply(app, effects);
    }
}

/// Remove from the DOM and release listeners, drawer, and scope.
/// Never call from inside one of the popup's own listeners.
pub fn unmount(app: &App, popup: &Rc<Popup>) {
    popup.container.remove();
    app.popups.borrow_mut().retain(|p| !Rc::ptr_eq(p, popup));
    app.drop_scope(popup.scope);
    let drawer = popup.drawer.borrow_mut().take();
    drop(drawer);
    let listeners = std::mem::take(&mut *popup.listeners.borrow_mut());
    drop(listeners);
}

fn push_history_state(state: &HistoryState) {
    let value = match serde_wasm_bindgen::to_value(state) {
        Ok(v) => v,
        Err(e) => {
            warn!(format!("could not encode history state: {e}"));
            return;
        }
    };
    if let Ok(history) = dom::window().history() {
        if let Err(e) = history.push_state_with_url(&value, "", Some(state.url())) {
            warn!("history.pushState failed", e);
        }
    }
}

/// Apply history effects in order.
pub fn apply(app: &App, effects: Vec<NavEffect>) {
    for effect in effects {
        match effect {
            NavEffect::PushState(state) => push_history_state(&state),
            NavEffect::SetTitle(title) => dom::document().set_title(&title),
            NavEffect::HideAllPopups => {
                for popup in app.popups.borrow().iter() {
                    popup.container.set_hidden(true);
                }
            }
            NavEffect::ClearScrollLock => dom::set_scroll_lock(false),
            NavEffect::Reopen { route, url } => {
                let app = app.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    match route {
                        PopupRoute::Basket => open_basket(&app, false).await,
                        PopupRoute::Login => open_login_popup(&app, false).await,
                        PopupRoute::Product => open_product_popup(&app, &url, false).await,
                        PopupRoute::Quote => {}
                    }
                });
            }
        }
    }
}

pub fn handle_pop_state(app: &App, e: &PopStateEvent) {
    crate::navigation::close(app);
    let entry = serde_wasm_bindgen::from_value::<HistoryState>(e.state()).ok();
    let origin = app.origin.clone();
    let effects = app
        .history
        .borrow_mut()
        .navigate(entry, |url| routing::route_for(&origin, url));
    apply(app, effects);
}

fn empty_basket() -> Result<web_sys::DocumentFragment, JsValue> {
    let fragment = dom::document().create_document_fragment();
    let empty = dom::create_element("div")?;
    empty.set_class_name("basket-empty");
    empty.set_text_content(Some(&platform::translate("Basket is empty")));
    fragment.append_child(&empty)?;
    Ok(fragment)
}

/// Options for [`open_url_popup`].
pub struct UrlPopup<'a> {
    pub url: &'a str,
    pub class_name: &'a str,
    pub content_class_name: &'a str,
    pub cache: bool,
    pub push_history: bool,
    pub swipe: Option<SwipeDirection>,
}

/// Fetch `url`, mount its `[data-popup]` fragment, and show it.
/// `None` when the URL is not popup-eligible, the fetch fails or is
/// cancelled, or the page has no fragment.
pub async fn open_url_popup(app: &App, opts: UrlPopup<'_>) -> Option<Rc<Popup>> {
    let url = opts.url;
    if !routing::is_popup_url(&app.origin, url) {
        warn!("open_url_popup(): url not supported:", url);
        return None;
    }

    let existing = app.find_popup(url);
    match (MountPlan::decide(existing.is_some(), opts.cache), existing) {
        (MountPlan::Reuse, Some(existing)) => {
            let title = existing.title();
            let effects = app
                .history
                .borrow_mut()
                .open_popup(url, title.as_deref(), opts.push_history);
            apply(app, effects);
            dom::set_scroll_lock(true);
            existing.container.set_hidden(false);
            existing.attach_drawer(app);
            return Some(existing);
        }
        (MountPlan::Replace, Some(existing)) => unmount(app, &existing),
        _ => {}
    }

    let remove = !opts.cache;
    let on_dismiss: DismissFn = Rc::new(move |app: &App, popup: &Rc<Popup>| {
        popup.cancel();
        close_popup(app, popup, true, remove);
    });
    let class_name = format!("popup-loading {}", opts.class_name);
    let frame = Frame {
        url: Some(url),
        class_name: &class_name,
        content_tag: "div",
        content_class_name: opts.content_class_name,
        cache: opts.cache,
        swipe: opts.swipe,
        close_on_escape: true,
    };
    let popup = match Popup::mount(app, frame, on_dismiss) {
        Ok(popup) => popup,
        Err(e) => {
            warn!("open_url_popup(): could not build popup", e);
            return None;
        }
    };
    dom::set_scroll_lock(true);

    let html = match api::fetch_page(url, popup.signal().as_ref()).await {
        Ok(html) => html,
        Err(BackendError::Aborted) => {
            unmount(app, &popup);
            return None;
        }
        Err(err) => {
            warn!(format!("open_url_popup(): could not find contents: {err}"));
            discard(app, &popup);
            return None;
        }
    };

    if popup.cancelled.get() {
        unmount(app, &popup);
        return None;
    }

    let (title, content) = match dom::extract(&html, "[data-popup]") {
        Some(found) => (found.title, found.content),
        None if url == app.url(BASKET_PATH) => {
            let title = app.history.borrow().initial_title().to_owned();
            match empty_basket() {
                Ok(content) => (title, content),
                Err(e) => {
                    warn!("open_url_popup(): could not build empty basket", e);
                    discard(app, &popup);
                    return None;
                }
            }
        }
        None => {
            warn!("open_url_popup(): could not find popup contents");
            discard(app, &popup);
            return None;
        }
    };

    let effects = app
        .history
        .borrow_mut()
        .open_popup(url, Some(&title), opts.push_history);
    apply(app, effects);

    dom::remove_class(&popup.container, "popup-loading");
    let _ = popup.container.set_attribute("data-title", &title);
    *popup.title.borrow_mut() = Some(title);
    if let Err(e) = popup.content.append_child(&content) {
        warn!("open_url_popup(): could not mount contents", e);
    }
    popup.attach_drawer(app);

    Some(popup)
}

fn discard(app: &App, popup: &Rc<Popup>) {
    unmount(app, popup);
    dom::set_scroll_lock(false);
}

// ── Openers ──

pub async fn open_product_popup(app: &App, url: &str, push_history: bool) {
    let popup = open_url_popup(
        app,
        UrlPopup {
            url,
            class_name: "store-product-popup",
            content_class_name: "store-product-popup-content store-product store-product-full",
            cache: true,
            push_history,
            swipe: Some(SwipeDirection::Down),
        },
    )
    .await;
    if let Some(popup) = popup {
        if popup.take_wiring() {
            mount::wire(app, &popup.content, popup.scope);
        }
    }
}

pub async fn open_quote_popup(app: &App, url: &str) {
    let popup = open_url_popup(
        app,
        UrlPopup {
            url,
            class_name: "store-quote-popup",
            content_class_name: "store-quote store-form",
            cache: false,
            push_history: true,
            swipe: Some(SwipeDirection::Down),
        },
    )
    .await;
    if let Some(popup) = popup {
        if popup.take_wiring() {
            mount::wire(app, &popup.content, popup.scope);
        }
    }
}

/// Open the basket, or refresh it in place when it is already showing.
pub async fn open_basket(app: &App, push_history: bool) {
    if app.is_basket_open() {
        crate::basket::refresh(app).await;
        return;
    }

    let backend = app.backend.clone();
    app.ident
        .start(async move { sf_basket::resolve_ident(&backend).await });

    let url = app.url(BASKET_PATH);
    let popup = open_url_popup(
        app,
        UrlPopup {
            url: &url,
            class_name: "basket-popup",
            content_class_name: "basket-popup-content basket",
            cache: false,
            push_history,
            swipe: Some(SwipeDirection::Right),
        },
    )
    .await;
    if let Some(popup) = popup {
        crate::basket::bind(app, &popup);
    }
}

pub async fn open_login_popup(app: &App, push_history: bool) {
    let url = app.url(LOGIN_PATH);
    open_url_popup(
        app,
        UrlPopup {
            url: &url,
            class_name: "login-popup",
            content_class_name: "login-popup-content store-form text-content",
            cache: true,
            push_history,
            swipe: Some(SwipeDirection::Down),
        },
    )
    .await;
}

/// Open whichever popup `href` routes to. `false` when it is not a popup URL.
pub fn open_link(app: &App, href: &str) -> bool {
    let Some(route) = routing::route_for(&app.origin, href) else {
        return false;
    };
    let app = app.clone();
    let href = href.to_owned();
    wasm_bindgen_futures::spawn_local(async move {
        match route {
            PopupRoute::Basket => open_basket(&app, true).await,
            PopupRoute::Login => open_login_popup(&app, true).await,
            PopupRoute::Product => open_product_popup(&app, &href, true).await,
            PopupRoute::Quote => open_quote_popup(&app, &href).await,
        }
    });
    true
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen::JsCast;
    use wasm_bindgen_test::*;
    use web_sys::Event;

    wasm_bindgen_test_configure!(run_in_browser);

    fn form_frame() -> Frame<'static> {
        Frame {
            url: None,
            class_name: "gift-form-popup",
            content_tag: "form",
            content_class_name: "text-content store-form",
            cache: false,
            swipe: None,
            close_on_escape: false,
        }
    }

    #[wasm_bindgen_test]
    fn closing_a_form_popup_does_not_submit_it() {
        let app = App::new("http://localhost".into(), "http://localhost/".into(), "Store".into());
        let dismissed = Rc::new(Cell::new(false));
        let on_dismiss: DismissFn = {
            let dismissed = dismissed.clone();
            Rc::new(move |_: &App, _: &Rc<Popup>| dismissed.set(true))
        };
        let popup = Popup::mount(&app, form_frame(), on_dismiss).unwrap();

        let submitted = Rc::new(Cell::new(false));
        let _submit = {
            let submitted = submitted.clone();
            Listener::new(&popup.content, "submit", move |e: Event| {
                e.prevent_default();
                submitted.set(true);
            })
        };

        let close: HtmlElement = dom::query_within(&popup.content, ".popup-close")
            .unwrap()
            .dyn_into()
            .unwrap();
        close.click();

        assert!(dismissed.get());
        assert!(!submitted.get());
        popup.container.remove();
    }
}

