//! Storefront WASM frontend
//!
//! Progressive enhancement for a server-rendered webstore: product, basket,
//! login and quote pages open as popups backed by history entries, package
//! widgets add to and edit the basket in place, and checkout launches the
//! hosted payment overlay.

#[macro_use]
pub mod events;

pub mod api;
pub mod basket;
pub mod checkout;
pub mod dom;
pub mod drawer;
pub mod forms;
pub mod mount;
pub mod navigation;
pub mod package;
pub mod platform;
pub mod popup;
pub mod state;
pub mod toast;
pub mod widgets;

use futures::channel::oneshot;
use sf_api_types::{BASKET_HASH, BASKET_PATH};
use sf_core::registry::Scope;
use state::App;
use wasm_bindgen::prelude::*;
use web_sys::{Event, PopStateEvent};

/// WASM entry point – called automatically when the module is instantiated.
#[wasm_bindgen(start)]
pub async fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let location = dom::window().location();
    let origin = location.origin()?;
    let pathname = location.pathname()?;

    // The bare basket page is only reachable through its hash route.
    if pathname == BASKET_PATH {
        location.set_href(&format!("{origin}/{BASKET_HASH}"))?;
        return Ok(());
    }

    if dom::document().ready_state() == "loading" {
        let (tx, rx) = oneshot::channel::<()>();
        let mut tx = Some(tx);
        events::listen(&dom::document(), "DOMContentLoaded", move |_: Event| {
            if let Some(tx) = tx.take() {
                let _ = tx.send(());
            }
        });
        let _ = rx.await;
    }

    let initial_url = format!("{origin}{pathname}{}", location.search()?);
    let app = App::new(origin, initial_url, dom::document().title());
    init(&app).await
}

/// Boot sequence, in page order.
async fn init(app: &App) -> Result<(), JsValue> {
    widgets::copy_buttons();
    navigation::init(app);
    {
        let app = app.clone();
        wasm_bindgen_futures::spawn_local(async move { checkout::init(&app).await });
    }
    mount::wire(app, &dom::body(), Scope::Page);

    if let Some(message) = app.constants.toast.as_deref().filter(|m| !m.is_empty()) {
        toast::new_toast(message, app.constants.toast_type.unwrap_or_default());
    }

    {
        let app = app.clone();
        wasm_bindgen_futures::spawn_local(async move {
            app.actions().replay_pending_add().await;
        });
    }
    app.actions().replay_pending_gift();
    {
        let app = app.clone();
        wasm_bindgen_futures::spawn_local(async move { forms::options_after_login(&app).await });
    }

    {
        let app = app.clone();
        events::listen(&dom::window(), "popstate", move |e: PopStateEvent| {
            popup::handle_pop_state(&app, &e);
        });
    }

    let location = dom::window().location();
    if location.pathname()? == "/" && location.hash()? == BASKET_HASH {
        let initial = app.history.borrow().initial_url().to_owned();
        dom::window()
            .history()?
            .replace_state_with_url(&JsValue::NULL, "", Some(&initial))?;
        popup::open_basket(app, true).await;
    }
    Ok(())
}
