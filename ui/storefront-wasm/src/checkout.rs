//! Hosted checkout launch.

use crate::dom;
use crate::events::{self, Listener};
use crate::platform;
use crate::state::App;
use futures::channel::oneshot;
use gloo_console::{log, warn};
use sf_core::registry::Scope;
use wasm_bindgen::JsCast;
use web_sys::{Element, Event, HtmlButtonElement, MouseEvent};

/// The basket's checkout button stays disabled until the ident has resolved.
pub fn bind_button(app: &App, root: &Element, scope: Scope) {
    let Some(button) = dom::query_within(root, "button.checkout")
        .and_then(|b| b.dyn_into::<HtmlButtonElement>().ok())
    else {
        return;
    };

    if let Some(pending) = app.ident.pending() {
        button.set_disabled(true);
        let button = button.clone();
        wasm_bindgen_futures::spawn_local(async move {
            pending.await;
            button.set_disabled(false);
        });
    }

    let app2 = app.clone();
    let target = button.clone();
    app.keep(
        scope,
        Listener::new(&button, "click", move |e: MouseEvent| {
            e.prevent_default();
            target.set_disabled(true);
            let app = app2.clone();
            let target = target.clone();
            wasm_bindgen_futures::spawn_local(async move {
                open_checkout(&app).await;
                target.set_disabled(false);
            });
        }),
    );
}

pub async fn open_checkout(app: &App) {
    let Some(pending) = app.ident.pending() else {
        warn!("open_checkout(): basket ident was never requested");
        return;
    };
    let Some(ident) = pending.await else {
        warn!("open_checkout(): no basket ident");
        return;
    };

    let body = dom::body();
    let config = sf_basket::checkout_config(
        ident,
        &app.constants,
        &dom::computed_property(&body, "--color-primary"),
        &dom::computed_property(&body, "--color-secondary"),
    );
    if let Err(e) = platform::launch_checkout(&config) {
        warn!("open_checkout(): checkout failed to launch", e);
        return;
    }

    let app = app.clone();
    let subscribed = platform::on_payment_complete(move || {
        log!("payment completed");
        app.ident.reset();
    });
    if let Err(e) = subscribed {
        warn!("open_checkout(): could not watch for payment", e);
    }
}

/// Send the shopper home after any completed payment. Waits for the window
/// `load` event when the checkout script is not there yet.
pub async fn init(app: &App) {
    if !platform::checkout_loaded() {
        let (tx, rx) = oneshot::channel::<()>();
        let mut tx = Some(tx);
        events::listen(&dom::window(), "load", move |_: Event| {
            if let Some(tx) = tx.take() {
                let _ = tx.send(());
            }
        });
        if rx.await.is_err() || !platform::checkout_loaded() {
            warn!("checkout script is not loaded");
            return;
        }
    }

    let origin = app.origin.clone();
    if let Err(e) = platform::on_payment_complete(move || dom::navigate(&origin)) {
        warn!("could not watch for payment", e);
    }
}
