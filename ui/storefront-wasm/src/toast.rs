//! Toast notifications.
//!
//! One `.toaster` stack, created on first use. Each toast auto-dismisses after
//! [`TOAST_TIMEOUT`]; hovering pauses it and leaving restarts the full window.
//! A toast's listeners are released once it leaves the DOM.

use crate::dom;
use crate::events::Listener;
use crate::platform;
use gloo_timers::future::sleep;
use sf_api_types::ToastKind;
use sf_core::TOAST_TIMEOUT;
use sf_core::toast::{ToastTimer, Window};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use web_sys::{Element, HtmlElement, MouseEvent, TransitionEvent};

fn toaster() -> Result<Element, JsValue> {
    if let Some(existing) = dom::query(".toaster") {
        return Ok(existing);
    }
    let toaster = dom::create_element("div")?;
    toaster.set_class_name("toaster");
    dom::body().append_child(&toaster)?;
    Ok(toaster.into())
}

/// Listeners bound to one toast.
type Bound = Rc<RefCell<Vec<Listener>>>;

fn schedule(toast: &HtmlElement, timer: &Rc<RefCell<ToastTimer>>, window: Window, bound: &Bound) {
    let toast = toast.clone();
    let timer = timer.clone();
    let bound = bound.clone();
    wasm_bindgen_futures::spawn_local(async move {
        sleep(TOAST_TIMEOUT).await;
        if timer.borrow_mut().elapsed(window) {
            close_toast(&toast, &bound);
        }
    });
}

/// Show a toast. Failures to build the DOM are logged, never surfaced.
pub fn new_toast(content: &str, kind: ToastKind) {
    if let Err(e) = try_new_toast(content, kind) {
        gloo_console::warn!("could not show toast", e);
    }
}

fn try_new_toast(content: &str, kind: ToastKind) -> Result<HtmlElement, JsValue> {
    let toast = dom::create_element("div")?;
    toast.set_class_name(&format!("toast toast-{}", kind.as_str()));
    toast.set_attribute("role", "alert")?;

    let bound: Bound = Rc::new(RefCell::new(Vec::new()));
    let (timer, window) = ToastTimer::start();
    let timer = Rc::new(RefCell::new(timer));
    schedule(&toast, &timer, window, &bound);

    let mut listeners = Vec::with_capacity(3);
    {
        let timer = timer.clone();
        listeners.push(Listener::new(&toast, "mouseenter", move |_: MouseEvent| {
            timer.borrow_mut().pointer_enter();
        }));
    }
    {
        let timer = timer.clone();
        let toast_el = toast.clone();
        let owned = bound.clone();
        listeners.push(Listener::new(&toast, "mouseleave", move |_: MouseEvent| {
            let next = timer.borrow_mut().pointer_leave();
            if let Some(window) = next {
                schedule(&toast_el, &timer, window, &owned);
            }
        }));
    }

    let text = dom::create_element("p")?;
    text.set_text_content(Some(content));
    toast.append_child(&text)?;

    let close = dom::create_element("button")?;
    close.set_class_name("toast-close");
    close.set_attribute("type", "button")?;
    close.set_text_content(Some(&platform::translate("Close")));
    {
        let toast_el = toast.clone();
        let owned = bound.clone();
        listeners.push(Listener::new(&close, "click", move |_: MouseEvent| {
            if timer.borrow_mut().dismiss() {
                close_toast(&toast_el, &owned);
            }
        }));
    }
    toast.append_child(&close)?;
    bound.borrow_mut().extend(listeners);

    toaster()?.append_child(&toast)?;
    Ok(toast)
}

/// Hide now; leave the DOM once the opacity transition finishes.
fn close_toast(toast: &HtmlElement, bound: &Bound) {
    let el = toast.clone();
    let owned = bound.clone();
    let listener = Listener::new(toast, "transitionend", move |e: TransitionEvent| {
        if el.hidden() && e.property_name() == "opacity" {
            el.remove();
            let owned = owned.clone();
            wasm_bindgen_futures::spawn_local(async move {
                owned.borrow_mut().clear();
            });
        }
    });
    bound.borrow_mut().push(listener);
    toast.set_hidden(true);
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen::JsCast;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn the_close_button_hides_the_toast() {
        let toast = try_new_toast("Subscribed successfully!", ToastKind::Success).unwrap();
        assert_eq!(toast.class_name(), "toast toast-success");

        let close: HtmlElement = dom::query_within(&toast, ".toast-close")
            .unwrap()
            .dyn_into()
            .unwrap();
        close.click();
        assert!(toast.hidden());
        toast.remove();
    }
}

