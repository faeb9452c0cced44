//! Swipe-to-close for popups and the mobile menu.
//!
//! The gesture math lives in [`sf_core::drawer`]; this module feeds it touch
//! samples and applies the feedback to the container and its moving child.

use crate::dom;
use crate::events::Listener;
use crate::platform;
use gloo_timers::future::sleep;
use sf_api_types::SwipeDirection;
use sf_core::drawer::{DrawerConfig, DrawerGesture, MoveFeedback, Point, ReleaseOutcome, ScrollMetrics};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use web_sys::{Element, HtmlElement, TouchEvent};

struct Inner {
    el: HtmlElement,
    transform: Element,
    gesture: RefCell<DrawerGesture>,
    on_close: Box<dyn Fn()>,
    listeners: RefCell<Vec<Listener>>,
    destroyed: Cell<bool>,
}

/// An attached drawer. Dropping it detaches the touch listeners.
pub struct Drawer {
    inner: Rc<Inner>,
}

impl Drawer {
    /// `None` on non-touch devices and for hidden containers.
    pub fn attach(
        el: &HtmlElement,
        transform: &Element,
        direction: SwipeDirection,
        on_close: impl Fn() + 'static,
    ) -> Option<Self> {
        let gesture = DrawerGesture::attach(
            DrawerConfig::new(direction),
            platform::is_touch_device(),
            el.hidden(),
        )?;

        let inner = Rc::new(Inner {
            el: el.clone(),
            transform: transform.clone(),
            gesture: RefCell::new(gesture),
            on_close: Box::new(on_close),
            listeners: RefCell::new(Vec::new()),
            destroyed: Cell::new(false),
        });

        let weak = Rc::downgrade(&inner);
        let listeners = vec![
            Listener::passive(el, "touchstart", on_weak(&weak, Inner::touch_start)),
            Listener::passive(el, "touchmove", on_weak(&weak, Inner::touch_move)),
            Listener::passive(el, "touchend", on_weak(&weak, Inner::touch_end)),
        ];
        *inner.listeners.borrow_mut() = listeners;

        dom::add_class(el, "drawer");
        dom::add_class(el, &format!("drawer-{}", direction.as_str()));

        Some(Self { inner })
    }

    pub fn is_active(&self) -> bool {
        !self.inner.destroyed.get()
    }

    pub fn destroy(&self) {
        self.inner.destroy();
    }
}

fn on_weak(weak: &Weak<Inner>, f: fn(&Rc<Inner>, &TouchEvent)) -> impl FnMut(TouchEvent) + 'static {
    let weak = weak.clone();
    move |e: TouchEvent| {
        if let Some(inner) = weak.upgrade() {
            f(&inner, &e);
        }
    }
}

impl Inner {
    fn closing(&self) -> bool {
        self.el.hidden()
    }

    fn direction(&self) -> SwipeDirection {
        self.gesture.borrow().config().direction
    }

    fn metrics(&self) -> ScrollMetrics {
        ScrollMetrics {
            scroll_left: f64::from(self.el.scroll_left()),
            scroll_top: f64::from(self.el.scroll_top()),
            scroll_width: f64::from(self.el.scroll_width()),
            scroll_height: f64::from(self.el.scroll_height()),
            offset_width: f64::from(self.el.offset_width()),
            offset_height: f64::from(self.el.offset_height()),
        }
    }

    fn clear_feedback(&self) {
        dom::set_translate(&self.transform, "");
        dom::remove_class(&self.el, "touching");
        dom::remove_class(&self.el, "may-close");
    }

    fn touch_start(self: &Rc<Self>, _: &TouchEvent) {
        if self.gesture.borrow().touch_start(self.closing()) {
            dom::add_class(&self.el, "touching");
        }
    }

    fn touch_move(self: &Rc<Self>, e: &TouchEvent) {
        let point = e.touches().get(0).map(|t| Point {
            x: f64::from(t.client_x()),
            y: f64::from(t.client_y()),
        });
        let at_edge = self.metrics().at_edge(self.direction());
        let feedback = self
            .gesture
            .borrow_mut()
            .touch_move(point, at_edge, self.closing());

        match feedback {
            MoveFeedback::Reset => self.clear_feedback(),
            MoveFeedback::Anchored => {}
            MoveFeedback::Drag { translate, may_close } => {
                dom::toggle_class(&self.el, "may-close", may_close);
                let value = translate
                    .map(|(x, y)| {
                        if self.direction().is_horizontal() {
                            format!("{x}px 0")
                        } else {
                            format!("0 {y}px")
                        }
                    })
                    .unwrap_or_default();
                dom::set_translate(&self.transform, &value);
            }
        }
    }

    fn touch_end(self: &Rc<Self>, _: &TouchEvent) {
        let outcome = self.gesture.borrow_mut().touch_end(self.closing());
        match outcome {
            ReleaseOutcome::Ignored => {}
            ReleaseOutcome::SpringBack => self.clear_feedback(),
            ReleaseOutcome::Close => {
                self.clear_feedback();
                let inner = self.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    (inner.on_close)();
                    sleep(dom::fade_duration(&inner.el)).await;
                    inner.destroy();
                });
            }
        }
    }

    fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        dom::remove_class(&self.el, "drawer");
        dom::remove_class(&self.el, &format!("drawer-{}", self.direction().as_str()));
        dom::set_translate(&self.transform, "");
        self.listeners.borrow_mut().clear();
    }
}
