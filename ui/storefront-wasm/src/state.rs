//! Application state.
//!
//! One [`App`] is built at boot and cloned into every listener. WASM is
//! single-threaded, so shared mutable pieces are `RefCell`s; borrows are never
//! held across an `.await`.

use crate::api::FetchBackend;
use crate::drawer::Drawer;
use crate::events::Listener;
use crate::platform::{self, BrowserStore};
use crate::popup::Popup;
use crate::toast;
use async_trait::async_trait;
use gloo_timers::callback::Interval;
use js_sys::WeakSet;
use sf_api_types::{PackageId, PurchaseType, TemplateConstants, ToastKind};
use sf_basket::{IdentSlot, PackageActions, StorefrontUi};
use sf_core::debounce::Debouncer;
use sf_core::history::HistoryMachine;
use sf_core::ledger::{QuantityLedger, ReconcilePolicy};
use sf_core::registry::{Scope, WidgetId, WidgetRegistry};
use sf_storage::{KeyValueStore, NoopStore};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ops::Deref;
use std::rc::Rc;
use web_sys::{DocumentFragment, Element, Node};

/// Quantity pushes are debounced per product widget, and once for the basket.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DebounceGroup {
    Widget(WidgetId),
    Basket,
}

/// Listeners and timers owned by one mount scope.
#[derive(Default)]
pub struct Mounted {
    pub listeners: Vec<Listener>,
    pub intervals: Vec<(u32, Interval)>,
}

pub struct AppState {
    pub constants: TemplateConstants,
    pub origin: String,
    pub history: RefCell<HistoryMachine>,
    pub popups: RefCell<Vec<Rc<Popup>>>,
    pub widgets: RefCell<WidgetRegistry<Element>>,
    pub mounted: RefCell<HashMap<Scope, Mounted>>,
    pub debounce: RefCell<Debouncer<DebounceGroup>>,
    pub ledger: RefCell<QuantityLedger>,
    pub ident: IdentSlot,
    pub navigation: RefCell<Option<Drawer>>,
    /// Elements whose countdown is already running.
    pub countdowns: WeakSet,
    pub store: Box<dyn KeyValueStore>,
    pub backend: FetchBackend,
    next_scope: Cell<u32>,
    next_timer: Cell<u32>,
}

#[derive(Clone)]
pub struct App(Rc<AppState>);

impl Deref for App {
    type Target = AppState;

    fn deref(&self) -> &AppState {
        &self.0
    }
}

impl App {
    pub fn new(origin: String, initial_url: String, initial_title: String) -> Self {
        let store: Box<dyn KeyValueStore> = match BrowserStore::open() {
            Some(store) => Box::new(store),
            None => {
                gloo_console::warn!("localStorage unavailable; login replay disabled");
                Box::new(NoopStore)
            }
        };
        Self(Rc::new(AppState {
            constants: platform::template_constants(),
            origin,
            history: RefCell::new(HistoryMachine::new(initial_url, initial_title)),
            popups: RefCell::new(Vec::new()),
            widgets: RefCell::new(WidgetRegistry::new()),
            mounted: RefCell::new(HashMap::new()),
            debounce: RefCell::new(Debouncer::new()),
            ledger: RefCell::new(QuantityLedger::new(ReconcilePolicy::default())),
            ident: IdentSlot::new(),
            navigation: RefCell::new(None),
            countdowns: WeakSet::new(),
            store,
            backend: FetchBackend::new(),
            next_scope: Cell::new(0),
            next_timer: Cell::new(0),
        }))
    }

    pub fn actions(&self) -> PackageActions<'_, FetchBackend, App, dyn KeyValueStore> {
        PackageActions::new(&self.backend, self, self.store.as_ref(), &self.constants)
    }

    /// Absolute URL for a same-origin path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.origin, path)
    }

    pub fn new_popup_scope(&self) -> Scope {
        let id = self.next_scope.get();
        self.next_scope.set(id + 1);
        Scope::Popup(id)
    }

    pub fn keep(&self, scope: Scope, listener: Listener) {
        self.mounted
            .borrow_mut()
            .entry(scope)
            .or_default()
            .listeners
            .push(listener);
    }

    pub fn new_timer_key(&self) -> u32 {
        let key = self.next_timer.get();
        self.next_timer.set(key + 1);
        key
    }

    pub fn keep_interval(&self, scope: Scope, key: u32, interval: Interval) {
        self.mounted
            .borrow_mut()
            .entry(scope)
            .or_default()
            .intervals
            .push((key, interval));
    }

    /// Stop one interval before its scope goes away. Only call from a spawned task.
    pub fn cancel_interval(&self, scope: Scope, key: u32) {
        let cancelled = self.mounted.borrow_mut().get_mut(&scope).and_then(|m| {
            let at = m.intervals.iter().position(|(k, _)| *k == key)?;
            Some(m.intervals.swap_remove(at))
        });
        drop(cancelled);
    }

    /// Unbind everything mounted in `scope`. Only call from a spawned task.
    pub fn drop_scope(&self, scope: Scope) {
        let dropped = self.widgets.borrow_mut().drop_scope(scope);
        let mounted = self.mounted.borrow_mut().remove(&scope);
        drop(mounted);
        gloo_console::debug!(format!("dropped {scope:?} ({dropped} widgets)"));
    }

    pub fn find_popup(&self, url: &str) -> Option<Rc<Popup>> {
        self.popups
            .borrow()
            .iter()
            .find(|p| p.url.as_deref() == Some(url))
            .cloned()
    }

    /// The mounted popup whose container holds `el`.
    pub fn popup_containing(&self, el: &Element) -> Option<Rc<Popup>> {
        let node: &Node = el;
        self.popups
            .borrow()
            .iter()
            .find(|p| p.container.contains(Some(node)))
            .cloned()
    }

    pub fn basket_popup(&self) -> Option<Rc<Popup>> {
        self.find_popup(&self.url(sf_api_types::BASKET_PATH))
    }

    /// The basket popup is mounted and visible.
    pub fn is_basket_open(&self) -> bool {
        self.basket_popup().is_some_and(|p| !p.container.hidden())
    }
}

#[async_trait(?Send)]
impl StorefrontUi for App {
    type OptionsForm = DocumentFragment;

    fn translate(&self, text: &str) -> String {
        platform::translate(text)
    }

    fn toast(&self, message: &str, kind: ToastKind) {
        toast::new_toast(message, kind);
    }

    async fn open_login_popup(&self) {
        crate::popup::open_login_popup(self, true).await;
    }

    fn open_options_popup(
        &self,
        package_id: &PackageId,
        purchase_type: PurchaseType,
        form: DocumentFragment,
        gift_to: Option<String>,
    ) {
        let app = self.clone();
        let package_id = package_id.clone();
        wasm_bindgen_futures::spawn_local(async move {
            crate::forms::open_options_popup(&app, &package_id, purchase_type, form, gift_to).await;
        });
    }

    fn open_gift_form(&self, package_id: &PackageId, purchase_type: PurchaseType) {
        if let Err(e) = crate::forms::open_gift_form(self, package_id, purchase_type) {
            gloo_console::warn!("could not open gift form", e);
        }
    }

    async fn package_state_changed(&self, package_id: &PackageId, count: u32) {
        crate::package::package_state_changed(self, package_id, count).await;
    }

    fn navigate(&self, path: &str) {
        crate::dom::navigate(&self.url(path));
    }
}
