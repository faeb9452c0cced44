use crate::backend::{AddResponse, BackendError, BasketBackend};
use crate::ui::StorefrontUi;
use async_trait::async_trait;
use sf_api_types::{AddPackageRequest, PackageId, PurchaseType, ToastKind, remove_package_path};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};

/// An add response page. Failing pages carry no `.site` wrapper.
pub fn page(ok: bool, toast: Option<&str>, options: Option<&str>) -> AddResponse<String> {
    AddResponse {
        ok,
        has_site: ok,
        toast: toast.map(str::to_owned),
        options_form: options.map(str::to_owned),
        body: String::new(),
    }
}

fn encode(pairs: impl Iterator<Item = (String, String)>) -> String {
    pairs
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

pub struct MockBackend {
    calls: RefCell<Vec<String>>,
    adds: RefCell<VecDeque<Result<AddResponse<String>, BackendError>>>,
    fail_updates: Cell<bool>,
    ident: RefCell<Option<String>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            calls: RefCell::default(),
            adds: RefCell::default(),
            fail_updates: Cell::new(false),
            ident: RefCell::new(Some("ident".to_owned())),
        }
    }
}

impl MockBackend {
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn queue_add(&self, response: AddResponse<String>) {
        self.adds.borrow_mut().push_back(Ok(response));
    }

    pub fn fail_next_add(&self) {
        self.adds
            .borrow_mut()
            .push_back(Err(BackendError::Network("connection reset".to_owned())));
    }

    pub fn fail_updates(&self) {
        self.fail_updates.set(true);
    }

    /// `None` makes the ident endpoint fail.
    pub fn set_ident(&self, ident: Option<&str>) {
        *self.ident.borrow_mut() = ident.map(str::to_owned);
    }

    fn next_add(&self) -> Result<AddResponse<String>, BackendError> {
        self.adds
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(page(true, None, None)))
    }

    fn maybe_fail(&self) -> Result<(), BackendError> {
        if self.fail_updates.get() {
            Err(BackendError::Status {
                status: 500,
                status_text: "Internal Server Error".to_owned(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait(?Send)]
impl BasketBackend for MockBackend {
    type OptionsForm = String;

    async fn add_package(&self, request: &AddPackageRequest) -> Result<AddResponse<String>, BackendError> {
        let mut call = format!("add {}", request.path());
        if let Some(username) = &request.gift_to {
            call.push_str(&format!("?username={username}"));
        }
        self.calls.borrow_mut().push(call);
        self.next_add()
    }

    async fn add_package_with_options(
        &self,
        request: &AddPackageRequest,
        fields: &[(String, String)],
    ) -> Result<AddResponse<String>, BackendError> {
        self.calls.borrow_mut().push(format!(
            "options {} {}",
            request.path(),
            encode(fields.iter().cloned())
        ));
        self.next_add()
    }

    async fn update_quantities(&self, quantities: &BTreeMap<String, u32>) -> Result<(), BackendError> {
        self.calls.borrow_mut().push(format!(
            "update {}",
            encode(quantities.iter().map(|(k, v)| (k.clone(), v.to_string())))
        ));
        self.maybe_fail()
    }

    async fn remove_package(&self, package_id: &PackageId) -> Result<(), BackendError> {
        self.calls
            .borrow_mut()
            .push(format!("remove {}", remove_package_path(package_id)));
        self.maybe_fail()
    }

    async fn basket_ident(&self) -> Result<Option<String>, BackendError> {
        match self.ident.borrow().clone() {
            Some(ident) => Ok(Some(ident)),
            None => Err(BackendError::Malformed("expected {ident}".to_owned())),
        }
    }
}

#[derive(Default)]
pub struct RecordingUi {
    events: RefCell<Vec<String>>,
}

impl RecordingUi {
    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }

    fn record(&self, event: String) {
        self.events.borrow_mut().push(event);
    }
}

#[async_trait(?Send)]
impl StorefrontUi for RecordingUi {
    type OptionsForm = String;

    fn translate(&self, text: &str) -> String {
        text.to_owned()
    }

    fn toast(&self, message: &str, kind: ToastKind) {
        self.record(format!("toast {} {message}", kind.as_str()));
    }

    async fn open_login_popup(&self) {
        self.record("login".to_owned());
    }

    fn open_options_popup(
        &self,
        package_id: &PackageId,
        purchase_type: PurchaseType,
        form: String,
        gift_to: Option<String>,
    ) {
        self.record(format!(
            "options {package_id} {purchase_type} {form} {}",
            gift_to.as_deref().unwrap_or("-")
        ));
    }

    fn open_gift_form(&self, package_id: &PackageId, purchase_type: PurchaseType) {
        self.record(format!("gift {package_id} {purchase_type}"));
    }

    async fn package_state_changed(&self, package_id: &PackageId, count: u32) {
        self.record(format!("state {package_id} {count}"));
    }

    fn navigate(&self, path: &str) {
        self.record(format!("navigate {path}"));
    }
}
