//! Add / subscribe / gift flows for a single package.

use crate::backend::{AddOutcome, BasketBackend};
use crate::ui::StorefrontUi;
use sf_api_types::{
    AddPackageRequest, GIFT_INVALID_USERNAME, PackageId, PendingAction, PurchaseType,
    TemplateConstants, ToastKind, package_page_path,
};
use sf_storage::{KeyValueStore, PendingActions, PendingKind};
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddFlow {
    /// Not logged in; the action was parked and the login popup opened.
    LoginRequired,
    OptionsRequested,
    Added,
    Failed,
}

pub struct PackageActions<'a, B: ?Sized, U: ?Sized, S: ?Sized> {
    backend: &'a B,
    ui: &'a U,
    store: &'a S,
    constants: &'a TemplateConstants,
}

impl<'a, B, U, S> PackageActions<'a, B, U, S>
where
    B: BasketBackend + ?Sized,
    U: StorefrontUi<OptionsForm = B::OptionsForm> + ?Sized,
    S: KeyValueStore + ?Sized,
{
    pub fn new(backend: &'a B, ui: &'a U, store: &'a S, constants: &'a TemplateConstants) -> Self {
        Self {
            backend,
            ui,
            store,
            constants,
        }
    }

    fn pending(&self) -> PendingActions<'a, S> {
        PendingActions::new(self.store)
    }

    /// Call the add endpoint, classify the page, and surface its toast.
    pub async fn send_add(&self, request: &AddPackageRequest) -> AddOutcome<B::OptionsForm> {
        let invalid = self.ui.translate(GIFT_INVALID_USERNAME);
        let outcome = match self.backend.add_package(request).await {
            Ok(response) => AddOutcome::classify(response, &invalid),
            Err(err) => {
                warn!(package = %request.package_id, "add to basket failed: {err}");
                AddOutcome::failed()
            }
        };
        self.toast_message(&outcome);
        outcome
    }

    /// Add or subscribe button. `None` when the action was parked behind login.
    pub async fn add_clicked(
        &self,
        package_id: &PackageId,
        purchase_type: PurchaseType,
    ) -> Option<AddOutcome<B::OptionsForm>> {
        if self.constants.must_login() {
            self.pending().remember(
                PendingKind::Add,
                &PendingAction::new(package_id.clone(), purchase_type.as_str()),
            );
            self.ui.open_login_popup().await;
            return None;
        }
        let request = AddPackageRequest::new(package_id.clone(), purchase_type);
        Some(self.send_add(&request).await)
    }

    /// Continue after the originating popup (if any) has been closed.
    pub async fn follow_up(
        &self,
        request: AddPackageRequest,
        outcome: AddOutcome<B::OptionsForm>,
    ) -> AddFlow {
        let AddOutcome {
            status,
            message,
            options_form,
        } = outcome;
        if let Some(form) = options_form {
            self.ui.open_options_popup(
                &request.package_id,
                request.purchase_type,
                form,
                request.gift_to,
            );
            AddFlow::OptionsRequested
        } else if status {
            self.ui.package_state_changed(&request.package_id, 1).await;
            AddFlow::Added
        } else {
            if message.is_none() {
                self.toast_generic_failure();
            }
            AddFlow::Failed
        }
    }

    /// Gift link. `None` when parked behind login, otherwise the purchase type
    /// the gift form should use (`both` gifts as a single purchase).
    pub async fn gift_clicked(&self, package_id: &PackageId, raw_type: &str) -> Option<PurchaseType> {
        let purchase_type = PurchaseType::sanitize(raw_type);
        if self.constants.must_login() {
            self.pending().remember(
                PendingKind::Gift,
                &PendingAction::new(package_id.clone(), purchase_type.as_str()),
            );
            self.ui.open_login_popup().await;
            return None;
        }
        Some(purchase_type)
    }

    /// Gift form submit. Empty usernames are rejected before any request.
    pub async fn submit_gift(
        &self,
        package_id: &PackageId,
        purchase_type: PurchaseType,
        username: &str,
    ) -> Option<(AddPackageRequest, AddOutcome<B::OptionsForm>)> {
        let username = username.trim();
        if username.is_empty() {
            self.ui
                .toast(&self.ui.translate("Please enter a username"), ToastKind::Error);
            return None;
        }
        let request = AddPackageRequest::new(package_id.clone(), purchase_type).gift(username);
        let outcome = self.send_add(&request).await;
        Some((request, outcome))
    }

    /// Options form submit. Returns whether the package was added.
    pub async fn submit_options(&self, request: &AddPackageRequest, fields: &[(String, String)]) -> bool {
        let invalid = self.ui.translate(GIFT_INVALID_USERNAME);
        let outcome = match self.backend.add_package_with_options(request, fields).await {
            Ok(response) => AddOutcome::classify(response, &invalid),
            Err(err) => {
                warn!(package = %request.package_id, "add with options failed: {err}");
                AddOutcome::failed()
            }
        };
        self.toast_message(&outcome);
        if !outcome.status && outcome.message.is_none() {
            self.toast_generic_failure();
        }
        outcome.status
    }

    /// Replay an add parked before login. The marker is cleared before the
    /// request, so it runs at most once whatever the outcome.
    pub async fn replay_pending_add(&self) -> Option<AddFlow> {
        if !self.constants.is_logged_in || self.pending().peek(PendingKind::Add).is_none() {
            return None;
        }
        let action = self.pending().take(PendingKind::Add)?;
        debug!(action = %action, "replaying add after login");

        let request = AddPackageRequest::new(action.package_id.clone(), action.purchase_type());
        let outcome = self.send_add(&request).await;
        let AddOutcome {
            status,
            options_form,
            ..
        } = outcome;

        Some(if let Some(form) = options_form {
            self.ui
                .open_options_popup(&request.package_id, request.purchase_type, form, None);
            AddFlow::OptionsRequested
        } else if status {
            self.ui.package_state_changed(&request.package_id, 1).await;
            AddFlow::Added
        } else {
            self.ui.navigate(&package_page_path(&request.package_id));
            AddFlow::Failed
        })
    }

    /// Reopen a gift form parked before login.
    pub fn replay_pending_gift(&self) -> bool {
        if !self.constants.is_logged_in || self.pending().peek(PendingKind::Gift).is_none() {
            return false;
        }
        match self.pending().take(PendingKind::Gift) {
            Some(action) => {
                self.ui
                    .open_gift_form(&action.package_id, action.purchase_type());
                true
            }
            None => false,
        }
    }

    fn toast_message(&self, outcome: &AddOutcome<B::OptionsForm>) {
        if let Some(message) = &outcome.message {
            self.ui.toast(message, ToastKind::from_status(outcome.status));
        }
    }

    fn toast_generic_failure(&self) {
        self.ui
            .toast(&self.ui.translate("Failed to add to basket"), ToastKind::Error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockBackend, RecordingUi, page};
    use sf_storage::{ADD_AFTER_LOGIN_KEY, GIFT_AFTER_LOGIN_KEY, InMemoryStore};

    fn logged_out() -> TemplateConstants {
        TemplateConstants {
            login_required: true,
            is_logged_in: false,
            ..Default::default()
        }
    }

    fn logged_in() -> TemplateConstants {
        TemplateConstants {
            login_required: true,
            is_logged_in: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn add_while_logged_out_parks_the_action_and_opens_login() {
        let backend = MockBackend::default();
        let ui = RecordingUi::default();
        let store = InMemoryStore::default();
        let constants = logged_out();
        let actions = PackageActions::new(&backend, &ui, &store, &constants);

        let outcome = actions
            .add_clicked(&PackageId::from("14"), PurchaseType::Single)
            .await;

        assert!(outcome.is_none());
        assert_eq!(store.get(ADD_AFTER_LOGIN_KEY).as_deref(), Some("14/single"));
        assert_eq!(ui.events(), vec!["login"]);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn pending_add_is_replayed_once_after_login() {
        let backend = MockBackend::default();
        backend.queue_add(page(true, Some("تمت الإضافة"), None));
        let ui = RecordingUi::default();
        let store = InMemoryStore::default();
        store.set(ADD_AFTER_LOGIN_KEY, "14/single");
        let constants = logged_in();
        let actions = PackageActions::new(&backend, &ui, &store, &constants);

        assert_eq!(actions.replay_pending_add().await, Some(AddFlow::Added));
        assert_eq!(actions.replay_pending_add().await, None);

        assert_eq!(backend.calls(), vec!["add /checkout/packages/add/14/single"]);
        assert_eq!(store.get(ADD_AFTER_LOGIN_KEY), None);
        assert_eq!(ui.events(), vec!["toast info تمت الإضافة", "state 14 1"]);
    }

    #[tokio::test]
    async fn failed_replay_still_clears_the_marker_and_goes_to_the_package() {
        let backend = MockBackend::default();
        backend.queue_add(page(false, None, None));
        let ui = RecordingUi::default();
        let store = InMemoryStore::default();
        store.set(ADD_AFTER_LOGIN_KEY, "14/subscription");
        let constants = logged_in();
        let actions = PackageActions::new(&backend, &ui, &store, &constants);

        assert_eq!(actions.replay_pending_add().await, Some(AddFlow::Failed));
        assert_eq!(backend.calls(), vec!["add /checkout/packages/add/14/subscribe"]);
        assert_eq!(store.get(ADD_AFTER_LOGIN_KEY), None);
        assert!(ui.events().contains(&"navigate /package/14".to_owned()));
    }

    #[tokio::test]
    async fn replay_waits_for_login() {
        let backend = MockBackend::default();
        let ui = RecordingUi::default();
        let store = InMemoryStore::default();
        store.set(ADD_AFTER_LOGIN_KEY, "14/single");
        let constants = logged_out();
        let actions = PackageActions::new(&backend, &ui, &store, &constants);

        assert_eq!(actions.replay_pending_add().await, None);
        assert_eq!(store.get(ADD_AFTER_LOGIN_KEY).as_deref(), Some("14/single"));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn options_fragment_opens_the_options_popup() {
        let backend = MockBackend::default();
        backend.queue_add(page(true, None, Some("server-field")));
        let ui = RecordingUi::default();
        let store = InMemoryStore::default();
        let constants = logged_in();
        let actions = PackageActions::new(&backend, &ui, &store, &constants);

        let outcome = actions
            .add_clicked(&PackageId::from("22"), PurchaseType::Subscribe)
            .await
            .unwrap();
        assert!(outcome.closes_origin());
        let request = AddPackageRequest::new(PackageId::from("22"), PurchaseType::Subscribe);
        assert_eq!(actions.follow_up(request, outcome).await, AddFlow::OptionsRequested);
        assert_eq!(ui.events(), vec!["options 22 subscribe server-field -"]);
    }

    #[tokio::test]
    async fn silent_failure_gets_a_generic_toast() {
        let backend = MockBackend::default();
        backend.fail_next_add();
        let ui = RecordingUi::default();
        let store = InMemoryStore::default();
        let constants = TemplateConstants::default();
        let actions = PackageActions::new(&backend, &ui, &store, &constants);

        let outcome = actions
            .add_clicked(&PackageId::from("14"), PurchaseType::Single)
            .await
            .unwrap();
        let request = AddPackageRequest::new(PackageId::from("14"), PurchaseType::Single);
        assert_eq!(actions.follow_up(request, outcome).await, AddFlow::Failed);
        assert_eq!(ui.events(), vec!["toast error Failed to add to basket"]);
    }

    #[tokio::test]
    async fn empty_gift_username_never_reaches_the_network() {
        let backend = MockBackend::default();
        let ui = RecordingUi::default();
        let store = InMemoryStore::default();
        let constants = logged_in();
        let actions = PackageActions::new(&backend, &ui, &store, &constants);

        let result = actions
            .submit_gift(&PackageId::from("14"), PurchaseType::Single, "   ")
            .await;
        assert!(result.is_none());
        assert!(backend.calls().is_empty());
        assert_eq!(ui.events(), vec!["toast error Please enter a username"]);
    }

    #[tokio::test]
    async fn gift_uses_the_gift_path_and_rejects_bad_usernames() {
        let backend = MockBackend::default();
        backend.queue_add(page(true, Some(GIFT_INVALID_USERNAME), None));
        let ui = RecordingUi::default();
        let store = InMemoryStore::default();
        let constants = logged_in();
        let actions = PackageActions::new(&backend, &ui, &store, &constants);

        let (request, outcome) = actions
            .submit_gift(&PackageId::from("14"), PurchaseType::Single, " steve ")
            .await
            .unwrap();
        assert_eq!(request.gift_to.as_deref(), Some("steve"));
        assert!(!outcome.status);
        assert_eq!(backend.calls(), vec!["add /checkout/packages/add/14/single/gift?username=steve"]);
    }

    #[tokio::test]
    async fn gift_while_logged_out_uses_its_own_marker() {
        let backend = MockBackend::default();
        let ui = RecordingUi::default();
        let store = InMemoryStore::default();
        let constants = logged_out();
        let actions = PackageActions::new(&backend, &ui, &store, &constants);

        assert_eq!(actions.gift_clicked(&PackageId::from("9"), "both").await, None);
        assert_eq!(store.get(GIFT_AFTER_LOGIN_KEY).as_deref(), Some("9/single"));
        assert_eq!(store.get(ADD_AFTER_LOGIN_KEY), None);
    }

    #[tokio::test]
    async fn pending_gift_reopens_the_form() {
        let backend = MockBackend::default();
        let ui = RecordingUi::default();
        let store = InMemoryStore::default();
        store.set(GIFT_AFTER_LOGIN_KEY, "9/subscribe");
        let constants = logged_in();
        let actions = PackageActions::new(&backend, &ui, &store, &constants);

        assert!(actions.replay_pending_gift());
        assert!(!actions.replay_pending_gift());
        assert_eq!(ui.events(), vec!["gift 9 subscribe"]);
    }

    #[tokio::test]
    async fn options_submit_reports_success() {
        let backend = MockBackend::default();
        backend.queue_add(page(true, None, None));
        let ui = RecordingUi::default();
        let store = InMemoryStore::default();
        let constants = logged_in();
        let actions = PackageActions::new(&backend, &ui, &store, &constants);

        let request = AddPackageRequest::new(PackageId::from("22"), PurchaseType::Single);
        let fields = vec![("server".to_owned(), "eu-1".to_owned())];
        assert!(actions.submit_options(&request, &fields).await);
        assert_eq!(backend.calls(), vec!["options /checkout/packages/add/22/single server=eu-1"]);
    }
}
