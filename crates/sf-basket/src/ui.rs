use async_trait::async_trait;
use sf_api_types::{PackageId, PurchaseType, ToastKind};

/// Presentation surface the package flows drive.
#[async_trait(?Send)]
pub trait StorefrontUi {
    type OptionsForm;

    /// Localize a UI string (the page's `__` function).
    fn translate(&self, text: &str) -> String;

    fn toast(&self, message: &str, kind: ToastKind);

    async fn open_login_popup(&self);

    fn open_options_popup(
        &self,
        package_id: &PackageId,
        purchase_type: PurchaseType,
        form: Self::OptionsForm,
        gift_to: Option<String>,
    );

    fn open_gift_form(&self, package_id: &PackageId, purchase_type: PurchaseType);

    /// Clear `updating` on every widget of the package, render `count`, and
    /// open or refresh the basket.
    async fn package_state_changed(&self, package_id: &PackageId, count: u32);

    /// Full page navigation to a same-origin path.
    fn navigate(&self, path: &str);
}
