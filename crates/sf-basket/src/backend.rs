use async_trait::async_trait;
use sf_api_types::{AddPackageRequest, GIFT_INVALID_USERNAME, PackageId};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("fetch error: {0}")]
    Network(String),
    #[error("{status} {status_text}")]
    Status { status: u16, status_text: String },
    #[error("request aborted")]
    Aborted,
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Facts extracted from an add-to-basket response page.
#[derive(Debug)]
pub struct AddResponse<F> {
    pub ok: bool,
    /// The page contained the `.site` wrapper.
    pub has_site: bool,
    /// `data-toast` on `.site`.
    pub toast: Option<String>,
    /// Children of `[data-popup].store-product-options`, when the package needs options.
    pub options_form: Option<F>,
    pub body: String,
}

#[derive(Debug)]
pub struct AddOutcome<F> {
    pub status: bool,
    pub message: Option<String>,
    pub options_form: Option<F>,
}

impl<F> AddOutcome<F> {
    /// `invalid_username` is the localized form of [`GIFT_INVALID_USERNAME`].
    pub fn classify(response: AddResponse<F>, invalid_username: &str) -> Self {
        if !response.has_site && !response.ok {
            return Self {
                status: false,
                message: Some(response.body).filter(|b| !b.trim().is_empty()),
                options_form: None,
            };
        }

        let message = response.toast.filter(|t| !t.is_empty());
        let rejected = message
            .as_deref()
            .is_some_and(|t| t == GIFT_INVALID_USERNAME || t == invalid_username);

        match response.options_form {
            Some(form) => Self {
                status: true,
                message,
                options_form: Some(form),
            },
            None => Self {
                status: !rejected,
                message,
                options_form: None,
            },
        }
    }

    pub fn failed() -> Self {
        Self {
            status: false,
            message: None,
            options_form: None,
        }
    }

    /// The popup that triggered the add should close before the follow-up runs.
    pub fn closes_origin(&self) -> bool {
        self.options_form.is_some() || self.status
    }
}

/// The billing provider's basket endpoints.
#[async_trait(?Send)]
pub trait BasketBackend {
    type OptionsForm;

    /// `GET /checkout/packages/add/{id}/{type}[/gift?username=]`
    async fn add_package(
        &self,
        request: &AddPackageRequest,
    ) -> Result<AddResponse<Self::OptionsForm>, BackendError>;

    /// `POST` to the add path with the options form fields, `username` and `submit=1`.
    async fn add_package_with_options(
        &self,
        request: &AddPackageRequest,
        fields: &[(String, String)],
    ) -> Result<AddResponse<Self::OptionsForm>, BackendError>;

    /// `POST /checkout/update`
    async fn update_quantities(&self, quantities: &BTreeMap<String, u32>) -> Result<(), BackendError>;

    /// `GET /checkout/packages/remove/{id}`
    async fn remove_package(&self, package_id: &PackageId) -> Result<(), BackendError>;

    /// `GET /checkout/ident`
    async fn basket_ident(&self) -> Result<Option<String>, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(ok: bool, has_site: bool, toast: Option<&str>, options: Option<&str>) -> AddResponse<String> {
        AddResponse {
            ok,
            has_site,
            toast: toast.map(str::to_owned),
            options_form: options.map(str::to_owned),
            body: "Server exploded".to_owned(),
        }
    }

    #[test]
    fn missing_site_on_error_reports_the_body() {
        let outcome = AddOutcome::classify(response(false, false, None, None), "");
        assert!(!outcome.status);
        assert_eq!(outcome.message.as_deref(), Some("Server exploded"));
    }

    #[test]
    fn toast_is_carried_as_message() {
        let outcome = AddOutcome::classify(response(true, true, Some("Added to basket"), None), "");
        assert!(outcome.status);
        assert_eq!(outcome.message.as_deref(), Some("Added to basket"));
        assert!(outcome.closes_origin());
    }

    #[test]
    fn invalid_gift_username_is_a_rejection_in_either_language() {
        let english = AddOutcome::classify(response(true, true, Some(GIFT_INVALID_USERNAME), None), "اسم مستخدم غير صالح");
        assert!(!english.status);

        let arabic = AddOutcome::classify(response(true, true, Some("اسم مستخدم غير صالح"), None), "اسم مستخدم غير صالح");
        assert!(!arabic.status);
        assert!(!arabic.closes_origin());
    }

    #[test]
    fn options_fragment_requests_more_input() {
        let outcome = AddOutcome::classify(response(true, true, None, Some("<form/>")), "");
        assert!(outcome.status);
        assert_eq!(outcome.options_form.as_deref(), Some("<form/>"));
    }

    #[test]
    fn site_present_on_error_status_still_parses_toast() {
        let outcome = AddOutcome::classify(response(false, true, Some("Out of stock"), None), "");
        assert!(outcome.status);
        assert_eq!(outcome.message.as_deref(), Some("Out of stock"));
    }
}
