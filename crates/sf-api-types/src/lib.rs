use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const BASKET_PATH: &str = "/checkout/basket";
pub const BASKET_HASH: &str = "#basket";
pub const LOGIN_PATH: &str = "/login";
pub const UPDATE_PATH: &str = "/checkout/update";
pub const IDENT_PATH: &str = "/checkout/ident";
pub const ADD_PATH_PREFIX: &str = "/checkout/packages/add/";

/// Server-side message signalling a rejected gift recipient.
pub const GIFT_INVALID_USERNAME: &str = "Please enter a valid username.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct PackageId(pub String);

impl PackageId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PackageId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseType {
    #[default]
    Single,
    Subscribe,
}

impl PurchaseType {
    /// Normalises the loose spellings found in markup; anything unknown is a one-off purchase.
    pub fn sanitize(raw: &str) -> Self {
        match raw {
            "subscribe" | "subscription" => Self::Subscribe,
            _ => Self::Single,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Subscribe => "subscribe",
        }
    }
}

impl fmt::Display for PurchaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry stored in `history.state`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HistoryState {
    Page {
        url: String,
        #[serde(default)]
        title: Option<String>,
    },
    Popup {
        url: String,
        #[serde(default)]
        title: Option<String>,
    },
}

impl HistoryState {
    pub fn url(&self) -> &str {
        match self {
            Self::Page { url, .. } | Self::Popup { url, .. } => url,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            Self::Page { title, .. } | Self::Popup { title, .. } => title.as_deref(),
        }
    }

    pub fn is_popup(&self) -> bool {
        matches!(self, Self::Popup { .. })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl ToastKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    pub fn from_status(ok: bool) -> Self {
        if ok { Self::Info } else { Self::Error }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDirection {
    Left,
    Right,
    Up,
    #[default]
    Down,
}

impl SwipeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Up => "up",
            Self::Down => "down",
        }
    }

    pub fn is_horizontal(&self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }
}

/// Constants injected by the page template as `__kTemplateConstants`.
/// Each field is read on its own: one malformed value falls back to its
/// default without resetting the others.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateConstants {
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub login_required: bool,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub is_logged_in: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub toast: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub toast_type: Option<ToastKind>,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub checkout_theme: String,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub locale: String,
}

/// A value of the wrong shape reads as absent instead of failing the whole struct.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Maybe<T> {
        Valid(T),
        Invalid(serde::de::IgnoredAny),
    }

    Ok(match Option::<Maybe<T>>::deserialize(deserializer)? {
        Some(Maybe::Valid(value)) => Some(value),
        _ => None,
    })
}

fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    lenient(deserializer).map(Option::unwrap_or_default)
}

impl TemplateConstants {
    pub fn must_login(&self) -> bool {
        self.login_required && !self.is_logged_in
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BasketIdentResponse {
    #[serde(default)]
    pub ident: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckoutColor {
    pub name: String,
    pub color: String,
}

/// Payload handed to the hosted checkout widget's `init`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckoutConfig {
    pub ident: String,
    pub theme: String,
    pub locale: String,
    pub colors: Vec<CheckoutColor>,
}

/// Add-to-basket call, optionally as a gift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddPackageRequest {
    pub package_id: PackageId,
    pub purchase_type: PurchaseType,
    pub gift_to: Option<String>,
}

impl AddPackageRequest {
    pub fn new(package_id: PackageId, purchase_type: PurchaseType) -> Self {
        Self {
            package_id,
            purchase_type,
            gift_to: None,
        }
    }

    pub fn gift(mut self, username: impl Into<String>) -> Self {
        self.gift_to = Some(username.into());
        self
    }

    /// `/checkout/packages/add/{id}/{type}` with a `/gift` suffix for gifts.
    /// The recipient travels as the `username` query parameter.
    pub fn path(&self) -> String {
        let mut path = format!(
            "{ADD_PATH_PREFIX}{}/{}",
            self.package_id, self.purchase_type
        );
        if self.gift_to.is_some() {
            path.push_str("/gift");
        }
        path
    }
}

pub fn remove_package_path(package_id: &PackageId) -> String {
    format!("/checkout/packages/remove/{package_id}")
}

pub fn package_page_path(package_id: &PackageId) -> String {
    format!("/package/{package_id}")
}

/// Action deferred until after login, persisted as `"{packageId}/{type}"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAction {
    pub package_id: PackageId,
    pub kind: String,
}

impl PendingAction {
    pub fn new(package_id: PackageId, kind: impl Into<String>) -> Self {
        Self {
            package_id,
            kind: kind.into(),
        }
    }

    pub fn purchase_type(&self) -> PurchaseType {
        PurchaseType::sanitize(&self.kind)
    }
}

impl fmt::Display for PendingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.package_id, self.kind)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("pending action must look like `<package>/<type>`, got {0:?}")]
pub struct ParsePendingActionError(pub String);

impl FromStr for PendingAction {
    type Err = ParsePendingActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('/');
        match (parts.next(), parts.next()) {
            (Some(id), Some(kind)) if !id.is_empty() && !kind.is_empty() => {
                Ok(Self::new(PackageId::from(id), kind))
            }
            _ => Err(ParsePendingActionError(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_state_uses_type_tag() {
        let state = HistoryState::Popup {
            url: "/package/abc123".to_owned(),
            title: Some("VIP".to_owned()),
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["type"], "popup");
        assert_eq!(json["url"], "/package/abc123");

        let page: HistoryState =
            serde_json::from_str(r#"{"type":"page","url":"/","title":null}"#).unwrap();
        assert!(!page.is_popup());
        assert_eq!(page.title(), None);
    }

    #[test]
    fn purchase_type_sanitizes_loose_values() {
        assert_eq!(PurchaseType::sanitize("subscription"), PurchaseType::Subscribe);
        assert_eq!(PurchaseType::sanitize("subscribe"), PurchaseType::Subscribe);
        assert_eq!(PurchaseType::sanitize("both"), PurchaseType::Single);
        assert_eq!(PurchaseType::sanitize(""), PurchaseType::Single);
    }

    #[test]
    fn add_request_paths() {
        let req = AddPackageRequest::new(PackageId::from("14"), PurchaseType::Single);
        assert_eq!(req.path(), "/checkout/packages/add/14/single");

        let gift = AddPackageRequest::new(PackageId::from("14"), PurchaseType::Subscribe).gift("steve");
        assert_eq!(gift.path(), "/checkout/packages/add/14/subscribe/gift");
    }

    #[test]
    fn pending_action_parses_marker() {
        let action: PendingAction = "14/single".parse().unwrap();
        assert_eq!(action.package_id, PackageId::from("14"));
        assert_eq!(action.purchase_type(), PurchaseType::Single);
        assert_eq!(action.to_string(), "14/single");

        assert!("14".parse::<PendingAction>().is_err());
        assert!("/single".parse::<PendingAction>().is_err());
        assert!("14/".parse::<PendingAction>().is_err());
    }

    #[test]
    fn template_constants_read_camel_case() {
        let constants: TemplateConstants = serde_json::from_str(
            r#"{"loginRequired":true,"isLoggedIn":false,"toast":"مرحبا","toastType":"success","checkoutTheme":"dark","locale":"ar_SA"}"#,
        )
        .unwrap();
        assert!(constants.must_login());
        assert_eq!(constants.toast_type, Some(ToastKind::Success));
        assert_eq!(constants.locale, "ar_SA");
    }

    #[test]
    fn one_bad_template_constant_keeps_the_rest() {
        let constants: TemplateConstants = serde_json::from_str(
            r#"{"loginRequired":true,"isLoggedIn":false,"toast":"تمت الإضافة","toastType":"","locale":7}"#,
        )
        .unwrap();
        assert!(constants.must_login());
        assert_eq!(constants.toast.as_deref(), Some("تمت الإضافة"));
        assert_eq!(constants.toast_type, None);
        assert_eq!(constants.locale, "");

        let nulls: TemplateConstants =
            serde_json::from_str(r#"{"isLoggedIn":true,"toastType":null,"loginRequired":"yes"}"#).unwrap();
        assert!(nulls.is_logged_in);
        assert!(!nulls.login_required);
    }
}
