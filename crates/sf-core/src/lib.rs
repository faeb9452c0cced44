//! Browser-independent state machines behind the storefront popup layer.
//!
//! Everything here is plain data and transitions; the WASM crate feeds DOM
//! events in and applies the returned effects.

pub mod debounce;
pub mod drawer;
pub mod history;
pub mod ledger;
pub mod quantity;
pub mod registry;
pub mod routing;
pub mod timing;
pub mod toast;

use std::time::Duration;

pub const QUANTITY_DEBOUNCE: Duration = Duration::from_millis(1000);
pub const TOAST_TIMEOUT: Duration = Duration::from_millis(7000);
pub const DEFAULT_FADE: Duration = Duration::from_millis(300);
/// Slack added after the fade before a closed popup leaves the DOM.
pub const REMOVAL_SLACK: Duration = Duration::from_millis(20);
