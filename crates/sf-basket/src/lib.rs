//! Basket synchronization and package actions against the billing provider.
//!
//! The flows here are written against two seams: [`BasketBackend`] for the
//! provider's HTTP endpoints and [`StorefrontUi`] for whatever renders popups
//! and toasts. The WASM frontend implements both over the DOM.

pub mod actions;
pub mod backend;
pub mod checkout;
pub mod sync;
pub mod ui;

pub use actions::{AddFlow, PackageActions};
pub use backend::{AddOutcome, AddResponse, BackendError, BasketBackend};
pub use checkout::{IdentSlot, checkout_config, resolve_ident};
pub use sync::BasketSync;
pub use ui::StorefrontUi;

#[cfg(test)]
pub(crate) mod testing;
