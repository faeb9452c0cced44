use crate::backend::BasketBackend;
use futures::FutureExt;
use futures::future::{LocalBoxFuture, Shared};
use sf_api_types::{CheckoutColor, CheckoutConfig, TemplateConstants};
use std::cell::RefCell;
use std::future::Future;
use tracing::warn;

type IdentFuture = Shared<LocalBoxFuture<'static, Option<String>>>;

/// Fetch the basket ident. Errors and empty idents resolve to `None`.
pub async fn resolve_ident<B: BasketBackend + ?Sized>(backend: &B) -> Option<String> {
    match backend.basket_ident().await {
        Ok(Some(ident)) if !ident.trim().is_empty() => Some(ident),
        Ok(_) => {
            warn!("basket ident missing from response");
            None
        }
        Err(err) => {
            warn!("failed to fetch basket ident: {err}");
            None
        }
    }
}

/// The in-flight basket ident, awaited by the checkout button.
///
/// Opening the basket starts a fresh fetch; a completed payment resets it.
#[derive(Default)]
pub struct IdentSlot {
    current: RefCell<Option<IdentFuture>>,
}

impl IdentSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start<F>(&self, fetch: F)
    where
        F: Future<Output = Option<String>> + 'static,
    {
        *self.current.borrow_mut() = Some(fetch.boxed_local().shared());
    }

    /// The current fetch, if one has been started. Clones share one result.
    pub fn pending(&self) -> Option<IdentFuture> {
        self.current.borrow().clone()
    }

    pub fn reset(&self) {
        self.current.borrow_mut().take();
    }

    pub fn is_started(&self) -> bool {
        self.current.borrow().is_some()
    }
}

/// Payload for the hosted checkout. Colors come from the body's computed
/// `--color-primary`/`--color-secondary` and are passed through trimmed.
pub fn checkout_config(
    ident: String,
    constants: &TemplateConstants,
    primary: &str,
    secondary: &str,
) -> CheckoutConfig {
    CheckoutConfig {
        ident,
        theme: constants.checkout_theme.clone(),
        locale: constants.locale.clone(),
        colors: vec![
            CheckoutColor {
                name: "primary".to_owned(),
                color: primary.trim().to_owned(),
            },
            CheckoutColor {
                name: "secondary".to_owned(),
                color: secondary.trim().to_owned(),
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBackend;
    use std::cell::Cell;
    use std::rc::Rc;

    #[tokio::test]
    async fn ident_errors_resolve_to_none() {
        let backend = MockBackend::default();
        backend.set_ident(None);
        assert_eq!(resolve_ident(&backend).await, None);

        backend.set_ident(Some("   "));
        assert_eq!(resolve_ident(&backend).await, None);

        backend.set_ident(Some("9f1c-basket"));
        assert_eq!(resolve_ident(&backend).await.as_deref(), Some("9f1c-basket"));
    }

    #[tokio::test]
    async fn slot_shares_one_fetch_until_reset() {
        let polls = Rc::new(Cell::new(0));
        let slot = IdentSlot::new();
        assert!(slot.pending().is_none());

        let counter = polls.clone();
        slot.start(async move {
            counter.set(counter.get() + 1);
            Some("abc".to_owned())
        });

        let first = slot.pending().unwrap().await;
        let second = slot.pending().unwrap().await;
        assert_eq!(first.as_deref(), Some("abc"));
        assert_eq!(second, first);
        assert_eq!(polls.get(), 1);

        slot.reset();
        assert!(!slot.is_started());
    }

    #[test]
    fn config_carries_theme_locale_and_trimmed_colors() {
        let constants = TemplateConstants {
            checkout_theme: "dark".to_owned(),
            locale: "ar_SA".to_owned(),
            ..Default::default()
        };
        let config = checkout_config("abc".to_owned(), &constants, " #1f6feb", "#0d1117 ");
        assert_eq!(config.theme, "dark");
        assert_eq!(config.locale, "ar_SA");
        assert_eq!(config.colors[0].color, "#1f6feb");
        assert_eq!(config.colors[1].name, "secondary");
        assert_eq!(config.colors[1].color, "#0d1117");
    }
}
