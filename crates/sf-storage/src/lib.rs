use sf_api_types::PendingAction;
use std::cell::RefCell;
use std::collections::HashMap;
use tracing::warn;

pub const ADD_AFTER_LOGIN_KEY: &str = "add-after-login";
pub const GIFT_AFTER_LOGIN_KEY: &str = "gift-after-login";

/// String key/value storage with browser `localStorage` semantics.
///
/// Single-threaded by design: the browser implementation wraps a JS object.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

#[derive(Default)]
pub struct NoopStore;

impl KeyValueStore for NoopStore {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&self, _key: &str, _value: &str) {}

    fn remove(&self, _key: &str) {}
}

#[derive(Default)]
pub struct InMemoryStore {
    values: RefCell<HashMap<String, String>>,
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
    }

    fn remove(&self, key: &str) {
        self.values.borrow_mut().remove(key);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PendingKind {
    Add,
    Gift,
}

impl PendingKind {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Add => ADD_AFTER_LOGIN_KEY,
            Self::Gift => GIFT_AFTER_LOGIN_KEY,
        }
    }
}

/// Actions remembered across the login round-trip.
pub struct PendingActions<'a, S: KeyValueStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: KeyValueStore + ?Sized> PendingActions<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn remember(&self, kind: PendingKind, action: &PendingAction) {
        self.store.set(kind.key(), &action.to_string());
    }

    pub fn peek(&self, kind: PendingKind) -> Option<String> {
        self.store.get(kind.key())
    }

    /// Remove the marker before parsing it, so a malformed or failing action
    /// is never replayed twice.
    pub fn take(&self, kind: PendingKind) -> Option<PendingAction> {
        let raw = self.store.get(kind.key())?;
        self.store.remove(kind.key());
        match raw.parse() {
            Ok(action) => Some(action),
            Err(err) => {
                warn!(key = kind.key(), "dropping pending action: {err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_api_types::PackageId;

    #[test]
    fn remember_then_take_clears_the_marker() {
        let store = InMemoryStore::default();
        let pending = PendingActions::new(&store);
        pending.remember(PendingKind::Add, &PendingAction::new(PackageId::from("14"), "single"));
        assert_eq!(store.get(ADD_AFTER_LOGIN_KEY).as_deref(), Some("14/single"));

        let action = pending.take(PendingKind::Add).unwrap();
        assert_eq!(action.package_id, PackageId::from("14"));
        assert_eq!(store.get(ADD_AFTER_LOGIN_KEY), None);
        assert!(pending.take(PendingKind::Add).is_none());
    }

    #[test]
    fn malformed_marker_is_still_cleared() {
        let store = InMemoryStore::default();
        store.set(GIFT_AFTER_LOGIN_KEY, "garbage");
        let pending = PendingActions::new(&store);
        assert!(pending.take(PendingKind::Gift).is_none());
        assert_eq!(pending.peek(PendingKind::Gift), None);
    }

    #[test]
    fn add_and_gift_markers_are_separate() {
        let store = InMemoryStore::default();
        let pending = PendingActions::new(&store);
        pending.remember(PendingKind::Gift, &PendingAction::new(PackageId::from("9"), "subscribe"));
        assert!(pending.peek(PendingKind::Add).is_none());
        assert_eq!(pending.peek(PendingKind::Gift).as_deref(), Some("9/subscribe"));
    }

    #[test]
    fn noop_store_forgets() {
        let store = NoopStore;
        store.set("k", "v");
        assert_eq!(store.get("k"), None);
    }
}
