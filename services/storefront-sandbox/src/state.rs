use crate::catalog::{Catalog, Package};
use crate::config::SandboxConfig;
use sf_api_types::PurchaseType;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) config: Arc<SandboxConfig>,
    pub(crate) catalog: Arc<Catalog>,
    pub(crate) session: Arc<RwLock<Session>>,
}

impl AppState {
    pub(crate) fn new(config: SandboxConfig) -> Self {
        let session = Session::new(config.logged_in.then(|| "sandbox".to_owned()));
        Self {
            config: Arc::new(config),
            catalog: Arc::new(Catalog::seeded()),
            session: Arc::new(RwLock::new(session)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BasketLine {
    pub(crate) quantity: u32,
    pub(crate) purchase_type: PurchaseType,
    pub(crate) gift_to: Option<String>,
    pub(crate) options: Vec<(String, String)>,
}

/// One customer: login state plus basket. The sandbox serves a single session.
#[derive(Debug, Default)]
pub(crate) struct Session {
    pub(crate) username: Option<String>,
    lines: BTreeMap<String, BasketLine>,
    ident: Option<Uuid>,
}

impl Session {
    pub(crate) fn new(username: Option<String>) -> Self {
        Self {
            username,
            ..Default::default()
        }
    }

    pub(crate) fn is_logged_in(&self) -> bool {
        self.username.is_some()
    }

    pub(crate) fn lines(&self) -> impl Iterator<Item = (&String, &BasketLine)> {
        self.lines.iter()
    }

    pub(crate) fn quantity(&self, package_id: &str) -> u32 {
        self.lines.get(package_id).map_or(0, |l| l.quantity)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Adds one unit, respecting the package's maximum.
    pub(crate) fn add(
        &mut self,
        package: &Package,
        purchase_type: PurchaseType,
        gift_to: Option<String>,
        options: Vec<(String, String)>,
    ) -> u32 {
        let line = self
            .lines
            .entry(package.id.to_owned())
            .or_insert_with(|| BasketLine {
                quantity: 0,
                purchase_type,
                gift_to: None,
                options: Vec::new(),
            });
        let max = package.max_quantity.unwrap_or(u32::MAX);
        line.quantity = (line.quantity + 1).min(max);
        line.purchase_type = purchase_type;
        line.gift_to = gift_to;
        if !options.is_empty() {
            line.options = options;
        }
        self.ident = None;
        line.quantity
    }

    /// Zero removes the line. Returns false when the package is not in the basket.
    pub(crate) fn set_quantity(&mut self, package: &Package, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(package.id);
        }
        let Some(line) = self.lines.get_mut(package.id) else {
            return false;
        };
        line.quantity = quantity.min(package.max_quantity.unwrap_or(u32::MAX));
        self.ident = None;
        true
    }

    pub(crate) fn remove(&mut self, package_id: &str) -> bool {
        let removed = self.lines.remove(package_id).is_some();
        if removed {
            self.ident = None;
        }
        removed
    }

    /// Stable while the basket is unchanged; `None` for an empty basket.
    pub(crate) fn ident(&mut self) -> Option<Uuid> {
        if self.lines.is_empty() {
            return None;
        }
        Some(*self.ident.get_or_insert_with(Uuid::new_v4))
    }

    pub(crate) fn total(&self, catalog: &Catalog) -> f64 {
        self.lines
            .iter()
            .filter_map(|(id, line)| catalog.get(id).map(|p| p.price * f64::from(line.quantity)))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_respects_max_quantity() {
        let catalog = Catalog::seeded();
        let activation = catalog.get("activation").unwrap();
        let mut session = Session::default();
        assert_eq!(session.add(activation, PurchaseType::Single, None, Vec::new()), 1);
        assert_eq!(session.add(activation, PurchaseType::Single, None, Vec::new()), 1);
    }

    #[test]
    fn zero_quantity_removes_the_line() {
        let catalog = Catalog::seeded();
        let priority = catalog.get("priority-entry").unwrap();
        let mut session = Session::default();
        session.add(priority, PurchaseType::Single, None, Vec::new());
        assert!(session.set_quantity(priority, 4));
        assert_eq!(session.total(&catalog), 120.0);
        assert!(session.set_quantity(priority, 0));
        assert!(session.is_empty());
    }

    #[test]
    fn ident_changes_when_the_basket_does() {
        let catalog = Catalog::seeded();
        let priority = catalog.get("priority-entry").unwrap();
        let mut session = Session::default();
        assert_eq!(session.ident(), None);

        session.add(priority, PurchaseType::Single, None, Vec::new());
        let first = session.ident();
        assert!(first.is_some());
        assert_eq!(session.ident(), first);

        session.set_quantity(priority, 2);
        assert_ne!(session.ident(), first);
    }
}
