use crate::backend::{BackendError, BasketBackend};
use sf_api_types::PackageId;
use sf_core::ledger::{QuantityLedger, Settlement};
use sf_core::quantity::{BasketQuantities, QuantityPush};
use std::cell::RefCell;
use tracing::{debug, warn};

/// Pushes debounced quantity changes and settles the optimistic ledger.
pub struct BasketSync<'a, B: ?Sized> {
    backend: &'a B,
    ledger: &'a RefCell<QuantityLedger>,
}

impl<'a, B: BasketBackend + ?Sized> BasketSync<'a, B> {
    pub fn new(backend: &'a B, ledger: &'a RefCell<QuantityLedger>) -> Self {
        Self { backend, ledger }
    }

    pub async fn push(&self, push: &QuantityPush) -> Result<(), BackendError> {
        match push {
            QuantityPush::Remove(package_id) => {
                debug!(package = %package_id, "removing package from basket");
                self.backend.remove_package(package_id).await
            }
            QuantityPush::Update(quantities) => {
                debug!(lines = quantities.len(), "updating basket quantities");
                self.backend.update_quantities(quantities).await
            }
        }
    }

    /// A single package widget settled on `quantity`.
    pub async fn push_package(&self, package_id: &PackageId, field: &str, quantity: u32) -> Settlement {
        self.ledger.borrow_mut().propose(package_id, quantity);
        let result = self
            .push(&QuantityPush::for_package(package_id, field, quantity))
            .await;
        if let Err(err) = &result {
            warn!(package = %package_id, "quantity push failed: {err}");
        }
        self.ledger.borrow_mut().settle(package_id, result.is_ok())
    }

    /// The basket popup's quantity inputs settled. Zero lines are removed,
    /// the rest go out in one update.
    pub async fn push_basket(&self, quantities: &BasketQuantities) -> Vec<(PackageId, Settlement)> {
        {
            let mut ledger = self.ledger.borrow_mut();
            for (package_id, line) in quantities.iter() {
                ledger.propose(package_id, line.quantity);
            }
        }

        let mut removed_ok = Vec::new();
        let mut update_ok = true;
        for push in quantities.plan_pushes() {
            let ok = match self.push(&push).await {
                Ok(()) => true,
                Err(err) => {
                    warn!("basket push failed: {err}");
                    false
                }
            };
            match push {
                QuantityPush::Remove(package_id) if ok => removed_ok.push(package_id),
                QuantityPush::Remove(_) => {}
                QuantityPush::Update(_) => update_ok = ok,
            }
        }

        let mut ledger = self.ledger.borrow_mut();
        quantities
            .iter()
            .map(|(package_id, line)| {
                let ok = if line.quantity == 0 {
                    removed_ok.contains(package_id)
                } else {
                    update_ok
                };
                (package_id.clone(), ledger.settle(package_id, ok))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBackend;
    use sf_core::ledger::ReconcilePolicy;

    #[tokio::test]
    async fn zero_quantity_becomes_a_removal() {
        let backend = MockBackend::default();
        let ledger = RefCell::new(QuantityLedger::default());
        let sync = BasketSync::new(&backend, &ledger);
        let id = PackageId::from("14");
        ledger.borrow_mut().observe(&id, 2);

        assert_eq!(sync.push_package(&id, "quantity[14]", 0).await, Settlement::Confirmed(0));
        assert_eq!(backend.calls(), vec!["remove /checkout/packages/remove/14"]);
    }

    #[tokio::test]
    async fn failed_update_rolls_back() {
        let backend = MockBackend::default();
        backend.fail_updates();
        let ledger = RefCell::new(QuantityLedger::new(ReconcilePolicy::Rollback));
        let sync = BasketSync::new(&backend, &ledger);
        let id = PackageId::from("14");
        ledger.borrow_mut().observe(&id, 2);

        assert_eq!(sync.push_package(&id, "quantity[14]", 5).await, Settlement::RolledBack(2));
        assert_eq!(ledger.borrow().shown(&id), 2);
    }

    #[tokio::test]
    async fn basket_push_removes_zeros_and_updates_the_rest_once() {
        let backend = MockBackend::default();
        let ledger = RefCell::new(QuantityLedger::default());
        let sync = BasketSync::new(&backend, &ledger);

        let mut quantities = BasketQuantities::new();
        quantities.set(PackageId::from("14"), "quantity[14]", 0);
        quantities.set(PackageId::from("30"), "quantity[30]", 3);
        quantities.set(PackageId::from("31"), "quantity[31]", 1);

        let settled = sync.push_basket(&quantities).await;
        assert_eq!(
            backend.calls(),
            vec![
                "remove /checkout/packages/remove/14",
                "update quantity[30]=3&quantity[31]=1",
            ]
        );
        assert!(settled.iter().all(|(_, s)| matches!(s, Settlement::Confirmed(_))));
    }

    #[tokio::test]
    async fn failed_bulk_update_keeps_optimistic_values_when_asked() {
        let backend = MockBackend::default();
        backend.fail_updates();
        let ledger = RefCell::new(QuantityLedger::new(ReconcilePolicy::KeepOptimistic));
        let sync = BasketSync::new(&backend, &ledger);

        let mut quantities = BasketQuantities::new();
        quantities.set(PackageId::from("30"), "quantity[30]", 4);
        let settled = sync.push_basket(&quantities).await;
        assert_eq!(settled, vec![(PackageId::from("30"), Settlement::Kept(4))]);
    }
}
