//! Optimistic quantities and how they reconcile with the server.
//!
//! The UI shows a new quantity before the push completes. The ledger keeps the
//! last quantity the server accepted so a failed push can be undone.

use sf_api_types::PackageId;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReconcilePolicy {
    /// Restore the last confirmed quantity on every widget after a failed push.
    #[default]
    Rollback,
    /// Leave the optimistic value on screen; the next basket fetch is the source of truth.
    KeepOptimistic,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Tracked {
    shown: u32,
    confirmed: u32,
}

#[derive(Clone, Debug, Default)]
pub struct QuantityLedger {
    policy: ReconcilePolicy,
    packages: HashMap<PackageId, Tracked>,
}

/// What the UI should do once a push settles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Settlement {
    Confirmed(u32),
    /// Push failed; show this quantity again.
    RolledBack(u32),
    /// Push failed; the optimistic quantity stays.
    Kept(u32),
}

impl QuantityLedger {
    pub fn new(policy: ReconcilePolicy) -> Self {
        Self {
            policy,
            packages: HashMap::new(),
        }
    }

    pub fn policy(&self) -> ReconcilePolicy {
        self.policy
    }

    /// Record a quantity the server reported (page render, basket refresh).
    pub fn observe(&mut self, package: &PackageId, quantity: u32) {
        self.packages.insert(
            package.clone(),
            Tracked {
                shown: quantity,
                confirmed: quantity,
            },
        );
    }

    /// The user changed the quantity; the push has not completed yet.
    pub fn propose(&mut self, package: &PackageId, quantity: u32) {
        self.packages.entry(package.clone()).or_default().shown = quantity;
    }

    pub fn shown(&self, package: &PackageId) -> u32 {
        self.packages.get(package).map_or(0, |t| t.shown)
    }

    pub fn confirmed(&self, package: &PackageId) -> u32 {
        self.packages.get(package).map_or(0, |t| t.confirmed)
    }

    pub fn settle(&mut self, package: &PackageId, pushed_ok: bool) -> Settlement {
        let tracked = self.packages.entry(package.clone()).or_default();
        if pushed_ok {
            tracked.confirmed = tracked.shown;
            return Settlement::Confirmed(tracked.shown);
        }
        match self.policy {
            ReconcilePolicy::Rollback => {
                tracked.shown = tracked.confirmed;
                Settlement::RolledBack(tracked.confirmed)
            }
            ReconcilePolicy::KeepOptimistic => Settlement::Kept(tracked.shown),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_push_confirms_the_shown_value() {
        let id = PackageId::from("14");
        let mut ledger = QuantityLedger::new(ReconcilePolicy::Rollback);
        ledger.observe(&id, 1);
        ledger.propose(&id, 4);
        assert_eq!(ledger.settle(&id, true), Settlement::Confirmed(4));
        assert_eq!(ledger.confirmed(&id), 4);
    }

    #[test]
    fn failed_push_rolls_back_to_confirmed() {
        let id = PackageId::from("14");
        let mut ledger = QuantityLedger::new(ReconcilePolicy::Rollback);
        ledger.observe(&id, 2);
        ledger.propose(&id, 5);
        assert_eq!(ledger.shown(&id), 5);
        assert_eq!(ledger.settle(&id, false), Settlement::RolledBack(2));
        assert_eq!(ledger.shown(&id), 2);
    }

    #[test]
    fn keep_optimistic_leaves_the_value() {
        let id = PackageId::from("14");
        let mut ledger = QuantityLedger::new(ReconcilePolicy::KeepOptimistic);
        ledger.observe(&id, 2);
        ledger.propose(&id, 0);
        assert_eq!(ledger.settle(&id, false), Settlement::Kept(0));
        assert_eq!(ledger.confirmed(&id), 2);
    }

    #[test]
    fn unknown_packages_start_at_zero() {
        let id = PackageId::from("new");
        let mut ledger = QuantityLedger::default();
        ledger.propose(&id, 1);
        assert_eq!(ledger.settle(&id, false), Settlement::RolledBack(0));
    }
}
