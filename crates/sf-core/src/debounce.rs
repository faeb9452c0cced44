//! Trailing-edge debounce bookkeeping.
//!
//! Each trigger hands out a ticket; after the quiet window the caller only runs
//! if its ticket is still the latest for that group.

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug)]
pub struct Debouncer<K> {
    next: u64,
    latest: HashMap<K, u64>,
}

impl<K: Eq + Hash> Default for Debouncer<K> {
    fn default() -> Self {
        Self {
            next: 0,
            latest: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> Debouncer<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&mut self, group: &K) -> Ticket {
        self.next += 1;
        self.latest.insert(group.clone(), self.next);
        Ticket(self.next)
    }

    /// Called when the window elapses. `true` exactly once, for the latest ticket.
    pub fn fire(&mut self, group: &K, ticket: Ticket) -> bool {
        if self.latest.get(group) == Some(&ticket.0) {
            self.latest.remove(group);
            true
        } else {
            false
        }
    }

    pub fn cancel(&mut self, group: &K) {
        self.latest.remove(group);
    }

    pub fn is_pending(&self, group: &K) -> bool {
        self.latest.contains_key(group)
    }
}
