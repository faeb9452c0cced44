//! Mounted package widgets, keyed by package id.
//!
//! Widgets are registered when their markup is mounted (page load or popup
//! open) and dropped together with their scope, so listeners are wired exactly
//! once per mounted element.

use sf_api_types::PackageId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WidgetId(u32);

/// Where a widget lives: the page itself or one popup container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    Page,
    Popup(u32),
}

#[derive(Debug)]
struct Entry<W> {
    id: WidgetId,
    package: PackageId,
    scope: Scope,
    updating: bool,
    widget: W,
}

#[derive(Debug)]
pub struct WidgetRegistry<W> {
    next_id: u32,
    entries: Vec<Entry<W>>,
}

impl<W> Default for WidgetRegistry<W> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<W> WidgetRegistry<W> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, package: PackageId, scope: Scope, widget: W) -> WidgetId {
        let id = WidgetId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            package,
            scope,
            updating: false,
            widget,
        });
        id
    }

    /// Forget every widget mounted in `scope`. Returns how many were dropped.
    pub fn drop_scope(&mut self, scope: Scope) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.scope != scope);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: WidgetId) -> Option<&W> {
        self.entries.iter().find(|e| e.id == id).map(|e| &e.widget)
    }

    pub fn package_of(&self, id: WidgetId) -> Option<&PackageId> {
        self.entries.iter().find(|e| e.id == id).map(|e| &e.package)
    }

    /// Every mounted instance of `package`, in mount order.
    pub fn instances<'a>(&'a self, package: &'a PackageId) -> impl Iterator<Item = &'a W> + 'a {
        self.entries
            .iter()
            .filter(move |e| &e.package == package)
            .map(|e| &e.widget)
    }

    /// Instances of the same package other than `id`.
    pub fn siblings<'a>(&'a self, id: WidgetId) -> impl Iterator<Item = &'a W> + 'a {
        let package = self.package_of(id).cloned();
        self.entries
            .iter()
            .filter(move |e| e.id != id && Some(&e.package) == package.as_ref())
            .map(|e| &e.widget)
    }

    /// Mark a widget busy. Returns `false` when a request is already in flight for it.
    pub fn begin_update(&mut self, id: WidgetId) -> bool {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) if !entry.updating => {
                entry.updating = true;
                true
            }
            _ => false,
        }
    }

    pub fn is_updating(&self, id: WidgetId) -> bool {
        self.entries.iter().any(|e| e.id == id && e.updating)
    }

    pub fn finish_update(&mut self, id: WidgetId) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) {
            entry.updating = false;
        }
    }

    /// Clear the busy flag on every instance of `package`.
    pub fn settle(&mut self, package: &PackageId) {
        for entry in self.entries.iter_mut().filter(|e| &e.package == package) {
            entry.updating = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn siblings_cover_other_instances_of_the_same_package() {
        let mut registry = WidgetRegistry::new();
        let grid = registry.register(PackageId::from("14"), Scope::Page, "grid");
        registry.register(PackageId::from("14"), Scope::Popup(1), "popup");
        registry.register(PackageId::from("15"), Scope::Page, "other");

        let siblings: Vec<_> = registry.siblings(grid).copied().collect();
        assert_eq!(siblings, vec!["popup"]);

        let all: Vec<_> = registry.instances(&PackageId::from("14")).copied().collect();
        assert_eq!(all, vec!["grid", "popup"]);
    }

    #[test]
    fn begin_update_is_not_reentrant() {
        let mut registry = WidgetRegistry::new();
        let id = registry.register(PackageId::from("14"), Scope::Page, ());
        assert!(registry.begin_update(id));
        assert!(!registry.begin_update(id));
        registry.finish_update(id);
        assert!(registry.begin_update(id));
    }

    #[test]
    fn an_edit_reaches_other_instances_without_waiting_for_the_push() {
        use std::cell::Cell;

        let mut registry = WidgetRegistry::new();
        let grid = registry.register(PackageId::from("14"), Scope::Page, Cell::new(1));
        let popup = registry.register(PackageId::from("14"), Scope::Popup(1), Cell::new(1));
        let other = registry.register(PackageId::from("15"), Scope::Page, Cell::new(1));

        // Stepper click on the grid copy: mirror before anything is sent.
        registry.get(grid).unwrap().set(2);
        for sibling in registry.siblings(grid) {
            sibling.set(2);
        }
        assert!(!registry.is_updating(grid));
        assert_eq!(registry.get(popup).unwrap().get(), 2);
        assert_eq!(registry.get(other).unwrap().get(), 1);
    }

    #[test]
    fn a_second_submission_waits_for_the_first() {
        let mut registry = WidgetRegistry::new();
        let id = registry.register(PackageId::from("14"), Scope::Page, ());

        // Add clicked, request in flight.
        assert!(registry.begin_update(id));
        // Double click, or a debounced push landing meanwhile.
        assert!(!registry.begin_update(id));
        // The add settled the package.
        registry.settle(&PackageId::from("14"));
        assert!(registry.begin_update(id));
    }

    #[test]
    fn unknown_widgets_cannot_start_an_update() {
        let mut registry: WidgetRegistry<()> = WidgetRegistry::new();
        let id = registry.register(PackageId::from("14"), Scope::Popup(4), ());
        registry.drop_scope(Scope::Popup(4));
        assert!(!registry.begin_update(id));
    }

    #[test]
    fn settle_clears_every_instance() {
        let mut registry = WidgetRegistry::new();
        let a = registry.register(PackageId::from("14"), Scope::Page, ());
        let b = registry.register(PackageId::from("14"), Scope::Popup(2), ());
        registry.begin_update(a);
        registry.begin_update(b);

        registry.settle(&PackageId::from("14"));
        assert!(!registry.is_updating(a));
        assert!(!registry.is_updating(b));
    }

    #[test]
    fn dropping_a_popup_scope_keeps_page_widgets() {
        let mut registry = WidgetRegistry::new();
        registry.register(PackageId::from("14"), Scope::Page, ());
        registry.register(PackageId::from("14"), Scope::Popup(3), ());
        registry.register(PackageId::from("15"), Scope::Popup(3), ());

        assert_eq!(registry.drop_scope(Scope::Popup(3)), 2);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.instances(&PackageId::from("14")).count(), 1);
    }
}
