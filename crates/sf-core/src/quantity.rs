//! Quantity bounds and the basket quantity map.

use sf_api_types::PackageId;
use std::collections::BTreeMap;

/// Bounds declared on an `input.quantity` (`min`/`max` attributes).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuantityBounds {
    pub min: u32,
    pub max: Option<u32>,
}

impl Default for QuantityBounds {
    fn default() -> Self {
        Self { min: 0, max: None }
    }
}

impl QuantityBounds {
    /// Missing or unparseable attributes fall back to `0` and unbounded.
    pub fn from_attrs(min: Option<&str>, max: Option<&str>) -> Self {
        let min = min.and_then(parse_quantity).map(clamp_to_u32).unwrap_or(0);
        let max = max.and_then(parse_quantity).map(clamp_to_u32);
        Self { min, max }
    }

    pub fn clamp(&self, value: i64) -> u32 {
        let value = clamp_to_u32(value);
        let upper = self.max.unwrap_or(u32::MAX).max(self.min);
        value.clamp(self.min, upper)
    }

    pub fn increment(&self, current: i64) -> u32 {
        self.clamp(current.saturating_add(1))
    }

    pub fn decrement(&self, current: i64) -> u32 {
        self.clamp(current.saturating_sub(1))
    }

    /// Clamp free-form input text; garbage resolves to the lower bound.
    /// Only for server-rendered values; user edits go through [`Self::parse_input`].
    pub fn clamp_input(&self, raw: &str) -> u32 {
        self.parse_input(raw).unwrap_or(self.min)
    }

    /// A user edit. `None` while the field holds no number (cleared, mid-typing),
    /// which must never be read as a removal.
    pub fn parse_input(&self, raw: &str) -> Option<u32> {
        parse_quantity(raw).map(|v| self.clamp(v))
    }
}

/// Leading-integer parse, tolerant of surrounding whitespace and trailing junk ("3 pcs").
pub fn parse_quantity(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    let end = trimmed
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map_or(trimmed.len(), |(i, _)| i);
    trimmed[..end].parse().ok()
}

fn clamp_to_u32(value: i64) -> u32 {
    value.clamp(0, i64::from(u32::MAX)) as u32
}

/// Network call a quantity change turns into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuantityPush {
    Remove(PackageId),
    /// Form field name → quantity, posted to `/checkout/update`.
    Update(BTreeMap<String, u32>),
}

impl QuantityPush {
    /// A single widget: zero means removal, never an update to zero.
    pub fn for_package(package_id: &PackageId, field: &str, quantity: u32) -> Self {
        if quantity == 0 {
            Self::Remove(package_id.clone())
        } else {
            Self::Update(BTreeMap::from([(field.to_owned(), quantity)]))
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BasketLine {
    pub field: String,
    pub quantity: u32,
}

/// Package → line quantity for everything currently shown in the basket.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BasketQuantities {
    lines: BTreeMap<PackageId, BasketLine>,
}

impl BasketQuantities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, package_id: PackageId, field: impl Into<String>, quantity: u32) {
        self.lines.insert(
            package_id,
            BasketLine {
                field: field.into(),
                quantity,
            },
        );
    }

    pub fn get(&self, package_id: &PackageId) -> Option<u32> {
        self.lines.get(package_id).map(|l| l.quantity)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PackageId, &BasketLine)> {
        self.lines.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Removals for zero lines first, then one bulk update for the rest.
    pub fn plan_pushes(&self) -> Vec<QuantityPush> {
        let mut pushes: Vec<QuantityPush> = self
            .lines
            .iter()
            .filter(|(_, line)| line.quantity == 0)
            .map(|(id, _)| QuantityPush::Remove(id.clone()))
            .collect();

        let updates: BTreeMap<String, u32> = self
            .lines
            .values()
            .filter(|line| line.quantity > 0)
            .map(|line| (line.field.clone(), line.quantity))
            .collect();
        if !updates.is_empty() {
            pushes.push(QuantityPush::Update(updates));
        }
        pushes
    }
}
