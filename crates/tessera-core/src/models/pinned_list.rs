//! Pinned list model and its ordering rules.
//!
//! A pinned list holds at most one entry per item and keeps `order`
//! values as a dense, zero-based permutation of its membership. Every
//! mutation below preserves that; storage adapters apply them under a
//! lock and persist the resulting list as a whole.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{TesseraError, TesseraResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum PinnedItemKind {
    Chart,
    Dashboard,
    Space,
}

impl PinnedItemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PinnedItemKind::Chart => "chart",
            PinnedItemKind::Dashboard => "dashboard",
            PinnedItemKind::Space => "space",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "chart" => Some(PinnedItemKind::Chart),
            "dashboard" => Some(PinnedItemKind::Dashboard),
            "space" => Some(PinnedItemKind::Space),
            _ => None,
        }
    }
}

/// Reference to a pinnable entity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PinnedItemRef {
    pub kind: PinnedItemKind,
    pub id: Uuid,
}

impl PinnedItemRef {
    pub fn chart(id: Uuid) -> Self {
        Self {
            kind: PinnedItemKind::Chart,
            id,
        }
    }

    pub fn dashboard(id: Uuid) -> Self {
        Self {
            kind: PinnedItemKind::Dashboard,
            id,
        }
    }

    pub fn space(id: Uuid) -> Self {
        Self {
            kind: PinnedItemKind::Space,
            id,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PinnedItem {
    pub item: PinnedItemRef,
    pub order: u32,
}

/// Outcome of [`PinnedList::toggle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinToggle {
    Pinned,
    Unpinned,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PinnedList {
    pub id: Uuid,
    pub project_id: Uuid,
    /// Always sorted by `order`.
    pub items: Vec<PinnedItem>,
}

impl PinnedList {
    pub fn new(id: Uuid, project_id: Uuid) -> Self {
        Self {
            id,
            project_id,
            items: Vec::new(),
        }
    }

    /// Build a list from stored rows, sorting by `order` and closing any
    /// gaps left by rows written outside this module.
    pub fn from_items(id: Uuid, project_id: Uuid, mut items: Vec<PinnedItem>) -> Self {
        items.sort_by_key(|i| (i.order, i.item));
        let mut seen = HashSet::new();
        items.retain(|i| seen.insert(i.item));
        let mut list = Self {
            id,
            project_id,
            items,
        };
        list.compact();
        list
    }

    pub fn contains(&self, item: &PinnedItemRef) -> bool {
        self.items.iter().any(|i| i.item == *item)
    }

    pub fn item_refs(&self) -> Vec<PinnedItemRef> {
        self.items.iter().map(|i| i.item).collect()
    }

    /// Unpin the item if present, otherwise append it.
    pub fn toggle(&mut self, item: PinnedItemRef) -> PinToggle {
        if self.unpin(&item) {
            PinToggle::Unpinned
        } else {
            self.pin(item);
            PinToggle::Pinned
        }
    }

    /// Append an item at the end of the list. Returns `false` if it was
    /// already pinned.
    pub fn pin(&mut self, item: PinnedItemRef) -> bool {
        if self.contains(&item) {
            return false;
        }
        let order = self
            .items
            .iter()
            .map(|i| i.order)
            .max()
            .map_or(0, |max| max + 1);
        self.items.push(PinnedItem { item, order });
        true
    }

    /// Remove an item and compact the remaining order values. Returns
    /// `false` if the item was not pinned.
    pub fn unpin(&mut self, item: &PinnedItemRef) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.item != *item);
        if self.items.len() == before {
            return false;
        }
        self.compact();
        true
    }

    /// Replace the whole ordering. The submitted references must be
    /// exactly the current membership; nothing is changed otherwise.
    pub fn reorder(&mut self, order: &[PinnedItemRef]) -> TesseraResult<()> {
        let submitted: HashSet<PinnedItemRef> = order.iter().copied().collect();
        if submitted.len() != order.len() {
            return Err(TesseraError::InvalidOrder {
                reason: "duplicate items in submitted order".into(),
            });
        }
        let current: HashSet<PinnedItemRef> = self.items.iter().map(|i| i.item).collect();
        if submitted != current {
            return Err(TesseraError::InvalidOrder {
                reason: format!(
                    "submitted {} items, list {} holds {} different membership",
                    order.len(),
                    self.id,
                    current.len()
                ),
            });
        }

        self.items = order
            .iter()
            .zip(0u32..)
            .map(|(item, order)| PinnedItem { item: *item, order })
            .collect();
        Ok(())
    }

    /// Whether `order` values are exactly `0..len` in list order.
    pub fn is_dense(&self) -> bool {
        self.items
            .iter()
            .zip(0u32..)
            .all(|(item, expected)| item.order == expected)
    }

    fn compact(&mut self) {
        self.items.sort_by_key(|i| i.order);
        for (item, order) in self.items.iter_mut().zip(0u32..) {
            item.order = order;
        }
    }
}
