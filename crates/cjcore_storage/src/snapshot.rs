//! Immutable readings of remote storage.
//!
//! Snapshots are plain values: whoever builds one owns it until it is handed
//! to the wire or to a result sink.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Energy reading, already converted into the unit the caller asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnergySnapshot {
    /// Energy currently stored.
    pub amount: i64,
    /// Maximum energy that can be stored.
    pub capacity: i64,
}

impl EnergySnapshot {
    /// The neutral reading returned for unsupported targets.
    pub const EMPTY: EnergySnapshot = EnergySnapshot {
        amount: 0,
        capacity: 0,
    };

    /// Create a reading.
    #[must_use]
    pub const fn new(amount: i64, capacity: i64) -> Self {
        Self { amount, capacity }
    }

    /// Fill level in `0.0..=1.0`; zero when the capacity is zero.
    #[must_use]
    pub fn fill_ratio(&self) -> f64 {
        if self.capacity <= 0 {
            return 0.0;
        }
        (self.amount as f64 / self.capacity as f64).clamp(0.0, 1.0)
    }
}

/// A quantity of one fluid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FluidStack {
    /// Fluid id, e.g. `"water"`.
    pub fluid: String,
    /// Amount in millibuckets.
    pub amount: i64,
}

impl FluidStack {
    /// Create a stack.
    #[must_use]
    pub fn new(fluid: impl Into<String>, amount: i64) -> Self {
        Self {
            fluid: fluid.into(),
            amount,
        }
    }
}

/// Reading of a single fluid tank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FluidSnapshot {
    /// Amount held.
    pub amount: i64,
    /// Tank capacity.
    pub capacity: i64,
    /// Fluid currently held, `None` when the tank is empty.
    pub fluid: Option<String>,
}

impl FluidSnapshot {
    /// The neutral reading.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            amount: 0,
            capacity: 0,
            fluid: None,
        }
    }

    /// Whether the tank holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.amount <= 0 || self.fluid.is_none()
    }
}

/// A scalar stored in an item's metadata tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TagValue {
    /// Integral value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Boolean value.
    Flag(bool),
}

/// Item metadata. Ordered so that equal tags compare and encode identically.
pub type ItemTag = BTreeMap<String, TagValue>;

/// One inventory entry: an item id, a count, and optional metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemEntry {
    /// Item id; empty for an empty slot.
    pub item: String,
    /// Number of items.
    pub count: i32,
    /// Optional metadata distinguishing otherwise identical items.
    pub tag: Option<ItemTag>,
}

impl ItemEntry {
    /// An entry without metadata.
    #[must_use]
    pub fn new(item: impl Into<String>, count: i32) -> Self {
        Self {
            item: item.into(),
            count,
            tag: None,
        }
    }

    /// The placeholder used for an empty slot in unstacked listings.
    #[must_use]
    pub fn empty() -> Self {
        Self::new("", 0)
    }

    /// Attach metadata.
    #[must_use]
    pub fn with_tag(mut self, tag: ItemTag) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Whether this entry stands for an empty slot.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.item.is_empty() || self.count <= 0
    }

    /// Whether two entries describe the same kind of item and may merge.
    #[must_use]
    pub fn stacks_with(&self, other: &ItemEntry) -> bool {
        self.item == other.item && self.tag == other.tag
    }
}

/// Ordered inventory listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    /// Entries in slot order (unstacked) or first-seen order (stacked).
    pub slots: Vec<ItemEntry>,
}

impl InventorySnapshot {
    /// The neutral listing.
    #[must_use]
    pub const fn empty() -> Self {
        Self { slots: Vec::new() }
    }

    /// Total count of `item` across all entries.
    #[must_use]
    pub fn count_of(&self, item: &str) -> i64 {
        self.slots
            .iter()
            .filter(|e| e.item == item)
            .map(|e| i64::from(e.count))
            .sum()
    }

    /// Merge equal entries, dropping empty slots. Order of first appearance
    /// is kept.
    #[must_use]
    pub fn stacked(self) -> Self {
        let mut merged: Vec<ItemEntry> = Vec::new();
        for entry in self.slots.into_iter().filter(|e| !e.is_empty()) {
            match merged.iter_mut().find(|m| m.stacks_with(&entry)) {
                Some(existing) => existing.count = existing.count.saturating_add(entry.count),
                None => merged.push(entry),
            }
        }
        Self { slots: merged }
    }
}

/// Any reading a result sink can deliver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Snapshot {
    /// A bare stored amount (answer to a stored-energy query).
    EnergyAmount(i64),
    /// Stored amount and capacity.
    Energy(EnergySnapshot),
    /// A single fluid tank.
    Fluid(FluidSnapshot),
    /// An inventory listing.
    Inventory(InventorySnapshot),
}

impl Snapshot {
    /// Short name of the variant, for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Snapshot::EnergyAmount(_) => "energy_amount",
            Snapshot::Energy(_) => "energy",
            Snapshot::Fluid(_) => "fluid",
            Snapshot::Inventory(_) => "inventory",
        }
    }
}
