//! Reference storage containers.
//!
//! Plain capacity/amount/rate records implementing the primitive handle
//! traits. Hosts with their own storage don't need these; tests and the demo
//! world use them.

use serde::{Deserialize, Serialize};

use crate::capability::{EnergyHandle, FluidHandle, InventoryHandle};
use crate::snapshot::{FluidSnapshot, FluidStack, ItemEntry};

/// Energy buffer with per-operation transfer limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyBuffer {
    unit: String,
    amount: i64,
    capacity: i64,
    max_receive: i64,
    max_extract: i64,
}

impl EnergyBuffer {
    /// An empty buffer counting in `unit`, with unlimited transfer rates.
    #[must_use]
    pub fn new(unit: impl Into<String>, capacity: i64) -> Self {
        Self {
            unit: unit.into(),
            amount: 0,
            capacity: capacity.max(0),
            max_receive: i64::MAX,
            max_extract: i64::MAX,
        }
    }

    /// Set the stored amount, clamped to the capacity.
    #[must_use]
    pub fn with_amount(mut self, amount: i64) -> Self {
        self.amount = amount.clamp(0, self.capacity);
        self
    }

    /// Limit how much a single receive may accept.
    #[must_use]
    pub fn with_max_receive(mut self, max_receive: i64) -> Self {
        self.max_receive = max_receive.max(0);
        self
    }

    /// Limit how much a single extract may remove.
    #[must_use]
    pub fn with_max_extract(mut self, max_extract: i64) -> Self {
        self.max_extract = max_extract.max(0);
        self
    }
}

impl EnergyHandle for EnergyBuffer {
    fn native_unit(&self) -> &str {
        &self.unit
    }

    fn stored(&self) -> i64 {
        self.amount
    }

    fn capacity(&self) -> i64 {
        self.capacity
    }

    fn receive(&mut self, max: i64, simulate: bool) -> i64 {
        let accepted = (self.capacity - self.amount)
            .min(self.max_receive)
            .min(max)
            .max(0);
        if !simulate {
            self.amount += accepted;
        }
        accepted
    }

    fn extract(&mut self, max: i64, simulate: bool) -> i64 {
        let removed = self.amount.min(self.max_extract).min(max).max(0);
        if !simulate {
            self.amount -= removed;
        }
        removed
    }
}

/// A single fluid tank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FluidTank {
    contents: Option<FluidStack>,
    capacity: i64,
}

impl FluidTank {
    /// An empty tank.
    #[must_use]
    pub fn new(capacity: i64) -> Self {
        Self {
            contents: None,
            capacity: capacity.max(0),
        }
    }

    /// Pre-fill the tank, clamped to the capacity.
    #[must_use]
    pub fn with_contents(mut self, stack: FluidStack) -> Self {
        let amount = stack.amount.clamp(0, self.capacity);
        self.contents = (amount > 0).then(|| FluidStack::new(stack.fluid, amount));
        self
    }

    fn amount(&self) -> i64 {
        self.contents.as_ref().map_or(0, |s| s.amount)
    }
}

impl FluidHandle for FluidTank {
    fn tanks(&self) -> usize {
        1
    }

    fn tank(&self, index: usize) -> Option<FluidSnapshot> {
        (index == 0).then(|| FluidSnapshot {
            amount: self.amount(),
            capacity: self.capacity,
            fluid: self.contents.as_ref().map(|s| s.fluid.clone()),
        })
    }

    fn fill(&mut self, stack: &FluidStack, simulate: bool) -> i64 {
        if let Some(current) = &self.contents
            && current.fluid != stack.fluid
        {
            return 0;
        }
        let accepted = (self.capacity - self.amount()).min(stack.amount).max(0);
        if !simulate && accepted > 0 {
            let total = self.amount() + accepted;
            self.contents = Some(FluidStack::new(stack.fluid.clone(), total));
        }
        accepted
    }

    fn drain(&mut self, max: i64, simulate: bool) -> Option<FluidStack> {
        let current = self.contents.as_ref()?;
        let drained = current.amount.min(max);
        if drained <= 0 {
            return None;
        }
        let out = FluidStack::new(current.fluid.clone(), drained);
        if !simulate {
            let left = current.amount - drained;
            self.contents = (left > 0).then(|| FluidStack::new(out.fluid.clone(), left));
        }
        Some(out)
    }
}

/// Fixed number of item slots sharing one stack limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSlots {
    slots: Vec<Option<ItemEntry>>,
    stack_limit: i32,
}

impl ItemSlots {
    /// `size` empty slots holding at most `stack_limit` items each.
    #[must_use]
    pub fn new(size: usize, stack_limit: i32) -> Self {
        Self {
            slots: vec![None; size],
            stack_limit: stack_limit.max(1),
        }
    }

    /// Place `entry` into slot `index`, replacing anything there.
    #[must_use]
    pub fn with_slot(mut self, index: usize, entry: ItemEntry) -> Self {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = (!entry.is_empty()).then_some(entry);
        }
        self
    }
}

impl InventoryHandle for ItemSlots {
    fn slots(&self) -> usize {
        self.slots.len()
    }

    fn slot(&self, index: usize) -> Option<&ItemEntry> {
        self.slots.get(index)?.as_ref()
    }

    fn insert(&mut self, index: usize, entry: &ItemEntry, simulate: bool) -> i32 {
        let limit = self.stack_limit;
        let Some(slot) = self.slots.get_mut(index) else {
            return 0;
        };
        if entry.is_empty() {
            return 0;
        }
        let held = match slot {
            Some(existing) if !existing.stacks_with(entry) => return 0,
            Some(existing) => existing.count,
            None => 0,
        };
        let accepted = (limit - held).min(entry.count).max(0);
        if !simulate && accepted > 0 {
            match slot {
                Some(existing) => existing.count += accepted,
                None => {
                    let mut placed = entry.clone();
                    placed.count = accepted;
                    *slot = Some(placed);
                }
            }
        }
        accepted
    }

    fn extract(&mut self, index: usize, count: i32, simulate: bool) -> Option<ItemEntry> {
        let slot = self.slots.get_mut(index)?;
        let existing = slot.as_mut()?;
        let taken = existing.count.min(count);
        if taken <= 0 {
            return None;
        }
        let mut out = existing.clone();
        out.count = taken;
        if !simulate {
            existing.count -= taken;
            if existing.count <= 0 {
                *slot = None;
            }
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_buffer_rate_limits() {
        let mut buf = EnergyBuffer::new("Forge Energy", 1000)
            .with_amount(100)
            .with_max_receive(200)
            .with_max_extract(50);
        assert_eq!(buf.receive(500, true), 200);
        assert_eq!(buf.stored(), 100);
        assert_eq!(buf.receive(500, false), 200);
        assert_eq!(buf.stored(), 300);
        assert_eq!(buf.extract(500, false), 50);
        assert_eq!(buf.stored(), 250);
        assert_eq!(buf.receive(-5, false), 0);
    }

    #[test]
    fn test_energy_buffer_capacity_bound() {
        let mut buf = EnergyBuffer::new("Forge Energy", 1000).with_amount(900);
        assert_eq!(buf.receive(500, false), 100);
        assert_eq!(buf.stored(), 1000);
        assert_eq!(EnergyBuffer::new("Forge Energy", 10).with_amount(99).stored(), 10);
    }

    #[test]
    fn test_fluid_tank_rejects_other_fluid() {
        let mut tank = FluidTank::new(1000).with_contents(FluidStack::new("water", 400));
        assert_eq!(tank.fill(&FluidStack::new("lava", 100), false), 0);
        assert_eq!(tank.fill(&FluidStack::new("water", 1000), false), 600);
        let drained = tank.drain(250, false).unwrap();
        assert_eq!(drained, FluidStack::new("water", 250));
        assert_eq!(tank.tank(0).unwrap().amount, 750);
        assert!(tank.tank(1).is_none());
    }

    #[test]
    fn test_fluid_tank_drain_to_empty() {
        let mut tank = FluidTank::new(100).with_contents(FluidStack::new("water", 40));
        assert_eq!(tank.drain(100, true).unwrap().amount, 40);
        assert_eq!(tank.drain(100, false).unwrap().amount, 40);
        assert!(tank.tank(0).unwrap().is_empty());
        assert!(tank.drain(10, false).is_none());
    }

    #[test]
    fn test_item_slots_insert_extract() {
        let mut inv = ItemSlots::new(2, 64).with_slot(0, ItemEntry::new("stone", 60));
        assert_eq!(inv.insert(0, &ItemEntry::new("stone", 10), false), 4);
        assert_eq!(inv.insert(0, &ItemEntry::new("dirt", 10), false), 0);
        assert_eq!(inv.insert(1, &ItemEntry::new("dirt", 10), true), 10);
        assert!(inv.slot(1).is_none());

        let out = inv.extract(0, 100, false).unwrap();
        assert_eq!(out.count, 64);
        assert!(inv.slot(0).is_none());
        assert!(inv.extract(5, 1, false).is_none());
    }
}
