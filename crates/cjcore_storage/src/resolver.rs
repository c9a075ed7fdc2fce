//! Capability resolution with unit conversion.
//!
//! [`StorageResolver`] is the only place that talks to host handles. It never
//! fails because a target is missing or lacks a capability; such targets read
//! as empty and accept nothing. The only errors are caller mistakes (unknown
//! unit, inverted slot range).

use tracing::trace;

use crate::capability::{EnergyHandle, StorageHost};
use crate::error::StorageError;
use crate::snapshot::{EnergySnapshot, FluidSnapshot, FluidStack, InventorySnapshot, ItemEntry};
use crate::target::RemoteTarget;
use crate::units::{Unit, UnitTable};

/// A half-open range of inventory slots, `from..to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotRange {
    /// First slot, inclusive.
    pub from: i32,
    /// Last slot, exclusive.
    pub to: i32,
}

impl SlotRange {
    /// Create a range.
    #[must_use]
    pub const fn new(from: i32, to: i32) -> Self {
        Self { from, to }
    }

    /// Clamp to an inventory of `len` slots, yielding `usize` bounds.
    fn clamp(self, len: usize) -> std::ops::Range<usize> {
        let start = usize::try_from(self.from.max(0)).unwrap_or(0).min(len);
        let end = usize::try_from(self.to.max(0)).unwrap_or(0).min(len);
        start..end.max(start)
    }
}

/// Reads and writes remote storage through a [`StorageHost`].
#[derive(Debug, Clone, Copy)]
pub struct StorageResolver<'u> {
    units: &'u UnitTable,
}

impl<'u> StorageResolver<'u> {
    /// Create a resolver converting through `units`.
    #[must_use]
    pub fn new(units: &'u UnitTable) -> Self {
        Self { units }
    }

    /// The unit table in use.
    #[must_use]
    pub fn units(&self) -> &'u UnitTable {
        self.units
    }

    // ── Energy ────────────────────────────────────────────────────────────

    /// Whether the target exposes energy storage on its side.
    pub fn has_energy<H: StorageHost + ?Sized>(&self, host: &mut H, target: &RemoteTarget) -> bool {
        host.source(target)
            .and_then(|s| s.energy(target.side()))
            .is_some()
    }

    /// Stored energy in `unit`; 0 for unsupported targets.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unit`] if `unit` or the storage's native unit
    /// is unknown.
    pub fn energy_stored<H: StorageHost + ?Sized>(
        &self,
        host: &mut H,
        target: &RemoteTarget,
        unit: &str,
    ) -> Result<i64, StorageError> {
        Ok(self.energy(host, target, unit)?.amount)
    }

    /// Energy capacity in `unit`; 0 for unsupported targets.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unit`] if a unit is unknown.
    pub fn energy_capacity<H: StorageHost + ?Sized>(
        &self,
        host: &mut H,
        target: &RemoteTarget,
        unit: &str,
    ) -> Result<i64, StorageError> {
        Ok(self.energy(host, target, unit)?.capacity)
    }

    /// Stored energy and capacity in `unit`; [`EnergySnapshot::EMPTY`] for
    /// unsupported targets.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unit`] if a unit is unknown.
    pub fn energy<H: StorageHost + ?Sized>(
        &self,
        host: &mut H,
        target: &RemoteTarget,
        unit: &str,
    ) -> Result<EnergySnapshot, StorageError> {
        let unit = self.units.lookup(unit)?;
        let Some(handle) = host.source(target).and_then(|s| s.energy(target.side())) else {
            trace!(%target, "no energy capability");
            return Ok(EnergySnapshot::EMPTY);
        };
        let native = self.units.lookup(handle.native_unit())?;
        Ok(EnergySnapshot {
            amount: native.convert_to(handle.stored(), unit),
            capacity: native.convert_to(handle.capacity(), unit),
        })
    }

    /// Offer `amount` of `unit` to the target and return how much it accepted,
    /// in `unit`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unit`] if a unit is unknown.
    pub fn fill_energy<H: StorageHost + ?Sized>(
        &self,
        host: &mut H,
        target: &RemoteTarget,
        amount: i64,
        unit: &str,
        simulate: bool,
    ) -> Result<i64, StorageError> {
        self.transfer_energy(host, target, amount, unit, simulate, Direction::Fill)
    }

    /// Take up to `amount` of `unit` from the target and return how much was
    /// removed, in `unit`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unit`] if a unit is unknown.
    pub fn drain_energy<H: StorageHost + ?Sized>(
        &self,
        host: &mut H,
        target: &RemoteTarget,
        amount: i64,
        unit: &str,
        simulate: bool,
    ) -> Result<i64, StorageError> {
        self.transfer_energy(host, target, amount, unit, simulate, Direction::Drain)
    }

    fn transfer_energy<H: StorageHost + ?Sized>(
        &self,
        host: &mut H,
        target: &RemoteTarget,
        amount: i64,
        unit: &str,
        simulate: bool,
        direction: Direction,
    ) -> Result<i64, StorageError> {
        let unit = self.units.lookup(unit)?;
        if amount <= 0 {
            return Ok(0);
        }
        let Some(handle) = host.source(target).and_then(|s| s.energy(target.side())) else {
            return Ok(0);
        };
        let native: &Unit = self.units.lookup(handle.native_unit())?;
        let requested = unit.convert_to(amount, native);
        let possible = direction.apply(&mut *handle, requested, true).clamp(0, requested);

        // Only move native energy that is a whole amount of `unit`, so what
        // is reported and what changed hands always agree.
        let whole = native.convert_to(possible, unit).min(amount);
        let exact = unit.convert_to(whole, native).clamp(0, possible);
        let (moved, native_moved) = if exact == 0 {
            (0, 0)
        } else if simulate {
            (whole, exact)
        } else {
            let actual = direction.apply(&mut *handle, exact, false).clamp(0, exact);
            if actual == exact {
                (whole, actual)
            } else {
                (native.convert_to(actual, unit).min(whole), actual)
            }
        };
        trace!(
            %target,
            ?direction,
            amount,
            moved,
            native_moved,
            simulate,
            "energy transfer"
        );
        Ok(moved)
    }

    // ── Fluid ─────────────────────────────────────────────────────────────

    /// Whether the target exposes fluid storage on its side.
    pub fn has_fluid<H: StorageHost + ?Sized>(&self, host: &mut H, target: &RemoteTarget) -> bool {
        host.source(target)
            .and_then(|s| s.fluid(target.side()))
            .is_some()
    }

    /// Number of tanks; 0 for unsupported targets.
    pub fn tank_count<H: StorageHost + ?Sized>(&self, host: &mut H, target: &RemoteTarget) -> usize {
        host.source(target)
            .and_then(|s| s.fluid(target.side()))
            .map_or(0, |f| f.tanks())
    }

    /// Reading of tank `index`; empty for unsupported targets or bad indices.
    pub fn fluid_tank<H: StorageHost + ?Sized>(
        &self,
        host: &mut H,
        target: &RemoteTarget,
        index: i32,
    ) -> FluidSnapshot {
        let Ok(index) = usize::try_from(index) else {
            return FluidSnapshot::empty();
        };
        host.source(target)
            .and_then(|s| s.fluid(target.side()))
            .and_then(|f| f.tank(index))
            .unwrap_or_else(FluidSnapshot::empty)
    }

    /// Fill the target with `stack`, returning the amount accepted.
    pub fn fill_fluid<H: StorageHost + ?Sized>(
        &self,
        host: &mut H,
        target: &RemoteTarget,
        stack: &FluidStack,
        simulate: bool,
    ) -> i64 {
        if stack.amount <= 0 {
            return 0;
        }
        host.source(target)
            .and_then(|s| s.fluid(target.side()))
            .map_or(0, |f| f.fill(stack, simulate).clamp(0, stack.amount))
    }

    /// Drain up to `max` from the target.
    pub fn drain_fluid<H: StorageHost + ?Sized>(
        &self,
        host: &mut H,
        target: &RemoteTarget,
        max: i64,
        simulate: bool,
    ) -> Option<FluidStack> {
        if max <= 0 {
            return None;
        }
        host.source(target)
            .and_then(|s| s.fluid(target.side()))
            .and_then(|f| f.drain(max, simulate))
            .filter(|s| s.amount > 0)
            .map(|mut s| {
                s.amount = s.amount.min(max);
                s
            })
    }

    // ── Inventory ─────────────────────────────────────────────────────────

    /// Whether the target exposes item storage on its side.
    pub fn has_inventory<H: StorageHost + ?Sized>(
        &self,
        host: &mut H,
        target: &RemoteTarget,
    ) -> bool {
        host.source(target)
            .and_then(|s| s.inventory(target.side()))
            .is_some()
    }

    /// List the target's items.
    ///
    /// Unstacked listings have one entry per slot in `range` (empty slots
    /// included); stacked listings merge equal items and drop empty slots.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidRange`] if `range.from > range.to`.
    pub fn inventory<H: StorageHost + ?Sized>(
        &self,
        host: &mut H,
        target: &RemoteTarget,
        stacked: bool,
        range: Option<SlotRange>,
    ) -> Result<InventorySnapshot, StorageError> {
        if let Some(r) = range
            && r.from > r.to
        {
            return Err(StorageError::InvalidRange {
                from: r.from,
                to: r.to,
            });
        }
        let Some(inv) = host.source(target).and_then(|s| s.inventory(target.side())) else {
            return Ok(InventorySnapshot::empty());
        };
        let slots = match range {
            Some(r) => r.clamp(inv.slots()),
            None => 0..inv.slots(),
        };
        let snapshot = InventorySnapshot {
            slots: slots
                .map(|i| inv.slot(i).cloned().unwrap_or_else(ItemEntry::empty))
                .collect(),
        };
        Ok(if stacked { snapshot.stacked() } else { snapshot })
    }

    /// Insert `entry` across the target's slots, returning how many items were
    /// accepted.
    pub fn insert_item<H: StorageHost + ?Sized>(
        &self,
        host: &mut H,
        target: &RemoteTarget,
        entry: &ItemEntry,
        simulate: bool,
    ) -> i32 {
        if entry.is_empty() {
            return 0;
        }
        let Some(inv) = host.source(target).and_then(|s| s.inventory(target.side())) else {
            return 0;
        };
        let mut remaining = entry.clone();
        let mut accepted = 0;
        for slot in 0..inv.slots() {
            if remaining.count <= 0 {
                break;
            }
            let took = inv.insert(slot, &remaining, simulate).clamp(0, remaining.count);
            remaining.count -= took;
            accepted += took;
        }
        accepted
    }

    /// Remove up to `count` items with id `item` from the target, returning
    /// how many were removed.
    pub fn extract_item<H: StorageHost + ?Sized>(
        &self,
        host: &mut H,
        target: &RemoteTarget,
        item: &str,
        count: i32,
        simulate: bool,
    ) -> i32 {
        let Some(inv) = host.source(target).and_then(|s| s.inventory(target.side())) else {
            return 0;
        };
        let mut removed = 0;
        for slot in 0..inv.slots() {
            let wanted = count - removed;
            if wanted <= 0 {
                break;
            }
            if inv.slot(slot).is_none_or(|e| e.item != item) {
                continue;
            }
            if let Some(out) = inv.extract(slot, wanted, simulate) {
                removed += out.count.clamp(0, wanted);
            }
        }
        removed
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Fill,
    Drain,
}

impl Direction {
    fn apply<E: EnergyHandle + ?Sized>(self, handle: &mut E, max: i64, simulate: bool) -> i64 {
        match self {
            Self::Fill => handle.receive(max, simulate),
            Self::Drain => handle.extract(max, simulate),
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::containers::{EnergyBuffer, FluidTank, ItemSlots};
    use crate::error::UnitError;
    use crate::host::{MemoryHost, StorageBlock};
    use crate::target::{BlockPos, PortableId, Side};
    use crate::units::FORGE_ENERGY;

    const POS: BlockPos = BlockPos::new(10, 64, -2);

    fn host_with(block: StorageBlock) -> MemoryHost {
        let mut host = MemoryHost::new();
        host.place(POS, block);
        host
    }

    fn at(side: Option<Side>) -> RemoteTarget {
        RemoteTarget::block(POS, side)
    }

    #[test]
    fn test_energy_reading_in_native_unit() {
        let units = UnitTable::standard();
        let resolver = StorageResolver::new(&units);
        let mut host = host_with(StorageBlock::energy(
            EnergyBuffer::new(FORGE_ENERGY, 8000).with_amount(4000),
        ));
        let snap = resolver
            .energy(&mut host, &at(Some(Side::North)), FORGE_ENERGY)
            .unwrap();
        assert_eq!(snap, EnergySnapshot::new(4000, 8000));
    }

    #[test]
    fn test_energy_reading_converted() {
        let units = UnitTable::standard();
        let resolver = StorageResolver::new(&units);
        let mut host = host_with(StorageBlock::energy(
            EnergyBuffer::new("Energy Unit", 100).with_amount(25),
        ));
        assert_eq!(
            resolver.energy_stored(&mut host, &at(None), FORGE_ENERGY).unwrap(),
            100
        );
        assert_eq!(
            resolver.energy_capacity(&mut host, &at(None), "Joule").unwrap(),
            1000
        );
    }

    #[test]
    fn test_unsupported_target_is_neutral() {
        let units = UnitTable::standard();
        let resolver = StorageResolver::new(&units);
        let mut host = host_with(StorageBlock::default());
        let missing = RemoteTarget::portable(PortableId(3), None);

        for target in [at(None), missing] {
            assert!(!resolver.has_energy(&mut host, &target));
            assert_eq!(resolver.energy_stored(&mut host, &target, FORGE_ENERGY).unwrap(), 0);
            assert_eq!(resolver.energy_capacity(&mut host, &target, FORGE_ENERGY).unwrap(), 0);
            assert_eq!(
                resolver.fill_energy(&mut host, &target, 100, FORGE_ENERGY, false).unwrap(),
                0
            );
            assert_eq!(
                resolver.drain_energy(&mut host, &target, 100, FORGE_ENERGY, false).unwrap(),
                0
            );
            assert_eq!(resolver.fluid_tank(&mut host, &target, 0), FluidSnapshot::empty());
            assert_eq!(
                resolver.fill_fluid(&mut host, &target, &FluidStack::new("water", 5), false),
                0
            );
            assert!(resolver.drain_fluid(&mut host, &target, 5, false).is_none());
            assert!(resolver.inventory(&mut host, &target, true, None).unwrap().slots.is_empty());
            assert_eq!(
                resolver.insert_item(&mut host, &target, &ItemEntry::new("stone", 1), false),
                0
            );
            assert_eq!(resolver.extract_item(&mut host, &target, "stone", 1, false), 0);
        }
    }

    #[test]
    fn test_unknown_unit_is_an_error() {
        let units = UnitTable::standard();
        let resolver = StorageResolver::new(&units);
        let mut host = host_with(StorageBlock::default());
        assert_eq!(
            resolver.energy_stored(&mut host, &at(None), "Watts"),
            Err(StorageError::Unit(UnitError::NotFound("Watts".to_string())))
        );
    }

    #[test]
    fn test_unknown_native_unit_is_an_error() {
        let units = UnitTable::standard();
        let resolver = StorageResolver::new(&units);
        let mut host = host_with(StorageBlock::energy(EnergyBuffer::new("Mana", 10)));
        assert!(resolver.energy(&mut host, &at(None), FORGE_ENERGY).is_err());
    }

    #[test]
    fn test_fill_respects_rate_limit() {
        let units = UnitTable::standard();
        let resolver = StorageResolver::new(&units);
        let mut host = host_with(StorageBlock::energy(
            EnergyBuffer::new(FORGE_ENERGY, 10_000)
                .with_amount(1000)
                .with_max_receive(200),
        ));
        let target = at(Some(Side::North));
        let before = resolver.energy_stored(&mut host, &target, FORGE_ENERGY).unwrap();
        let accepted = resolver
            .fill_energy(&mut host, &target, 500, FORGE_ENERGY, false)
            .unwrap();
        assert_eq!(accepted, 200);
        let after = resolver.energy_stored(&mut host, &target, FORGE_ENERGY).unwrap();
        assert_eq!(after - before, 200);
    }

    #[test]
    fn test_simulate_does_not_mutate() {
        let units = UnitTable::standard();
        let resolver = StorageResolver::new(&units);
        let mut host = host_with(StorageBlock::energy(
            EnergyBuffer::new(FORGE_ENERGY, 10_000).with_amount(5000),
        ));
        let target = at(None);
        assert_eq!(
            resolver.fill_energy(&mut host, &target, 700, "Energy Unit", true).unwrap(),
            700
        );
        assert_eq!(
            resolver.drain_energy(&mut host, &target, 300, FORGE_ENERGY, true).unwrap(),
            300
        );
        assert_eq!(
            resolver.energy_stored(&mut host, &target, FORGE_ENERGY).unwrap(),
            5000
        );
    }

    #[test]
    fn test_fill_converts_both_ways() {
        let units = UnitTable::standard();
        let resolver = StorageResolver::new(&units);
        let mut host = host_with(StorageBlock::energy(EnergyBuffer::new(FORGE_ENERGY, 100)));
        // 30 EU = 120 FE requested, only 100 FE fit, which is 25 EU.
        let accepted = resolver
            .fill_energy(&mut host, &at(None), 30, "Energy Unit", false)
            .unwrap();
        assert_eq!(accepted, 25);
        assert_eq!(
            resolver.energy_stored(&mut host, &at(None), FORGE_ENERGY).unwrap(),
            100
        );
    }

    #[test]
    fn test_sub_unit_transfer_moves_nothing() {
        let units = UnitTable::standard();
        let resolver = StorageResolver::new(&units);
        let target = at(None);

        // 3 FE is less than one EU.
        let mut host = host_with(StorageBlock::energy(
            EnergyBuffer::new(FORGE_ENERGY, 1000)
                .with_amount(1000)
                .with_max_extract(3),
        ));
        assert_eq!(
            resolver.drain_energy(&mut host, &target, 10, "Energy Unit", false).unwrap(),
            0
        );
        assert_eq!(
            resolver.energy_stored(&mut host, &target, FORGE_ENERGY).unwrap(),
            1000
        );

        let mut host = host_with(StorageBlock::energy(
            EnergyBuffer::new(FORGE_ENERGY, 1000).with_max_receive(3),
        ));
        assert_eq!(
            resolver.fill_energy(&mut host, &target, 10, "Energy Unit", false).unwrap(),
            0
        );
        assert_eq!(resolver.energy_stored(&mut host, &target, FORGE_ENERGY).unwrap(), 0);
    }

    #[test]
    fn test_reported_transfer_matches_native_change() {
        let units = UnitTable::standard();
        let resolver = StorageResolver::new(&units);
        let target = at(None);
        let mut host = host_with(StorageBlock::energy(
            EnergyBuffer::new(FORGE_ENERGY, 1000)
                .with_amount(1000)
                .with_max_extract(3),
        ));
        // 3 FE is 7.5 J; only 7 J (2 FE) can be reported whole.
        let drained = resolver
            .drain_energy(&mut host, &target, 10, "Joule", false)
            .unwrap();
        assert_eq!(drained, 7);
        let left = resolver.energy_stored(&mut host, &target, FORGE_ENERGY).unwrap();
        assert_eq!(left, 998);
        assert_eq!(units.convert(drained, "Joule", FORGE_ENERGY).unwrap(), 1000 - left);
    }

    #[test]
    fn test_side_matters() {
        let units = UnitTable::standard();
        let resolver = StorageResolver::new(&units);
        let mut host = host_with(
            StorageBlock::energy(EnergyBuffer::new(FORGE_ENERGY, 10).with_amount(10))
                .on_sides([Side::Up]),
        );
        assert!(resolver.has_energy(&mut host, &at(Some(Side::Up))));
        assert!(!resolver.has_energy(&mut host, &at(Some(Side::Down))));
        assert_eq!(
            resolver.energy_stored(&mut host, &at(Some(Side::Down)), FORGE_ENERGY).unwrap(),
            0
        );
    }

    #[test]
    fn test_fluid_operations() {
        let units = UnitTable::standard();
        let resolver = StorageResolver::new(&units);
        let mut host = host_with(StorageBlock {
            fluid: Some(FluidTank::new(1000).with_contents(FluidStack::new("water", 300))),
            ..StorageBlock::default()
        });
        let target = at(None);
        assert!(resolver.has_fluid(&mut host, &target));
        assert_eq!(resolver.tank_count(&mut host, &target), 1);
        assert_eq!(resolver.fluid_tank(&mut host, &target, 0).amount, 300);
        assert_eq!(resolver.fluid_tank(&mut host, &target, -1), FluidSnapshot::empty());
        assert_eq!(resolver.fluid_tank(&mut host, &target, 4), FluidSnapshot::empty());

        assert_eq!(
            resolver.fill_fluid(&mut host, &target, &FluidStack::new("water", 900), false),
            700
        );
        let drained = resolver.drain_fluid(&mut host, &target, 400, false).unwrap();
        assert_eq!(drained.amount, 400);
        assert_eq!(resolver.fluid_tank(&mut host, &target, 0).amount, 600);
    }

    #[test]
    fn test_inventory_listing() {
        let units = UnitTable::standard();
        let resolver = StorageResolver::new(&units);
        let mut host = host_with(StorageBlock {
            items: Some(
                ItemSlots::new(4, 64)
                    .with_slot(0, ItemEntry::new("coal", 16))
                    .with_slot(2, ItemEntry::new("coal", 8))
                    .with_slot(3, ItemEntry::new("iron_ore", 3)),
            ),
            ..StorageBlock::default()
        });
        let target = at(None);

        let flat = resolver.inventory(&mut host, &target, false, None).unwrap();
        assert_eq!(flat.slots.len(), 4);
        assert!(flat.slots[1].is_empty());

        let stacked = resolver.inventory(&mut host, &target, true, None).unwrap();
        assert_eq!(
            stacked.slots,
            vec![ItemEntry::new("coal", 24), ItemEntry::new("iron_ore", 3)]
        );

        let ranged = resolver
            .inventory(&mut host, &target, false, Some(SlotRange::new(1, 99)))
            .unwrap();
        assert_eq!(ranged.slots.len(), 3);

        assert_eq!(
            resolver.inventory(&mut host, &target, false, Some(SlotRange::new(3, 1))),
            Err(StorageError::InvalidRange { from: 3, to: 1 })
        );
    }

    #[test]
    fn test_insert_and_extract_items() {
        let units = UnitTable::standard();
        let resolver = StorageResolver::new(&units);
        let mut host = host_with(StorageBlock {
            items: Some(ItemSlots::new(2, 64).with_slot(0, ItemEntry::new("coal", 60))),
            ..StorageBlock::default()
        });
        let target = at(None);

        assert_eq!(
            resolver.insert_item(&mut host, &target, &ItemEntry::new("coal", 100), true),
            68
        );
        assert_eq!(
            resolver.insert_item(&mut host, &target, &ItemEntry::new("coal", 10), false),
            10
        );
        assert_eq!(resolver.extract_item(&mut host, &target, "coal", 66, false), 66);
        let left = resolver.inventory(&mut host, &target, true, None).unwrap();
        assert_eq!(left.count_of("coal"), 4);
    }

    fn unit_id() -> impl Strategy<Value = &'static str> {
        prop::sample::select(vec![
            FORGE_ENERGY,
            "Redstone Flux",
            "Energy Unit",
            "Minecraft Joule",
            "Joule",
        ])
    }

    fn buffer(native: &str, stored: i64, rate: i64) -> MemoryHost {
        host_with(StorageBlock::energy(
            EnergyBuffer::new(native, 10_000)
                .with_amount(stored)
                .with_max_receive(rate)
                .with_max_extract(rate),
        ))
    }

    proptest! {
        #[test]
        fn prop_simulate_never_mutates(
            amount in -10i64..100_000,
            unit in unit_id(),
            native in unit_id(),
            stored in 0i64..=10_000,
            rate in 0i64..5_000,
            fill in any::<bool>(),
        ) {
            let units = UnitTable::standard();
            let resolver = StorageResolver::new(&units);
            let target = at(None);
            let mut host = buffer(native, stored, rate);
            let mut twin = buffer(native, stored, rate);

            let (simulated, real) = if fill {
                (
                    resolver.fill_energy(&mut host, &target, amount, unit, true).unwrap(),
                    resolver.fill_energy(&mut twin, &target, amount, unit, false).unwrap(),
                )
            } else {
                (
                    resolver.drain_energy(&mut host, &target, amount, unit, true).unwrap(),
                    resolver.drain_energy(&mut twin, &target, amount, unit, false).unwrap(),
                )
            };
            prop_assert_eq!(resolver.energy_stored(&mut host, &target, native).unwrap(), stored);
            prop_assert_eq!(simulated, real);
        }

        #[test]
        fn prop_reported_transfer_is_what_moved(
            amount in 1i64..100_000,
            unit in unit_id(),
            native in unit_id(),
            stored in 0i64..=10_000,
            rate in 0i64..5_000,
            fill in any::<bool>(),
        ) {
            let units = UnitTable::standard();
            let resolver = StorageResolver::new(&units);
            let target = at(None);
            let mut host = buffer(native, stored, rate);

            let moved = if fill {
                resolver.fill_energy(&mut host, &target, amount, unit, false).unwrap()
            } else {
                resolver.drain_energy(&mut host, &target, amount, unit, false).unwrap()
            };
            let after = resolver.energy_stored(&mut host, &target, native).unwrap();
            prop_assert!((0..=amount).contains(&moved));
            prop_assert_eq!(units.convert(moved, unit, native).unwrap(), (after - stored).abs());
        }
    }
}
