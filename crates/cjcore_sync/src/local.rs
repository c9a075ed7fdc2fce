//! The local query path.
//!
//! [`LocalStorage`] owns a [`StorageHost`] and answers queries against it
//! synchronously. It is what a caller that owns the world uses directly, and
//! it is the state the server-side execution context runs request handlers
//! against.

use std::sync::Arc;

use cjcore_storage::{
    EnergySnapshot, FluidSnapshot, FluidStack, InventorySnapshot, ItemEntry, RemoteTarget,
    SlotRange, StorageError, StorageHost, StorageResolver, UnitTable,
};

/// A host plus the unit table used to read it.
#[derive(Debug)]
pub struct LocalStorage<H> {
    host: H,
    units: Arc<UnitTable>,
}

impl<H: StorageHost> LocalStorage<H> {
    /// Query `host`, converting through `units`.
    #[must_use]
    pub fn new(host: H, units: Arc<UnitTable>) -> Self {
        Self { host, units }
    }

    /// The host.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The host, mutably (for simulation code sharing the context).
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// The shared unit table.
    #[must_use]
    pub fn units(&self) -> &Arc<UnitTable> {
        &self.units
    }

    fn split(&mut self) -> (StorageResolver<'_>, &mut H) {
        (StorageResolver::new(&self.units), &mut self.host)
    }

    // ── Energy ──────────────────────────────────────────────────────────

    /// Whether `target` exposes energy storage.
    pub fn has_energy(&mut self, target: &RemoteTarget) -> bool {
        let (resolver, host) = self.split();
        resolver.has_energy(host, target)
    }

    /// Stored energy in `unit`; 0 for unsupported targets.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unit`] if `unit` is not registered.
    pub fn energy_stored(&mut self, target: &RemoteTarget, unit: &str) -> Result<i64, StorageError> {
        let (resolver, host) = self.split();
        resolver.energy_stored(host, target, unit)
    }

    /// Energy capacity in `unit`; 0 for unsupported targets.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unit`] if `unit` is not registered.
    pub fn energy_capacity(
        &mut self,
        target: &RemoteTarget,
        unit: &str,
    ) -> Result<i64, StorageError> {
        let (resolver, host) = self.split();
        resolver.energy_capacity(host, target, unit)
    }

    /// Stored energy and capacity in `unit`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unit`] if `unit` is not registered.
    pub fn energy_data(
        &mut self,
        target: &RemoteTarget,
        unit: &str,
    ) -> Result<EnergySnapshot, StorageError> {
        let (resolver, host) = self.split();
        resolver.energy(host, target, unit)
    }

    /// Offer `amount` of `unit` to the target; returns how much it accepted.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unit`] if `unit` is not registered.
    pub fn fill_energy(
        &mut self,
        target: &RemoteTarget,
        amount: i64,
        unit: &str,
        simulate: bool,
    ) -> Result<i64, StorageError> {
        let (resolver, host) = self.split();
        resolver.fill_energy(host, target, amount, unit, simulate)
    }

    /// Take up to `amount` of `unit` from the target; returns how much it gave.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unit`] if `unit` is not registered.
    pub fn drain_energy(
        &mut self,
        target: &RemoteTarget,
        amount: i64,
        unit: &str,
        simulate: bool,
    ) -> Result<i64, StorageError> {
        let (resolver, host) = self.split();
        resolver.drain_energy(host, target, amount, unit, simulate)
    }

    // ── Fluid ───────────────────────────────────────────────────────────

    /// Whether `target` exposes fluid storage.
    pub fn has_fluid(&mut self, target: &RemoteTarget) -> bool {
        let (resolver, host) = self.split();
        resolver.has_fluid(host, target)
    }

    /// Number of tanks.
    pub fn tank_count(&mut self, target: &RemoteTarget) -> usize {
        let (resolver, host) = self.split();
        resolver.tank_count(host, target)
    }

    /// Contents of tank `index`; empty when absent.
    pub fn fluid_tank(&mut self, target: &RemoteTarget, index: i32) -> FluidSnapshot {
        let (resolver, host) = self.split();
        resolver.fluid_tank(host, target, index)
    }

    /// Offer `stack`; returns the accepted amount.
    pub fn fill_fluid(&mut self, target: &RemoteTarget, stack: &FluidStack, simulate: bool) -> i64 {
        let (resolver, host) = self.split();
        resolver.fill_fluid(host, target, stack, simulate)
    }

    /// Take up to `max`; returns what came out.
    pub fn drain_fluid(
        &mut self,
        target: &RemoteTarget,
        max: i64,
        simulate: bool,
    ) -> Option<FluidStack> {
        let (resolver, host) = self.split();
        resolver.drain_fluid(host, target, max, simulate)
    }

    // ── Inventory ───────────────────────────────────────────────────────

    /// Whether `target` exposes item storage.
    pub fn has_inventory(&mut self, target: &RemoteTarget) -> bool {
        let (resolver, host) = self.split();
        resolver.has_inventory(host, target)
    }

    /// List the target's items.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidRange`] if `range` is inverted.
    pub fn inventory(
        &mut self,
        target: &RemoteTarget,
        stacked: bool,
        range: Option<SlotRange>,
    ) -> Result<InventorySnapshot, StorageError> {
        let (resolver, host) = self.split();
        resolver.inventory(host, target, stacked, range)
    }

    /// Insert `entry`; returns how many items were accepted.
    pub fn insert_item(&mut self, target: &RemoteTarget, entry: &ItemEntry, simulate: bool) -> i32 {
        let (resolver, host) = self.split();
        resolver.insert_item(host, target, entry, simulate)
    }

    /// Remove up to `count` of `item`; returns how many were removed.
    pub fn extract_item(
        &mut self,
        target: &RemoteTarget,
        item: &str,
        count: i32,
        simulate: bool,
    ) -> i32 {
        let (resolver, host) = self.split();
        resolver.extract_item(host, target, item, count, simulate)
    }
}

#[cfg(test)]
mod tests {
    use cjcore_storage::{
        BlockPos, EnergyBuffer, FORGE_ENERGY, FluidTank, ItemSlots, MemoryHost, Side,
        StorageBlock, StorageError,
    };

    use super::*;

    fn world() -> LocalStorage<MemoryHost> {
        let mut host = MemoryHost::new();
        host.place(
            BlockPos::new(0, 0, 0),
            StorageBlock::energy(EnergyBuffer::new(FORGE_ENERGY, 8000).with_amount(4000)),
        );
        host.place(
            BlockPos::new(1, 0, 0),
            StorageBlock {
                fluid: Some(
                    FluidTank::new(1000).with_contents(FluidStack::new("water", 250)),
                ),
                items: Some(
                    ItemSlots::new(4, 64)
                        .with_slot(0, ItemEntry::new("coal", 10))
                        .with_slot(2, ItemEntry::new("coal", 5)),
                ),
                ..StorageBlock::default()
            },
        );
        LocalStorage::new(host, Arc::new(UnitTable::standard()))
    }

    #[test]
    fn test_energy_queries() {
        let mut local = world();
        let battery = RemoteTarget::block(BlockPos::new(0, 0, 0), Some(Side::North));
        assert!(local.has_energy(&battery));
        assert_eq!(local.energy_stored(&battery, FORGE_ENERGY).unwrap(), 4000);
        assert_eq!(local.energy_capacity(&battery, FORGE_ENERGY).unwrap(), 8000);
        assert_eq!(local.energy_stored(&battery, "Energy Unit").unwrap(), 1000);
        assert!(matches!(
            local.energy_data(&battery, "Furlong"),
            Err(StorageError::Unit(_))
        ));
    }

    #[test]
    fn test_energy_transfer_mutates_host() {
        let mut local = world();
        let battery = RemoteTarget::block(BlockPos::new(0, 0, 0), None);
        assert_eq!(local.fill_energy(&battery, 1000, FORGE_ENERGY, true).unwrap(), 1000);
        assert_eq!(local.energy_stored(&battery, FORGE_ENERGY).unwrap(), 4000);
        assert_eq!(local.drain_energy(&battery, 500, FORGE_ENERGY, false).unwrap(), 500);
        assert_eq!(local.energy_stored(&battery, FORGE_ENERGY).unwrap(), 3500);
    }

    #[test]
    fn test_fluid_and_items() {
        let mut local = world();
        let tank = RemoteTarget::block(BlockPos::new(1, 0, 0), None);
        assert!(local.has_fluid(&tank));
        assert!(!local.has_energy(&tank));
        assert_eq!(local.tank_count(&tank), 1);
        assert_eq!(local.fluid_tank(&tank, 0).amount, 250);
        assert_eq!(local.fill_fluid(&tank, &FluidStack::new("water", 100), false), 100);
        assert_eq!(local.drain_fluid(&tank, 50, false).map(|s| s.amount), Some(50));
        assert_eq!(local.fluid_tank(&tank, 0).amount, 300);

        assert!(local.has_inventory(&tank));
        let listing = local.inventory(&tank, true, None).unwrap();
        assert_eq!(listing.slots, vec![ItemEntry::new("coal", 15)]);
        assert_eq!(local.extract_item(&tank, "coal", 12, false), 12);
        assert_eq!(local.insert_item(&tank, &ItemEntry::new("iron", 3), false), 3);
        assert_eq!(local.inventory(&tank, true, None).unwrap().count_of("coal"), 3);
    }
}
