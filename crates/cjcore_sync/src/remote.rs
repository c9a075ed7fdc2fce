//! The remote query path.
//!
//! [`RemoteStorage`] is what a display-only client uses to learn about
//! storage it cannot touch. Requests are fire-and-forget; answers arrive
//! later in the [`ResultSink`] of the client's presentation context, so every
//! read may be stale or missing.

use cjcore_net::{
    CacheKey, Delivery, GetEnergy, GetEnergyData, GetFluidData, GetInventory, NetError, Outlet,
    PeerId,
};
use cjcore_storage::{EnergySnapshot, FluidSnapshot, InventorySnapshot, RemoteTarget, SlotRange};
use tracing::debug;

use crate::sink::ResultSink;

/// Sends storage queries to the authoritative peer.
#[derive(Debug, Clone)]
pub struct RemoteStorage {
    outlet: Outlet,
    server: PeerId,
}

impl RemoteStorage {
    /// Query through `outlet`, addressed to the server.
    #[must_use]
    pub fn new(outlet: Outlet) -> Self {
        Self {
            outlet,
            server: PeerId::SERVER,
        }
    }

    /// Ask for the energy stored in `target`, expressed in `unit`.
    ///
    /// # Errors
    ///
    /// Returns [`NetError`] if the request cannot be queued.
    pub fn request_energy(
        &self,
        target: RemoteTarget,
        unit: &str,
        delivery: Delivery,
    ) -> Result<(), NetError> {
        debug!(%target, unit, "requesting stored energy");
        self.outlet.send(
            &GetEnergy {
                unit: unit.to_string(),
                target,
                delivery,
            },
            self.server,
        )
    }

    /// Ask for stored energy and capacity of `target`, expressed in `unit`.
    ///
    /// # Errors
    ///
    /// Returns [`NetError`] if the request cannot be queued.
    pub fn sync_energy_data(
        &self,
        target: RemoteTarget,
        unit: &str,
        delivery: Delivery,
    ) -> Result<(), NetError> {
        debug!(%target, unit, "requesting energy data");
        self.outlet.send(
            &GetEnergyData {
                unit: unit.to_string(),
                target,
                delivery,
            },
            self.server,
        )
    }

    /// Ask for the contents of tank `tank` of `target`.
    ///
    /// # Errors
    ///
    /// Returns [`NetError`] if the request cannot be queued.
    pub fn sync_fluid_data(
        &self,
        target: RemoteTarget,
        tank: i32,
        delivery: Delivery,
    ) -> Result<(), NetError> {
        debug!(%target, tank, "requesting fluid data");
        self.outlet.send(
            &GetFluidData {
                tank,
                target,
                delivery,
            },
            self.server,
        )
    }

    /// Ask for the item listing of `target`.
    ///
    /// # Errors
    ///
    /// Returns [`NetError`] if the request cannot be queued.
    pub fn sync_inventory(
        &self,
        target: RemoteTarget,
        stacked: bool,
        range: Option<SlotRange>,
        delivery: Delivery,
    ) -> Result<(), NetError> {
        debug!(%target, stacked, ?range, "requesting inventory");
        self.outlet.send(
            &GetInventory {
                target,
                stacked,
                range,
                delivery,
            },
            self.server,
        )
    }

    /// Request a fresh stored-energy reading into `key` and return the
    /// previous one, if it has arrived and was not read yet.
    ///
    /// # Errors
    ///
    /// Returns [`NetError`] if the request cannot be queued.
    pub fn energy_stored(
        &self,
        sink: &mut ResultSink,
        target: RemoteTarget,
        unit: &str,
        key: &CacheKey,
    ) -> Result<Option<i64>, NetError> {
        let previous = sink.take_energy_amount(key);
        self.request_energy(target, unit, Delivery::Cache(key.clone()))?;
        Ok(previous)
    }

    /// Like [`RemoteStorage::energy_stored`] for amount and capacity.
    ///
    /// # Errors
    ///
    /// Returns [`NetError`] if the request cannot be queued.
    pub fn energy_data(
        &self,
        sink: &mut ResultSink,
        target: RemoteTarget,
        unit: &str,
        key: &CacheKey,
    ) -> Result<Option<EnergySnapshot>, NetError> {
        let previous = sink.take_energy(key);
        self.sync_energy_data(target, unit, Delivery::Cache(key.clone()))?;
        Ok(previous)
    }

    /// Like [`RemoteStorage::energy_stored`] for one fluid tank.
    ///
    /// # Errors
    ///
    /// Returns [`NetError`] if the request cannot be queued.
    pub fn fluid_data(
        &self,
        sink: &mut ResultSink,
        target: RemoteTarget,
        tank: i32,
        key: &CacheKey,
    ) -> Result<Option<FluidSnapshot>, NetError> {
        let previous = sink.take_fluid(key);
        self.sync_fluid_data(target, tank, Delivery::Cache(key.clone()))?;
        Ok(previous)
    }

    /// Like [`RemoteStorage::energy_stored`] for an item listing.
    ///
    /// # Errors
    ///
    /// Returns [`NetError`] if the request cannot be queued.
    pub fn inventory(
        &self,
        sink: &mut ResultSink,
        target: RemoteTarget,
        stacked: bool,
        range: Option<SlotRange>,
        key: &CacheKey,
    ) -> Result<Option<InventorySnapshot>, NetError> {
        let previous = sink.take_inventory(key);
        self.sync_inventory(target, stacked, range, Delivery::Cache(key.clone()))?;
        Ok(previous)
    }
}
