//! A display-only client showing the demo world's storage.

use cjcore_net::{BindingId, CacheKey, Delivery, NetError};
use cjcore_storage::{RemoteTarget, Side, UnitTable};
use cjcore_sync::{ClientState, QueryPacer, RemoteStorage};
use tracing::info;

use crate::world::{BATTERY, TANK};

/// Namespace of every cache key the overlay uses.
const NAMESPACE: &str = "cjcore";

/// Re-queries the battery and tank on a fixed cadence and logs what it
/// learns, the way an on-screen overlay would paint it.
#[derive(Debug)]
pub struct Overlay {
    remote: RemoteStorage,
    pacer: QueryPacer,
    unit: String,
    energy_key: CacheKey,
    inventory_key: CacheKey,
    tank_binding: Option<BindingId>,
}

impl Overlay {
    /// An overlay querying through `remote`, displaying energy in `unit`.
    #[must_use]
    pub fn new(remote: RemoteStorage, interval: u32, unit: impl Into<String>) -> Self {
        Self {
            remote,
            pacer: QueryPacer::new(interval),
            unit: unit.into(),
            energy_key: CacheKey::new(NAMESPACE, "Overlay"),
            inventory_key: CacheKey::new(NAMESPACE, "OverlayInventory"),
            tank_binding: None,
        }
    }

    /// Run one presentation tick against the client state.
    ///
    /// # Errors
    ///
    /// Returns [`NetError`] if a request cannot be queued.
    pub fn tick(&mut self, state: &mut ClientState, units: &UnitTable) -> Result<(), NetError> {
        let battery = RemoteTarget::block(BATTERY, Some(Side::North));
        let tank = RemoteTarget::block(TANK, None);

        if let Some(energy) = state.sink.take_energy(&self.energy_key) {
            let shown = units
                .get(&self.unit)
                .map_or_else(|| energy.amount.to_string(), |u| u.format(energy.amount));
            info!(
                stored = %shown,
                capacity = energy.capacity,
                fill_pct = (energy.fill_ratio() * 100.0).round(),
                "battery"
            );
        }
        if let Some(inventory) = state.sink.take_inventory(&self.inventory_key) {
            for entry in &inventory.slots {
                info!(item = entry.item.as_str(), count = entry.count, "tank buffer");
            }
        }

        let binding = *self.tank_binding.get_or_insert_with(|| {
            state.sink.bind_fluid(|fluid| {
                info!(
                    fluid = fluid.fluid.as_deref().unwrap_or("empty"),
                    amount = fluid.amount,
                    capacity = fluid.capacity,
                    "tank"
                );
            })
        });

        if !self.pacer.tick() {
            return Ok(());
        }
        self.remote
            .sync_energy_data(battery, &self.unit, Delivery::Cache(self.energy_key.clone()))?;
        self.remote
            .sync_fluid_data(tank, 0, Delivery::Writeback(binding))?;
        self.remote.sync_inventory(
            tank,
            true,
            None,
            Delivery::Cache(self.inventory_key.clone()),
        )?;
        Ok(())
    }
}
