//! The simulated server world.

use cjcore_storage::{
    BlockPos, EnergyBuffer, FORGE_ENERGY, FluidStack, FluidTank, ItemEntry, ItemSlots,
    MemoryHost, RemoteTarget, Side, StorageBlock,
};
use cjcore_sync::LocalStorage;
use tracing::{debug, warn};

/// A battery that only connects on its north face.
pub const BATTERY: BlockPos = BlockPos::new(0, 64, 0);
/// A lava tank with a small item buffer.
pub const TANK: BlockPos = BlockPos::new(2, 64, 0);

/// Energy a generator pushes into the battery every tick.
const GENERATOR_OUTPUT: i64 = 120;
/// Energy a machine pulls from the battery every tick.
const MACHINE_DRAW: i64 = 80;

/// Build the demo world.
#[must_use]
pub fn build() -> MemoryHost {
    let mut host = MemoryHost::new();
    host.place(
        BATTERY,
        StorageBlock::energy(
            EnergyBuffer::new(FORGE_ENERGY, 8000)
                .with_amount(4000)
                .with_max_receive(200)
                .with_max_extract(200),
        )
        .on_sides([Side::North]),
    );
    host.place(
        TANK,
        StorageBlock {
            fluid: Some(FluidTank::new(16_000).with_contents(FluidStack::new("lava", 3000))),
            items: Some(
                ItemSlots::new(9, 64)
                    .with_slot(0, ItemEntry::new("obsidian", 12))
                    .with_slot(4, ItemEntry::new("obsidian", 20))
                    .with_slot(8, ItemEntry::new("cobblestone", 64)),
            ),
            ..StorageBlock::default()
        },
    );
    host
}

/// Advance the world by one tick: a generator charges the battery, a
/// machine drains it, and a pump fills the tank.
pub fn simulate(world: &mut LocalStorage<MemoryHost>, tick: u64) {
    let battery = RemoteTarget::block(BATTERY, Some(Side::North));
    let tank = RemoteTarget::block(TANK, None);

    let charged = world.fill_energy(&battery, GENERATOR_OUTPUT, FORGE_ENERGY, false);
    let drawn = world.drain_energy(&battery, MACHINE_DRAW, FORGE_ENERGY, false);
    match (charged, drawn) {
        (Ok(charged), Ok(drawn)) => debug!(tick, charged, drawn, "battery updated"),
        (Err(e), _) | (_, Err(e)) => warn!(tick, error = %e, "battery update failed"),
    }

    let pumped = world.fill_fluid(&tank, &FluidStack::new("lava", 25), false);
    debug!(tick, pumped, "tank updated");
}
