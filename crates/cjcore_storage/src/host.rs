//! An in-memory [`StorageHost`] made of reference containers.

use std::collections::HashMap;

use crate::capability::{
    CapabilitySource, EnergyHandle, FluidHandle, InventoryHandle, StorageHost,
};
use crate::containers::{EnergyBuffer, FluidTank, ItemSlots};
use crate::target::{BlockPos, PortableId, Side};

/// A device or item holding any combination of reference containers.
///
/// `sides` restricts which faces expose the storage; `None` exposes it on
/// every face and to side-less queries.
#[derive(Debug, Clone, Default)]
pub struct StorageBlock {
    /// Energy storage, if any.
    pub energy: Option<EnergyBuffer>,
    /// Fluid storage, if any.
    pub fluid: Option<FluidTank>,
    /// Item storage, if any.
    pub items: Option<ItemSlots>,
    /// Faces that expose storage.
    pub sides: Option<Vec<Side>>,
}

impl StorageBlock {
    /// A block exposing only energy storage.
    #[must_use]
    pub fn energy(buffer: EnergyBuffer) -> Self {
        Self {
            energy: Some(buffer),
            ..Self::default()
        }
    }

    /// Restrict storage to the given faces.
    #[must_use]
    pub fn on_sides(mut self, sides: impl Into<Vec<Side>>) -> Self {
        self.sides = Some(sides.into());
        self
    }

    fn exposes(&self, side: Option<Side>) -> bool {
        match (&self.sides, side) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(sides), Some(side)) => sides.contains(&side),
        }
    }
}

impl CapabilitySource for StorageBlock {
    fn energy(&mut self, side: Option<Side>) -> Option<&mut dyn EnergyHandle> {
        if !self.exposes(side) {
            return None;
        }
        self.energy.as_mut().map(|e| e as &mut dyn EnergyHandle)
    }

    fn fluid(&mut self, side: Option<Side>) -> Option<&mut dyn FluidHandle> {
        if !self.exposes(side) {
            return None;
        }
        self.fluid.as_mut().map(|f| f as &mut dyn FluidHandle)
    }

    fn inventory(&mut self, side: Option<Side>) -> Option<&mut dyn InventoryHandle> {
        if !self.exposes(side) {
            return None;
        }
        self.items.as_mut().map(|i| i as &mut dyn InventoryHandle)
    }
}

/// World and portable objects kept in hash maps.
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    blocks: HashMap<BlockPos, StorageBlock>,
    portables: HashMap<PortableId, StorageBlock>,
}

impl MemoryHost {
    /// An empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a device at `pos`, replacing any existing one.
    pub fn place(&mut self, pos: BlockPos, block: StorageBlock) {
        self.blocks.insert(pos, block);
    }

    /// Remove the device at `pos`.
    pub fn remove(&mut self, pos: BlockPos) -> Option<StorageBlock> {
        self.blocks.remove(&pos)
    }

    /// Register a portable object.
    pub fn add_portable(&mut self, id: PortableId, item: StorageBlock) {
        self.portables.insert(id, item);
    }

    /// Direct access to a placed device.
    pub fn block_mut(&mut self, pos: BlockPos) -> Option<&mut StorageBlock> {
        self.blocks.get_mut(&pos)
    }
}

impl StorageHost for MemoryHost {
    fn block(&mut self, pos: BlockPos) -> Option<&mut dyn CapabilitySource> {
        self.blocks
            .get_mut(&pos)
            .map(|b| b as &mut dyn CapabilitySource)
    }

    fn portable(&mut self, id: PortableId) -> Option<&mut dyn CapabilitySource> {
        self.portables
            .get_mut(&id)
            .map(|b| b as &mut dyn CapabilitySource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::RemoteTarget;

    #[test]
    fn test_side_restriction() {
        let mut block = StorageBlock::energy(EnergyBuffer::new("Forge Energy", 10))
            .on_sides([Side::North]);
        assert!(block.energy(Some(Side::North)).is_some());
        assert!(block.energy(Some(Side::South)).is_none());
        assert!(block.energy(None).is_none());
        assert!(block.fluid(Some(Side::North)).is_none());
    }

    #[test]
    fn test_host_source_dispatch() {
        let mut host = MemoryHost::new();
        let pos = BlockPos::new(1, 2, 3);
        host.place(pos, StorageBlock::default());
        host.add_portable(PortableId(9), StorageBlock::default());

        assert!(host.source(&RemoteTarget::block(pos, None)).is_some());
        assert!(host.source(&RemoteTarget::portable(PortableId(9), None)).is_some());
        assert!(host.source(&RemoteTarget::portable(PortableId(1), None)).is_none());
        assert!(host.remove(pos).is_some());
        assert!(host.source(&RemoteTarget::block(pos, None)).is_none());
    }
}
