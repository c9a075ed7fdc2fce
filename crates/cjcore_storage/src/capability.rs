//! Host-provided storage capabilities.
//!
//! The host environment owns the actual storage. It exposes it through three
//! layers of traits:
//!
//! - [`StorageHost`] maps a [`RemoteTarget`] to whatever lives there.
//! - [`CapabilitySource`] is implemented once per device/item kind and hands
//!   out the capability visible from a given side, if any.
//! - [`EnergyHandle`], [`FluidHandle`], [`InventoryHandle`] are the primitive
//!   operations the resolver adapts. They work in the handle's native unit.

use crate::snapshot::{FluidSnapshot, FluidStack, ItemEntry};
use crate::target::{BlockPos, PortableId, RemoteTarget, Side};

/// Primitive energy storage.
pub trait EnergyHandle {
    /// Id of the unit this storage counts in.
    fn native_unit(&self) -> &str;

    /// Energy currently stored.
    fn stored(&self) -> i64;

    /// Maximum energy storable.
    fn capacity(&self) -> i64;

    /// Accept up to `max` energy and return how much was (or would be)
    /// accepted. Must not mutate when `simulate` is set.
    fn receive(&mut self, max: i64, simulate: bool) -> i64;

    /// Remove up to `max` energy and return how much was (or would be)
    /// removed. Must not mutate when `simulate` is set.
    fn extract(&mut self, max: i64, simulate: bool) -> i64;
}

/// Primitive fluid storage with one or more tanks.
pub trait FluidHandle {
    /// Number of tanks.
    fn tanks(&self) -> usize;

    /// Reading of tank `index`, `None` if out of range.
    fn tank(&self, index: usize) -> Option<FluidSnapshot>;

    /// Fill with `stack`, returning the amount accepted.
    fn fill(&mut self, stack: &FluidStack, simulate: bool) -> i64;

    /// Drain up to `max`, returning what came out.
    fn drain(&mut self, max: i64, simulate: bool) -> Option<FluidStack>;
}

/// Primitive slot-based item storage.
pub trait InventoryHandle {
    /// Number of slots.
    fn slots(&self) -> usize;

    /// Contents of slot `index`; `None` if empty or out of range.
    fn slot(&self, index: usize) -> Option<&ItemEntry>;

    /// Insert into slot `index`, returning how many items were accepted.
    fn insert(&mut self, index: usize, entry: &ItemEntry, simulate: bool) -> i32;

    /// Take up to `count` items out of slot `index`.
    fn extract(&mut self, index: usize, count: i32, simulate: bool) -> Option<ItemEntry>;
}

/// Something in the host that may expose storage, depending on the side.
///
/// Every method defaults to "no capability".
pub trait CapabilitySource {
    /// Energy storage visible from `side`.
    fn energy(&mut self, _side: Option<Side>) -> Option<&mut dyn EnergyHandle> {
        None
    }

    /// Fluid storage visible from `side`.
    fn fluid(&mut self, _side: Option<Side>) -> Option<&mut dyn FluidHandle> {
        None
    }

    /// Item storage visible from `side`.
    fn inventory(&mut self, _side: Option<Side>) -> Option<&mut dyn InventoryHandle> {
        None
    }
}

/// Capability discovery, provided by the host environment.
pub trait StorageHost {
    /// The device at `pos`, if any.
    fn block(&mut self, pos: BlockPos) -> Option<&mut dyn CapabilitySource>;

    /// The portable object with identity `id`, if it still exists.
    fn portable(&mut self, id: PortableId) -> Option<&mut dyn CapabilitySource>;

    /// Resolve a target to its source.
    fn source(&mut self, target: &RemoteTarget) -> Option<&mut dyn CapabilitySource> {
        match *target {
            RemoteTarget::Block { pos, .. } => self.block(pos),
            RemoteTarget::Portable { id, .. } => self.portable(id),
        }
    }
}
