//! # cjcore_storage
//!
//! Unit conversion and capability resolution for remote storage.
//!
//! This crate provides:
//!
//! - [`units`]: energy units, exact conversion ratios, and the [`UnitTable`].
//! - [`target`]: [`RemoteTarget`]: a world position or portable object plus
//!   an optional [`Side`].
//! - [`snapshot`]: immutable energy, fluid, and inventory readings.
//! - [`capability`]: the traits a host implements to expose its storage.
//! - [`resolver`]: [`StorageResolver`], which reads and writes that storage
//!   in any registered unit and treats missing capabilities as empty.
//! - [`containers`] / [`host`]: reference storage records and an in-memory host.

pub mod capability;
pub mod containers;
pub mod error;
pub mod host;
pub mod resolver;
pub mod snapshot;
pub mod target;
pub mod units;

pub use capability::{CapabilitySource, EnergyHandle, FluidHandle, InventoryHandle, StorageHost};
pub use containers::{EnergyBuffer, FluidTank, ItemSlots};
pub use error::{StorageError, UnitError};
pub use host::{MemoryHost, StorageBlock};
pub use resolver::{SlotRange, StorageResolver};
pub use snapshot::{
    EnergySnapshot, FluidSnapshot, FluidStack, InventorySnapshot, ItemEntry, ItemTag, Snapshot,
    TagValue,
};
pub use target::{BlockPos, PortableId, RemoteTarget, Side};
pub use units::{FORGE_ENERGY, Ratio, Rgb, Unit, UnitTable, UnitTableBuilder};
