//! Request and response messages exchanged over a storage channel.
//!
//! Every request names a target and a [`Delivery`]; the matching response
//! echoes the delivery back so the requesting side can route the answer
//! without keeping any per-request state.
//!
//! A frame is one [`MessageKind`] id byte followed by the message payload.
//! A value of a message type only exists once it has been fully constructed
//! or fully decoded; decoding a truncated or malformed payload yields a
//! [`CodecError`] instead.

use bytes::Bytes;
use cjcore_storage::{
    BlockPos, EnergySnapshot, FluidSnapshot, InventorySnapshot, ItemEntry, ItemTag, PortableId,
    RemoteTarget, Side, SlotRange,
};

use crate::codec::{WireReader, WireWriter, decode_blob, encode_blob};
use crate::error::CodecError;

// ── Routing metadata ────────────────────────────────────────────────────────

/// Key of a single-slot cache entry: a namespace plus the requester's
/// self-chosen identity (e.g. `("cjcore", "Overlay")`).
///
/// Two outstanding requests with the same key share one slot; the later
/// answer overwrites the earlier one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    /// Owning namespace (usually a mod or subsystem id).
    pub namespace: String,
    /// Requester identity within the namespace.
    pub requester: String,
}

impl CacheKey {
    /// Create a key.
    #[must_use]
    pub fn new(namespace: impl Into<String>, requester: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            requester: requester.into(),
        }
    }
}

/// Handle of a write-back callback registered on the requesting side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(pub u64);

/// Where the answer to a request should land.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Delivery {
    /// Into the consume-on-read cache under this key.
    Cache(CacheKey),
    /// Into the callback bound under this id.
    Writeback(BindingId),
}

impl Delivery {
    /// Shorthand for [`Delivery::Cache`].
    #[must_use]
    pub fn cache(namespace: impl Into<String>, requester: impl Into<String>) -> Self {
        Self::Cache(CacheKey::new(namespace, requester))
    }
}

/// Stable one-byte id of each message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageKind {
    /// [`GetEnergy`].
    GetEnergy = 1,
    /// [`ReturnEnergy`].
    ReturnEnergy = 2,
    /// [`GetEnergyData`].
    GetEnergyData = 3,
    /// [`ReturnEnergyData`].
    ReturnEnergyData = 4,
    /// [`GetFluidData`].
    GetFluidData = 5,
    /// [`ReturnFluidData`].
    ReturnFluidData = 6,
    /// [`GetInventory`].
    GetInventory = 7,
    /// [`ReturnInventory`].
    ReturnInventory = 8,
}

impl MessageKind {
    /// The wire id.
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Inverse of [`MessageKind::id`].
    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        Some(match id {
            1 => Self::GetEnergy,
            2 => Self::ReturnEnergy,
            3 => Self::GetEnergyData,
            4 => Self::ReturnEnergyData,
            5 => Self::GetFluidData,
            6 => Self::ReturnFluidData,
            7 => Self::GetInventory,
            8 => Self::ReturnInventory,
            _ => return None,
        })
    }

    /// Name used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::GetEnergy => "get_energy",
            Self::ReturnEnergy => "return_energy",
            Self::GetEnergyData => "get_energy_data",
            Self::ReturnEnergyData => "return_energy_data",
            Self::GetFluidData => "get_fluid_data",
            Self::ReturnFluidData => "return_fluid_data",
            Self::GetInventory => "get_inventory",
            Self::ReturnInventory => "return_inventory",
        }
    }

    /// Whether messages of this kind travel toward the authoritative side.
    #[must_use]
    pub const fn is_request(self) -> bool {
        matches!(
            self,
            Self::GetEnergy | Self::GetEnergyData | Self::GetFluidData | Self::GetInventory
        )
    }
}

/// A message with a positional binary layout.
pub trait WireMessage: Sized + Send + 'static {
    /// The message's kind id.
    const KIND: MessageKind;

    /// Write all fields in order.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] if a field cannot be represented on the wire.
    fn write(&self, w: &mut WireWriter) -> Result<(), CodecError>;

    /// Read all fields in order.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] on truncated or malformed input.
    fn read(r: &mut WireReader<'_>) -> Result<Self, CodecError>;

    /// Encode the payload (without the kind byte).
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] if a field cannot be represented on the wire.
    fn encode(&self) -> Result<Bytes, CodecError> {
        let mut w = WireWriter::new();
        self.write(&mut w)?;
        Ok(w.finish())
    }

    /// Decode a complete payload (without the kind byte).
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] on truncated, malformed, or oversized input.
    fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = WireReader::new(bytes);
        let message = Self::read(&mut r)?;
        r.finish()?;
        Ok(message)
    }
}

/// Encode `message` as a frame: kind byte, then payload.
///
/// # Errors
///
/// Returns [`CodecError`] if the payload cannot be encoded.
pub fn encode_frame<M: WireMessage>(message: &M) -> Result<Bytes, CodecError> {
    let mut w = WireWriter::new();
    w.put_u8(M::KIND.id());
    message.write(&mut w)?;
    Ok(w.finish())
}

/// Split a frame into its raw kind byte and payload.
///
/// # Errors
///
/// Returns [`CodecError::EmptyFrame`] for an empty buffer.
pub fn split_frame(frame: &[u8]) -> Result<(u8, &[u8]), CodecError> {
    frame.split_first().map(|(k, p)| (*k, p)).ok_or(CodecError::EmptyFrame)
}

// ── Shared field layouts ────────────────────────────────────────────────────

const NO_SIDE: u8 = 0xFF;
const TARGET_BLOCK: u8 = 0;
const TARGET_PORTABLE: u8 = 1;
const DELIVERY_CACHE: u8 = 0;
const DELIVERY_WRITEBACK: u8 = 1;

fn write_target(w: &mut WireWriter, target: &RemoteTarget) {
    match *target {
        RemoteTarget::Block { pos, .. } => {
            w.put_u8(TARGET_BLOCK);
            w.put_i32(pos.x);
            w.put_i32(pos.y);
            w.put_i32(pos.z);
        }
        RemoteTarget::Portable { id, .. } => {
            w.put_u8(TARGET_PORTABLE);
            w.put_u64(id.0);
        }
    }
    w.put_u8(target.side().map_or(NO_SIDE, Side::index));
}

fn read_target(r: &mut WireReader<'_>) -> Result<RemoteTarget, CodecError> {
    let target = match r.get_u8("target kind")? {
        TARGET_BLOCK => {
            let x = r.get_i32("target x")?;
            let y = r.get_i32("target y")?;
            let z = r.get_i32("target z")?;
            RemoteTarget::block(BlockPos::new(x, y, z), None)
        }
        TARGET_PORTABLE => RemoteTarget::portable(PortableId(r.get_u64("target id")?), None),
        value => {
            return Err(CodecError::InvalidTag {
                field: "target kind",
                value,
            });
        }
    };
    let side = match r.get_u8("side")? {
        NO_SIDE => None,
        value => Some(Side::from_index(value).ok_or(CodecError::InvalidTag {
            field: "side",
            value,
        })?),
    };
    Ok(target.with_side(side))
}

fn write_delivery(w: &mut WireWriter, delivery: &Delivery) -> Result<(), CodecError> {
    match delivery {
        Delivery::Cache(key) => {
            w.put_u8(DELIVERY_CACHE);
            w.put_str(&key.namespace)?;
            w.put_str(&key.requester)?;
        }
        Delivery::Writeback(binding) => {
            w.put_u8(DELIVERY_WRITEBACK);
            w.put_u64(binding.0);
        }
    }
    Ok(())
}

fn read_delivery(r: &mut WireReader<'_>) -> Result<Delivery, CodecError> {
    match r.get_u8("delivery")? {
        DELIVERY_CACHE => {
            let namespace = r.get_str("namespace")?;
            let requester = r.get_str("requester")?;
            Ok(Delivery::Cache(CacheKey {
                namespace,
                requester,
            }))
        }
        DELIVERY_WRITEBACK => Ok(Delivery::Writeback(BindingId(r.get_u64("binding")?))),
        value => Err(CodecError::InvalidTag {
            field: "delivery",
            value,
        }),
    }
}

fn write_range(w: &mut WireWriter, range: Option<SlotRange>) {
    w.put_bool(range.is_some());
    if let Some(range) = range {
        w.put_i32(range.from);
        w.put_i32(range.to);
    }
}

fn read_range(r: &mut WireReader<'_>) -> Result<Option<SlotRange>, CodecError> {
    if !r.get_bool("has range")? {
        return Ok(None);
    }
    let from = r.get_i32("range from")?;
    let to = r.get_i32("range to")?;
    Ok(Some(SlotRange::new(from, to)))
}

fn write_item(w: &mut WireWriter, entry: &ItemEntry) -> Result<(), CodecError> {
    w.put_str(&entry.item)?;
    w.put_i32(entry.count);
    w.put_bool(entry.tag.is_some());
    if let Some(tag) = &entry.tag {
        w.put_blob(&encode_blob(tag)?)?;
    }
    Ok(())
}

fn read_item(r: &mut WireReader<'_>) -> Result<ItemEntry, CodecError> {
    let item = r.get_str("item id")?;
    let count = r.get_i32("item count")?;
    let tag = if r.get_bool("has tag")? {
        Some(decode_blob::<ItemTag>(r.get_blob("item tag")?)?)
    } else {
        None
    };
    Ok(ItemEntry { item, count, tag })
}

// ── Energy ──────────────────────────────────────────────────────────────────

/// Ask for the energy stored in a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetEnergy {
    /// Unit id the answer should be expressed in.
    pub unit: String,
    /// What to read.
    pub target: RemoteTarget,
    /// Where the answer goes.
    pub delivery: Delivery,
}

impl WireMessage for GetEnergy {
    const KIND: MessageKind = MessageKind::GetEnergy;

    fn write(&self, w: &mut WireWriter) -> Result<(), CodecError> {
        w.put_str(&self.unit)?;
        write_target(w, &self.target);
        write_delivery(w, &self.delivery)
    }

    fn read(r: &mut WireReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            unit: r.get_str("unit")?,
            target: read_target(r)?,
            delivery: read_delivery(r)?,
        })
    }
}

/// Answer to [`GetEnergy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnEnergy {
    /// Stored amount in the requested unit.
    pub amount: i64,
    /// Echo of the request's delivery.
    pub delivery: Delivery,
}

impl WireMessage for ReturnEnergy {
    const KIND: MessageKind = MessageKind::ReturnEnergy;

    fn write(&self, w: &mut WireWriter) -> Result<(), CodecError> {
        w.put_i64(self.amount);
        write_delivery(w, &self.delivery)
    }

    fn read(r: &mut WireReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            amount: r.get_i64("amount")?,
            delivery: read_delivery(r)?,
        })
    }
}

/// Ask for stored energy and capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetEnergyData {
    /// Unit id the answer should be expressed in.
    pub unit: String,
    /// What to read.
    pub target: RemoteTarget,
    /// Where the answer goes.
    pub delivery: Delivery,
}

impl WireMessage for GetEnergyData {
    const KIND: MessageKind = MessageKind::GetEnergyData;

    fn write(&self, w: &mut WireWriter) -> Result<(), CodecError> {
        w.put_str(&self.unit)?;
        write_target(w, &self.target);
        write_delivery(w, &self.delivery)
    }

    fn read(r: &mut WireReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            unit: r.get_str("unit")?,
            target: read_target(r)?,
            delivery: read_delivery(r)?,
        })
    }
}

/// Answer to [`GetEnergyData`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnEnergyData {
    /// Amount and capacity in the requested unit.
    pub energy: EnergySnapshot,
    /// Echo of the request's delivery.
    pub delivery: Delivery,
}

impl WireMessage for ReturnEnergyData {
    const KIND: MessageKind = MessageKind::ReturnEnergyData;

    fn write(&self, w: &mut WireWriter) -> Result<(), CodecError> {
        w.put_i64(self.energy.amount);
        w.put_i64(self.energy.capacity);
        write_delivery(w, &self.delivery)
    }

    fn read(r: &mut WireReader<'_>) -> Result<Self, CodecError> {
        let amount = r.get_i64("amount")?;
        let capacity = r.get_i64("capacity")?;
        Ok(Self {
            energy: EnergySnapshot { amount, capacity },
            delivery: read_delivery(r)?,
        })
    }
}

// ── Fluid ───────────────────────────────────────────────────────────────────

/// Ask for the contents of one fluid tank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetFluidData {
    /// Tank index.
    pub tank: i32,
    /// What to read.
    pub target: RemoteTarget,
    /// Where the answer goes.
    pub delivery: Delivery,
}

impl WireMessage for GetFluidData {
    const KIND: MessageKind = MessageKind::GetFluidData;

    fn write(&self, w: &mut WireWriter) -> Result<(), CodecError> {
        w.put_i32(self.tank);
        write_target(w, &self.target);
        write_delivery(w, &self.delivery)
    }

    fn read(r: &mut WireReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            tank: r.get_i32("tank")?,
            target: read_target(r)?,
            delivery: read_delivery(r)?,
        })
    }
}

/// Answer to [`GetFluidData`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnFluidData {
    /// Tank index that was read.
    pub tank: i32,
    /// The tank reading.
    pub fluid: FluidSnapshot,
    /// Echo of the request's delivery.
    pub delivery: Delivery,
}

impl WireMessage for ReturnFluidData {
    const KIND: MessageKind = MessageKind::ReturnFluidData;

    fn write(&self, w: &mut WireWriter) -> Result<(), CodecError> {
        w.put_i32(self.tank);
        w.put_i64(self.fluid.amount);
        w.put_i64(self.fluid.capacity);
        w.put_bool(self.fluid.fluid.is_some());
        if let Some(fluid) = &self.fluid.fluid {
            w.put_str(fluid)?;
        }
        write_delivery(w, &self.delivery)
    }

    fn read(r: &mut WireReader<'_>) -> Result<Self, CodecError> {
        let tank = r.get_i32("tank")?;
        let amount = r.get_i64("amount")?;
        let capacity = r.get_i64("capacity")?;
        let fluid = if r.get_bool("has fluid")? {
            Some(r.get_str("fluid")?)
        } else {
            None
        };
        Ok(Self {
            tank,
            fluid: FluidSnapshot {
                amount,
                capacity,
                fluid,
            },
            delivery: read_delivery(r)?,
        })
    }
}

// ── Inventory ───────────────────────────────────────────────────────────────

/// Ask for an inventory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetInventory {
    /// What to read.
    pub target: RemoteTarget,
    /// Merge equal items and drop empty slots.
    pub stacked: bool,
    /// Restrict the listing to these slots.
    pub range: Option<SlotRange>,
    /// Where the answer goes.
    pub delivery: Delivery,
}

impl WireMessage for GetInventory {
    const KIND: MessageKind = MessageKind::GetInventory;

    fn write(&self, w: &mut WireWriter) -> Result<(), CodecError> {
        write_target(w, &self.target);
        w.put_bool(self.stacked);
        write_range(w, self.range);
        write_delivery(w, &self.delivery)
    }

    fn read(r: &mut WireReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            target: read_target(r)?,
            stacked: r.get_bool("stacked")?,
            range: read_range(r)?,
            delivery: read_delivery(r)?,
        })
    }
}

/// Answer to [`GetInventory`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnInventory {
    /// Whether the listing is stacked.
    pub stacked: bool,
    /// The slot range that was requested.
    pub range: Option<SlotRange>,
    /// The listing.
    pub inventory: InventorySnapshot,
    /// Echo of the request's delivery.
    pub delivery: Delivery,
}

impl WireMessage for ReturnInventory {
    const KIND: MessageKind = MessageKind::ReturnInventory;

    fn write(&self, w: &mut WireWriter) -> Result<(), CodecError> {
        w.put_bool(self.stacked);
        write_range(w, self.range);
        let count = self.inventory.slots.len();
        w.put_i32(i32::try_from(count).map_err(|_| CodecError::LengthOverflow(count))?);
        for entry in &self.inventory.slots {
            write_item(w, entry)?;
        }
        write_delivery(w, &self.delivery)
    }

    fn read(r: &mut WireReader<'_>) -> Result<Self, CodecError> {
        let stacked = r.get_bool("stacked")?;
        let range = read_range(r)?;
        let count = r.get_i32("item count")?;
        let count = usize::try_from(count).map_err(|_| CodecError::NegativeCount {
            field: "item",
            count,
        })?;
        // Every entry takes at least 7 bytes, so a larger count is garbage.
        let mut slots = Vec::with_capacity(count.min(r.remaining() / 7));
        for _ in 0..count {
            slots.push(read_item(r)?);
        }
        Ok(Self {
            stacked,
            range,
            inventory: InventorySnapshot { slots },
            delivery: read_delivery(r)?,
        })
    }
}
