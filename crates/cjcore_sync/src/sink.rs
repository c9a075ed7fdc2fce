//! Result delivery on the requesting side.
//!
//! A [`ResultSink`] lives inside the presentation context's state and offers
//! two delivery modes:
//!
//! - **cache**: one pending [`Snapshot`] per [`CacheKey`]. A later answer for
//!   the same key overwrites an unread one, and reading an entry removes it.
//! - **write-back**: the caller binds a typed callback, puts the returned
//!   [`BindingId`] in its requests, and the callback is invoked with each
//!   answer.

use std::collections::HashMap;

use cjcore_net::{BindingId, CacheKey, Delivery, HandlerError};
use cjcore_storage::{EnergySnapshot, FluidSnapshot, InventorySnapshot, Snapshot};
use tracing::{debug, trace};

type Callback<T> = Box<dyn FnMut(T) + Send>;

enum Binding {
    EnergyAmount(Callback<i64>),
    Energy(Callback<EnergySnapshot>),
    Fluid(Callback<FluidSnapshot>),
    Inventory(Callback<InventorySnapshot>),
}

impl Binding {
    const fn kind(&self) -> &'static str {
        match self {
            Self::EnergyAmount(_) => "energy_amount",
            Self::Energy(_) => "energy",
            Self::Fluid(_) => "fluid",
            Self::Inventory(_) => "inventory",
        }
    }
}

/// Keyed single-slot cache plus write-back bindings.
#[derive(Default)]
pub struct ResultSink {
    cache: HashMap<CacheKey, Snapshot>,
    bindings: HashMap<BindingId, Binding>,
    next_binding: u64,
}

impl std::fmt::Debug for ResultSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultSink")
            .field("cache", &self.cache)
            .field("bindings", &self.bindings.len())
            .finish()
    }
}

impl ResultSink {
    /// An empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ── Cache mode ──────────────────────────────────────────────────────

    /// Store `snapshot` under `key`, replacing any unread entry. Returns the
    /// replaced entry.
    pub fn put(&mut self, key: CacheKey, snapshot: Snapshot) -> Option<Snapshot> {
        trace!(?key, kind = snapshot.kind(), "caching result");
        let replaced = self.cache.insert(key, snapshot);
        if let Some(old) = &replaced {
            debug!(kind = old.kind(), "unread cached result overwritten");
        }
        replaced
    }

    /// Remove and return the entry under `key`.
    pub fn take_once(&mut self, key: &CacheKey) -> Option<Snapshot> {
        self.cache.remove(key)
    }

    /// Look at the entry under `key` without consuming it.
    #[must_use]
    pub fn peek(&self, key: &CacheKey) -> Option<&Snapshot> {
        self.cache.get(key)
    }

    /// Number of unread entries.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.cache.len()
    }

    fn take_if<T>(&mut self, key: &CacheKey, pick: impl Fn(&Snapshot) -> Option<T>) -> Option<T> {
        let value = pick(self.cache.get(key)?)?;
        self.cache.remove(key);
        Some(value)
    }

    /// Take a stored-amount answer. Entries of another kind are left alone.
    pub fn take_energy_amount(&mut self, key: &CacheKey) -> Option<i64> {
        self.take_if(key, |s| match s {
            Snapshot::EnergyAmount(amount) => Some(*amount),
            _ => None,
        })
    }

    /// Take an energy amount/capacity answer.
    pub fn take_energy(&mut self, key: &CacheKey) -> Option<EnergySnapshot> {
        self.take_if(key, |s| match s {
            Snapshot::Energy(energy) => Some(*energy),
            _ => None,
        })
    }

    /// Take a fluid tank answer.
    pub fn take_fluid(&mut self, key: &CacheKey) -> Option<FluidSnapshot> {
        self.take_if(key, |s| match s {
            Snapshot::Fluid(fluid) => Some(fluid.clone()),
            _ => None,
        })
    }

    /// Take an inventory answer.
    pub fn take_inventory(&mut self, key: &CacheKey) -> Option<InventorySnapshot> {
        self.take_if(key, |s| match s {
            Snapshot::Inventory(inventory) => Some(inventory.clone()),
            _ => None,
        })
    }

    // ── Write-back mode ─────────────────────────────────────────────────

    fn bind(&mut self, binding: Binding) -> BindingId {
        self.next_binding += 1;
        let id = BindingId(self.next_binding);
        debug!(binding = id.0, kind = binding.kind(), "callback bound");
        self.bindings.insert(id, binding);
        id
    }

    /// Bind a callback receiving stored-amount answers.
    pub fn bind_energy_amount(&mut self, f: impl FnMut(i64) + Send + 'static) -> BindingId {
        self.bind(Binding::EnergyAmount(Box::new(f)))
    }

    /// Bind a callback receiving energy amount/capacity answers.
    pub fn bind_energy(&mut self, f: impl FnMut(EnergySnapshot) + Send + 'static) -> BindingId {
        self.bind(Binding::Energy(Box::new(f)))
    }

    /// Bind a callback receiving fluid tank answers.
    pub fn bind_fluid(&mut self, f: impl FnMut(FluidSnapshot) + Send + 'static) -> BindingId {
        self.bind(Binding::Fluid(Box::new(f)))
    }

    /// Bind a callback receiving inventory answers.
    pub fn bind_inventory(
        &mut self,
        f: impl FnMut(InventorySnapshot) + Send + 'static,
    ) -> BindingId {
        self.bind(Binding::Inventory(Box::new(f)))
    }

    /// Drop a binding. Later answers addressed to it are abandoned.
    pub fn unbind(&mut self, id: BindingId) -> bool {
        self.bindings.remove(&id).is_some()
    }

    /// Whether `id` is currently bound.
    #[must_use]
    pub fn is_bound(&self, id: BindingId) -> bool {
        self.bindings.contains_key(&id)
    }

    /// Route `snapshot` according to `delivery`.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::Delivery`] if the binding is unknown or expects
    /// a different kind of snapshot; the snapshot is discarded.
    pub fn deliver(&mut self, delivery: Delivery, snapshot: Snapshot) -> Result<(), HandlerError> {
        let id = match delivery {
            Delivery::Cache(key) => {
                self.put(key, snapshot);
                return Ok(());
            }
            Delivery::Writeback(id) => id,
        };
        let Some(binding) = self.bindings.get_mut(&id) else {
            return Err(HandlerError::Delivery(format!("binding {} is not bound", id.0)));
        };
        match (binding, snapshot) {
            (Binding::EnergyAmount(f), Snapshot::EnergyAmount(amount)) => f(amount),
            (Binding::Energy(f), Snapshot::Energy(energy)) => f(energy),
            (Binding::Fluid(f), Snapshot::Fluid(fluid)) => f(fluid),
            (Binding::Inventory(f), Snapshot::Inventory(inventory)) => f(inventory),
            (binding, snapshot) => {
                return Err(HandlerError::Delivery(format!(
                    "binding {} expects {}, got {}",
                    id.0,
                    binding.kind(),
                    snapshot.kind()
                )));
            }
        }
        trace!(binding = id.0, "result written back");
        Ok(())
    }
}
