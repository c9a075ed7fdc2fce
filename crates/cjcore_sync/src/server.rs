//! Authoritative-side request handlers.
//!
//! Every request is answered. Targets without the requested storage read as
//! neutral values, and a request that cannot be satisfied (unknown unit,
//! inverted slot range) is logged and answered with neutral values too, so
//! the client simply sees an empty reading.

use cjcore_net::{
    ContextHandle, Dispatcher, GetEnergy, GetEnergyData, GetFluidData, GetInventory,
    HandlerError, Incoming, ReturnEnergy, ReturnEnergyData, ReturnFluidData, ReturnInventory,
};
use cjcore_storage::{EnergySnapshot, InventorySnapshot, StorageHost};
use tracing::{debug, warn};

use crate::local::LocalStorage;

/// Route the four request kinds to the context owning `storage`.
pub fn register_server<H>(dispatcher: &mut Dispatcher, storage: &ContextHandle<LocalStorage<H>>)
where
    H: StorageHost + 'static,
{
    dispatcher.register(storage, handle_get_energy::<H>);
    dispatcher.register(storage, handle_get_energy_data::<H>);
    dispatcher.register(storage, handle_get_fluid_data::<H>);
    dispatcher.register(storage, handle_get_inventory::<H>);
}

fn handle_get_energy<H: StorageHost>(
    storage: &mut LocalStorage<H>,
    req: Incoming<GetEnergy>,
) -> Result<(), HandlerError> {
    let GetEnergy {
        unit,
        target,
        delivery,
    } = &req.message;
    let amount = storage.energy_stored(target, unit).unwrap_or_else(|e| {
        warn!(from = %req.from, %target, error = %e, "energy query failed");
        0
    });
    debug!(from = %req.from, %target, unit = unit.as_str(), amount, "answering energy query");
    req.respond(&ReturnEnergy {
        amount,
        delivery: delivery.clone(),
    })?;
    Ok(())
}

fn handle_get_energy_data<H: StorageHost>(
    storage: &mut LocalStorage<H>,
    req: Incoming<GetEnergyData>,
) -> Result<(), HandlerError> {
    let GetEnergyData {
        unit,
        target,
        delivery,
    } = &req.message;
    let energy = storage.energy_data(target, unit).unwrap_or_else(|e| {
        warn!(from = %req.from, %target, error = %e, "energy data query failed");
        EnergySnapshot::EMPTY
    });
    debug!(
        from = %req.from,
        %target,
        unit = unit.as_str(),
        amount = energy.amount,
        capacity = energy.capacity,
        "answering energy data query"
    );
    req.respond(&ReturnEnergyData {
        energy,
        delivery: delivery.clone(),
    })?;
    Ok(())
}

fn handle_get_fluid_data<H: StorageHost>(
    storage: &mut LocalStorage<H>,
    req: Incoming<GetFluidData>,
) -> Result<(), HandlerError> {
    let GetFluidData {
        tank,
        target,
        delivery,
    } = &req.message;
    let fluid = storage.fluid_tank(target, *tank);
    debug!(from = %req.from, %target, tank, amount = fluid.amount, "answering fluid query");
    req.respond(&ReturnFluidData {
        tank: *tank,
        fluid,
        delivery: delivery.clone(),
    })?;
    Ok(())
}

fn handle_get_inventory<H: StorageHost>(
    storage: &mut LocalStorage<H>,
    req: Incoming<GetInventory>,
) -> Result<(), HandlerError> {
    let GetInventory {
        target,
        stacked,
        range,
        delivery,
    } = &req.message;
    let inventory = storage
        .inventory(target, *stacked, *range)
        .unwrap_or_else(|e| {
            warn!(from = %req.from, %target, error = %e, "inventory query failed");
            InventorySnapshot::empty()
        });
    debug!(
        from = %req.from,
        %target,
        entries = inventory.slots.len(),
        "answering inventory query"
    );
    req.respond(&ReturnInventory {
        stacked: *stacked,
        range: *range,
        inventory,
        delivery: delivery.clone(),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cjcore_net::messages::split_frame;
    use cjcore_net::{Delivery, ExecutionContext, Outbound, PeerId, WireMessage};
    use cjcore_storage::{
        BlockPos, EnergyBuffer, FORGE_ENERGY, MemoryHost, RemoteTarget, SlotRange, StorageBlock,
        UnitTable,
    };
    use tokio::sync::mpsc::UnboundedReceiver;

    use super::*;

    const CLIENT: PeerId = PeerId(3);

    struct Harness {
        dispatcher: Dispatcher,
        out: UnboundedReceiver<Outbound>,
        ctx: ExecutionContext<LocalStorage<MemoryHost>>,
    }

    impl Harness {
        fn new() -> Self {
            let mut host = MemoryHost::new();
            host.place(
                BlockPos::new(0, 0, 0),
                StorageBlock::energy(EnergyBuffer::new(FORGE_ENERGY, 100).with_amount(40)),
            );
            let ctx = ExecutionContext::new(
                "simulation",
                LocalStorage::new(host, Arc::new(UnitTable::standard())),
            );
            let (mut dispatcher, out) = Dispatcher::new("test");
            register_server(&mut dispatcher, &ctx.handle());
            Self {
                dispatcher,
                out,
                ctx,
            }
        }

        /// Send `request` from the client and return the decoded answer.
        fn ask<Q: WireMessage, A: WireMessage>(&mut self, request: &Q) -> A {
            let frame = cjcore_net::messages::encode_frame(request).unwrap();
            assert!(self.dispatcher.on_receive(CLIENT, &frame));
            assert_eq!(self.ctx.run_pending(), 1);
            let out = self.out.try_recv().unwrap();
            assert_eq!(out.peer, CLIENT);
            let (kind, payload) = split_frame(&out.frame).unwrap();
            assert_eq!(kind, A::KIND.id());
            A::decode(payload).unwrap()
        }
    }

    fn battery() -> RemoteTarget {
        RemoteTarget::block(BlockPos::new(0, 0, 0), None)
    }

    fn nowhere() -> RemoteTarget {
        RemoteTarget::block(BlockPos::new(9, 9, 9), None)
    }

    #[test]
    fn test_all_request_kinds_registered() {
        let h = Harness::new();
        for kind in [
            GetEnergy::KIND,
            GetEnergyData::KIND,
            GetFluidData::KIND,
            GetInventory::KIND,
        ] {
            assert!(h.dispatcher.handles(kind));
        }
        assert!(!h.dispatcher.handles(ReturnEnergy::KIND));
    }

    #[test]
    fn test_energy_answer_echoes_delivery() {
        let mut h = Harness::new();
        let delivery = Delivery::cache("cjcore", "Overlay");
        let reply: ReturnEnergyData = h.ask(&GetEnergyData {
            unit: FORGE_ENERGY.to_string(),
            target: battery(),
            delivery: delivery.clone(),
        });
        assert_eq!(reply.energy, EnergySnapshot::new(40, 100));
        assert_eq!(reply.delivery, delivery);

        let reply: ReturnEnergy = h.ask(&GetEnergy {
            unit: "Minecraft Joule".to_string(),
            target: battery(),
            delivery,
        });
        assert_eq!(reply.amount, 4);
    }

    #[test]
    fn test_failures_still_answer_neutral() {
        let mut h = Harness::new();
        let reply: ReturnEnergyData = h.ask(&GetEnergyData {
            unit: "Furlong".to_string(),
            target: battery(),
            delivery: Delivery::cache("a", "b"),
        });
        assert_eq!(reply.energy, EnergySnapshot::EMPTY);

        let reply: ReturnFluidData = h.ask(&GetFluidData {
            tank: 3,
            target: nowhere(),
            delivery: Delivery::cache("a", "b"),
        });
        assert_eq!(reply.tank, 3);
        assert!(reply.fluid.is_empty());

        let reply: ReturnInventory = h.ask(&GetInventory {
            target: battery(),
            stacked: false,
            range: Some(SlotRange::new(5, 1)),
            delivery: Delivery::cache("a", "b"),
        });
        assert!(reply.inventory.slots.is_empty());
        assert_eq!(reply.range, Some(SlotRange::new(5, 1)));
    }
}
