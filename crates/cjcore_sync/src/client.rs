//! Requesting-side response handlers.

use cjcore_net::{
    ContextHandle, Dispatcher, Incoming, ReturnEnergy, ReturnEnergyData,
    ReturnFluidData, ReturnInventory,
};
use cjcore_storage::Snapshot;
use tracing::debug;

use crate::sink::ResultSink;

/// State owned by the presentation context.
#[derive(Debug, Default)]
pub struct ClientState {
    /// Where answers land.
    pub sink: ResultSink,
}

impl ClientState {
    /// Fresh state with an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Route the four response kinds into the sink of the context behind
/// `client`.
pub fn register_client(dispatcher: &mut Dispatcher, client: &ContextHandle<ClientState>) {
    dispatcher.register(client, |state: &mut ClientState, msg: Incoming<ReturnEnergy>| {
        debug!(from = %msg.from, amount = msg.message.amount, "energy answer");
        let ReturnEnergy { amount, delivery } = msg.message;
        state.sink.deliver(delivery, Snapshot::EnergyAmount(amount))
    });
    dispatcher.register(
        client,
        |state: &mut ClientState, msg: Incoming<ReturnEnergyData>| {
            let ReturnEnergyData { energy, delivery } = msg.message;
            debug!(
                from = %msg.from,
                amount = energy.amount,
                capacity = energy.capacity,
                "energy data answer"
            );
            state.sink.deliver(delivery, Snapshot::Energy(energy))
        },
    );
    dispatcher.register(
        client,
        |state: &mut ClientState, msg: Incoming<ReturnFluidData>| {
            let ReturnFluidData {
                tank,
                fluid,
                delivery,
            } = msg.message;
            debug!(from = %msg.from, tank, amount = fluid.amount, "fluid answer");
            state.sink.deliver(delivery, Snapshot::Fluid(fluid))
        },
    );
    dispatcher.register(
        client,
        |state: &mut ClientState, msg: Incoming<ReturnInventory>| {
            let ReturnInventory {
                inventory,
                delivery,
                ..
            } = msg.message;
            debug!(from = %msg.from, entries = inventory.slots.len(), "inventory answer");
            state.sink.deliver(delivery, Snapshot::Inventory(inventory))
        },
    );
}
