use tokio::sync::{mpsc, watch};

use isaac_types::{Ballot, Block, Context, Phase};

/// The caller-facing remote control for a running [`crate::manager::StateManager`]
/// task: submit inbound ballots, subscribe to phase/confirmed-block updates,
/// and request a graceful stop. Cloning is cheap; every clone shares the
/// same underlying channels.
#[derive(Clone)]
pub struct StateManagerHandle<Ctx: Context> {
    pub(crate) inbound: mpsc::Sender<Ballot<Ctx>>,
    pub(crate) phase: watch::Receiver<Phase>,
    pub(crate) confirmed: watch::Receiver<Option<Block<Ctx>>>,
    pub(crate) shutdown: watch::Sender<bool>,
}

impl<Ctx: Context> StateManagerHandle<Ctx> {
    /// Hands an inbound ballot to the state manager's dispatcher. Per §5
    /// "Suspension points", this is a suspension point: it awaits channel
    /// capacity rather than dropping on backpressure.
    pub async fn submit_ballot(&self, ballot: Ballot<Ctx>) -> Result<(), Ballot<Ctx>> {
        self.inbound.send(ballot).await.map_err(|e| e.0)
    }

    /// A live view of the current ballot phase, updated every time the state
    /// manager enters a new one.
    pub fn subscribe_phase(&self) -> watch::Receiver<Phase> {
        self.phase.clone()
    }

    /// A live view of the most recently confirmed block, `None` until the
    /// first one lands.
    pub fn subscribe_confirmed(&self) -> watch::Receiver<Option<Block<Ctx>>> {
        self.confirmed.clone()
    }

    /// Requests the state manager's run loop to stop. Idempotent (§5
    /// "Cancellation") — repeated calls are harmless since `watch::Sender`
    /// coalesces values.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }
}
