//! The stand-in "transport" for the demo network: an in-memory fan-out
//! broadcaster that hands every ballot to every node's own inbound channel,
//! including the sender's (§5 "fire-and-forget permitted" — delivery is
//! spawned rather than awaited so a slow receiver never stalls the sender).
//!
//! Grounded on `driver::client`'s thin collaborator-over-channel wrapper,
//! generalized from one peer to the whole validator roster since this demo
//! runs every node in the same process instead of over a real libp2p mesh.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use isaac_core::Broadcaster;
use isaac_state_manager::StateManagerHandle;
use isaac_test::TestContext;

/// Broadcasts to every node's handle. The roster is filled in once, after
/// every node's `StateManager` (and thus its handle) has been constructed —
/// each node's broadcaster needs the whole roster including its own handle,
/// but a node's handle only exists once its `StateManager::new` call
/// returns, which itself requires a broadcaster. [`OnceCell`] breaks that
/// cycle: every node is wired up with an empty, shared cell, and the cell is
/// populated once after the fact, before any node's run loop starts.
pub struct FanOutBroadcaster {
    peers: Arc<OnceCell<Vec<StateManagerHandle<TestContext>>>>,
}

impl FanOutBroadcaster {
    pub fn new(peers: Arc<OnceCell<Vec<StateManagerHandle<TestContext>>>>) -> Self {
        Self { peers }
    }
}

#[async_trait]
impl Broadcaster<TestContext> for FanOutBroadcaster {
    async fn broadcast(&self, ballot: isaac_types::Ballot<TestContext>) {
        let Some(peers) = self.peers.get() else {
            return;
        };

        for peer in peers {
            let peer = peer.clone();
            let ballot = ballot.clone();
            tokio::spawn(async move {
                let _ = peer.submit_ballot(ballot).await;
            });
        }
    }
}
