//! In-memory implementations of `isaac-core`'s collaborator traits, used by
//! this crate's and other crates' integration tests and by the `isaac-node`
//! demo binary. Grounded on `test::{client, env}`'s thin async-trait wrapper
//! style, generalized from a single closure-backed client to the five
//! collaborators ISAAC Core actually needs.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use isaac_core::{BlockStore, Broadcaster, ConnectionManager, Syncer, TxPool};
use isaac_types::{Ballot, Block, Hash, Height, ValidatorSet};

use crate::signing::{Address, TestContext};

/// Records every ballot handed to `broadcast` for assertions, instead of
/// actually delivering it anywhere.
#[derive(Default)]
pub struct InMemoryBroadcaster {
    sent: Mutex<Vec<Ballot<TestContext>>>,
}

impl InMemoryBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Ballot<TestContext>> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Broadcaster<TestContext> for InMemoryBroadcaster {
    async fn broadcast(&self, ballot: Ballot<TestContext>) {
        self.sent.lock().unwrap().push(ballot);
    }
}

/// A validator roster fixed for the lifetime of the node.
pub struct FixedConnectionManager {
    validators: ValidatorSet<TestContext>,
}

impl FixedConnectionManager {
    pub fn new(validators: ValidatorSet<TestContext>) -> Self {
        Self { validators }
    }
}

impl ConnectionManager<TestContext> for FixedConnectionManager {
    fn all_validators(&self) -> ValidatorSet<TestContext> {
        self.validators.clone()
    }
}

/// An append-only in-memory block store.
#[derive(Default)]
pub struct InMemoryBlockStore {
    blocks: Mutex<Vec<Block<TestContext>>>,
}

impl InMemoryBlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blocks(&self) -> Vec<Block<TestContext>> {
        self.blocks.lock().unwrap().clone()
    }

    pub fn latest(&self) -> Option<Block<TestContext>> {
        self.blocks.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl BlockStore<TestContext> for InMemoryBlockStore {
    async fn save(&self, block: &Block<TestContext>) -> Result<(), String> {
        self.blocks.lock().unwrap().push(block.clone());
        Ok(())
    }
}

/// A block store that always fails to persist, for exercising the
/// Storage-Fatal error path.
#[derive(Default)]
pub struct FailingBlockStore;

#[async_trait]
impl BlockStore<TestContext> for FailingBlockStore {
    async fn save(&self, _block: &Block<TestContext>) -> Result<(), String> {
        Err("disk full".to_string())
    }
}

/// An in-memory transaction pool pre-seeded with known hash-to-payload
/// mappings; `resolve` returns `None` for anything not seeded, exercising
/// the "can't resolve, drop from the block" path. `seed` order is preserved
/// for `pending` so a proposing node offers transactions oldest-first.
#[derive(Default)]
pub struct InMemoryTxPool {
    known: Mutex<HashMap<Hash, Vec<u8>>>,
    order: Mutex<Vec<Hash>>,
    removed: Mutex<Vec<Hash>>,
}

impl InMemoryTxPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, hash: Hash, payload: Vec<u8>) {
        if self.known.lock().unwrap().insert(hash, payload).is_none() {
            self.order.lock().unwrap().push(hash);
        }
    }

    pub fn removed(&self) -> Vec<Hash> {
        self.removed.lock().unwrap().clone()
    }
}

#[async_trait]
impl TxPool<TestContext> for InMemoryTxPool {
    async fn resolve(&self, hash: &Hash) -> Option<Vec<u8>> {
        self.known.lock().unwrap().get(hash).cloned()
    }

    async fn remove(&self, hashes: &[Hash]) {
        let mut order = self.order.lock().unwrap();
        order.retain(|h| !hashes.contains(h));
        self.removed.lock().unwrap().extend_from_slice(hashes);
    }

    async fn pending(&self, max: usize) -> Vec<Hash> {
        self.order.lock().unwrap().iter().take(max).copied().collect()
    }
}

/// Records sync-target requests instead of driving an actual catch-up.
#[derive(Default)]
pub struct RecordingSyncer {
    targets: Mutex<Vec<(Height, Vec<Address>)>>,
}

impl RecordingSyncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn targets(&self) -> Vec<(Height, Vec<Address>)> {
        self.targets.lock().unwrap().clone()
    }
}

#[async_trait]
impl Syncer<TestContext> for RecordingSyncer {
    async fn set_sync_target(&self, height: Height, sources: Vec<Address>) {
        self.targets.lock().unwrap().push((height, sources));
    }
}
