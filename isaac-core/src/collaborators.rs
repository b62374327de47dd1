//! External collaborator interfaces consumed by the core (§6). Each is a
//! thin `#[async_trait]` boundary; concrete implementations (LevelDB store,
//! libp2p broadcaster, HSM signer, ...) are commodity infrastructure outside
//! this crate's scope. `isaac-test` supplies in-memory implementations used
//! by this crate's own integration tests and by the `isaac-node` demo.
//!
//! Grounded on `driver::{Client, Env}`'s `#[async_trait]` usage, generalized
//! to the five collaborators named in the spec.

use async_trait::async_trait;

use isaac_types::{Block, Context, Hash, Height};

/// Fire-and-forget ballot broadcast.
#[async_trait]
pub trait Broadcaster<Ctx: Context>: Send + Sync {
    async fn broadcast(&self, ballot: isaac_types::Ballot<Ctx>);
}

/// The configured validator roster. Node discovery and membership itself are
/// out of scope (§1); this is just the read accessor `ISAAC Core` and the
/// proposer selector consume.
pub trait ConnectionManager<Ctx: Context>: Send + Sync {
    fn all_validators(&self) -> isaac_types::ValidatorSet<Ctx>;
}

/// Persists a finalized block atomically. `save` returning `Err` is the
/// single Storage-Fatal failure mode in the whole engine (§7, §8).
#[async_trait]
pub trait BlockStore<Ctx: Context>: Send + Sync {
    async fn save(&self, block: &Block<Ctx>) -> Result<(), String>;
}

/// External, externally-synchronized transaction pool.
#[async_trait]
pub trait TxPool<Ctx: Context>: Send + Sync {
    async fn resolve(&self, hash: &Hash) -> Option<Vec<u8>>;
    async fn remove(&self, hashes: &[Hash]);

    /// Candidate transaction hashes a proposer may carry in its next INIT
    /// ballot, in the pool's own ordering, capped at `max`. Transaction
    /// *validation* rules remain external (§1); this only supplies the
    /// opaque hash list the state manager needs to synthesize a proposal.
    async fn pending(&self, max: usize) -> Vec<Hash>;
}

/// Hands off to the external catch-up data plane. The core only ever
/// decides *when* to sync and *to what height* (§1); it never fetches data
/// itself.
#[async_trait]
pub trait Syncer<Ctx: Context>: Send + Sync {
    async fn set_sync_target(&self, height: Height, sources: Vec<Ctx::Address>);
}
