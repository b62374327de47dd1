use core::fmt;

use serde::{Deserialize, Serialize};

use crate::{Context, Hash, Height};

/// A confirmed block. `version` and `state_root` are the two fields the
/// source left as half-refactored TODOs; they are carried as `Option` and
/// default to `None` until a schema for them is agreed on (see DESIGN.md).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Block<Ctx: Context> {
    pub height: Height,
    pub hash: Hash,
    pub prev_hash: Hash,
    pub total_txs: u64,
    pub total_ops: u64,
    pub proposer: Ctx::Address,
    pub confirmed_at: String,
    pub tx_hashes: Vec<Hash>,
    pub version: Option<u32>,
    pub state_root: Option<Hash>,
}

impl<Ctx: Context> Block<Ctx> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        height: Height,
        prev_hash: Hash,
        total_txs: u64,
        total_ops: u64,
        proposer: Ctx::Address,
        confirmed_at: String,
        tx_hashes: Vec<Hash>,
    ) -> Self {
        let mut block = Self {
            height,
            hash: Hash::ZERO,
            prev_hash,
            total_txs,
            total_ops,
            proposer,
            confirmed_at,
            tx_hashes,
            version: None,
            state_root: None,
        };
        block.hash = block.compute_hash();
        block
    }

    fn compute_hash(&self) -> Hash {
        let mut buf = Vec::new();
        buf.extend_from_slice(&self.height.as_u64().to_be_bytes());
        buf.extend_from_slice(self.prev_hash.as_bytes());
        buf.extend_from_slice(&self.total_txs.to_be_bytes());
        buf.extend_from_slice(&self.total_ops.to_be_bytes());
        buf.extend_from_slice(format!("{:?}", self.proposer).as_bytes());
        buf.extend_from_slice(self.confirmed_at.as_bytes());
        for tx in &self.tx_hashes {
            buf.extend_from_slice(tx.as_bytes());
        }
        Hash::digest(&buf)
    }
}

impl<Ctx: Context> fmt::Debug for Block<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("height", &self.height)
            .field("hash", &self.hash)
            .field("total_txs", &self.total_txs)
            .field("proposer", &self.proposer)
            .finish()
    }
}

impl<Ctx: Context> fmt::Display for Block<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block(height={}, hash={})", self.height, self.hash)
    }
}
