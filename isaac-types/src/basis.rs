use core::fmt;

use serde::{Deserialize, Serialize};

use crate::{Height, RoundNumber};
use crate::Hash;

/// The immutable tuple identifying a voting round. Two ballots collide iff
/// their bases match exactly, all five fields included.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VotingBasis {
    pub height: Height,
    pub round: RoundNumber,
    pub prev_block_hash: Hash,
    pub total_txs: u64,
    pub total_ops: u64,
}

impl VotingBasis {
    pub fn new(
        height: Height,
        round: RoundNumber,
        prev_block_hash: Hash,
        total_txs: u64,
        total_ops: u64,
    ) -> Self {
        Self {
            height,
            round,
            prev_block_hash,
            total_txs,
            total_ops,
        }
    }

    /// The key used to address a `RunningRound`: `(height, round)` plus the
    /// full basis, so that two bases with the same `(height, round)` but a
    /// different `prev_block_hash` are never confused with one another
    /// (invariant 3).
    pub fn key(&self) -> BasisKey {
        BasisKey {
            height: self.height,
            round: self.round,
            prev_block_hash: self.prev_block_hash,
        }
    }
}

impl fmt::Display for VotingBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(height={}, round={}, prev={}, txs={}, ops={})",
            self.height, self.round, self.prev_block_hash, self.total_txs, self.total_ops
        )
    }
}

/// The subset of a `VotingBasis` used to key the running-rounds table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BasisKey {
    pub height: Height,
    pub round: RoundNumber,
    pub prev_block_hash: Hash,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn different_prev_hash_is_a_different_basis() {
        let a = VotingBasis::new(Height::new(2), RoundNumber::new(0), Hash::digest(b"a"), 0, 0);
        let b = VotingBasis::new(Height::new(2), RoundNumber::new(0), Hash::digest(b"b"), 0, 0);
        assert_ne!(a, b);
        assert_ne!(a.key(), b.key());
    }
}
