use std::collections::BTreeMap;

use isaac_types::{Context, Hash, VotingBasis};

use crate::round_vote::RoundVote;

/// Per-basis record of an active voting round. Created lazily by the first
/// valid ballot seen for that basis (§4.3): the proposer of that first
/// ballot becomes `elected_proposer` and is the only proposer the local node
/// ever acts on, though ballots naming other proposers are still recorded as
/// evidence in `votes_by_proposer`.
pub struct RunningRound<Ctx: Context> {
    basis: VotingBasis,
    elected_proposer: Ctx::Address,
    proposed_tx_hashes_by_proposer: BTreeMap<Ctx::Address, Vec<Hash>>,
    votes_by_proposer: BTreeMap<Ctx::Address, RoundVote<Ctx>>,
}

impl<Ctx: Context> RunningRound<Ctx> {
    /// Creates a running round, electing `proposer` and recording the INIT
    /// ballot's transaction set under it.
    pub fn new(basis: VotingBasis, proposer: Ctx::Address, init_tx_hashes: Vec<Hash>) -> Self {
        let mut proposed = BTreeMap::new();
        proposed.insert(proposer.clone(), init_tx_hashes);

        Self {
            basis,
            elected_proposer: proposer,
            proposed_tx_hashes_by_proposer: proposed,
            votes_by_proposer: BTreeMap::new(),
        }
    }

    pub fn basis(&self) -> &VotingBasis {
        &self.basis
    }

    pub fn elected_proposer(&self) -> &Ctx::Address {
        &self.elected_proposer
    }

    pub fn is_elected_proposer(&self, proposer: &Ctx::Address) -> bool {
        &self.elected_proposer == proposer
    }

    pub fn tx_hashes_of(&self, proposer: &Ctx::Address) -> Option<&[Hash]> {
        self.proposed_tx_hashes_by_proposer
            .get(proposer)
            .map(|v| v.as_slice())
    }

    /// The transaction set proposed by the elected proposer, used to
    /// assemble the block on finalize.
    pub fn elected_tx_hashes(&self) -> &[Hash] {
        self.proposed_tx_hashes_by_proposer
            .get(&self.elected_proposer)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Returns the `RoundVote` for `proposer`, creating it (and recording
    /// `tx_hashes` if this proposer hasn't been seen before) if absent.
    pub fn vote_entry(&mut self, proposer: Ctx::Address, tx_hashes: &[Hash]) -> &mut RoundVote<Ctx> {
        self.proposed_tx_hashes_by_proposer
            .entry(proposer.clone())
            .or_insert_with(|| tx_hashes.to_vec());
        self.votes_by_proposer.entry(proposer).or_default()
    }

    pub fn vote_entry_if_exists(&self, proposer: &Ctx::Address) -> Option<&RoundVote<Ctx>> {
        self.votes_by_proposer.get(proposer)
    }

    pub fn votes_of_elected_proposer(&self) -> Option<&RoundVote<Ctx>> {
        self.votes_by_proposer.get(&self.elected_proposer)
    }

    /// Removes the `RoundVote` slice for a single proposer, used on a NO
    /// outcome (§4.5 `close_consensus`) which only erases that proposer's
    /// evidence rather than the whole running round.
    pub fn remove_proposer_slice(&mut self, proposer: &Ctx::Address) {
        self.votes_by_proposer.remove(proposer);
        self.proposed_tx_hashes_by_proposer.remove(proposer);
    }
}

impl<Ctx: Context> Clone for RunningRound<Ctx> {
    fn clone(&self) -> Self {
        Self {
            basis: self.basis,
            elected_proposer: self.elected_proposer.clone(),
            proposed_tx_hashes_by_proposer: self.proposed_tx_hashes_by_proposer.clone(),
            votes_by_proposer: self.votes_by_proposer.clone(),
        }
    }
}

impl<Ctx: Context> core::fmt::Debug for RunningRound<Ctx> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RunningRound")
            .field("basis", &self.basis)
            .field("elected_proposer", &self.elected_proposer)
            .field("proposers_seen", &self.proposed_tx_hashes_by_proposer.len())
            .finish()
    }
}
