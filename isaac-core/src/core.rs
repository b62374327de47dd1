use std::collections::BTreeMap;
use std::sync::RwLock;

use isaac_tally::{RunningRound, ThresholdPolicy as Policy, VotingTally};
use isaac_types::{
    Ballot, BasisKey, Block, Context, Height, NodeState, RoundNumber, ValidatorSet, VoteValue,
    VotingBasis,
};

use crate::collaborators::{BlockStore, Syncer, TxPool};
use crate::error::CoreError;
use crate::selector::ProposerSelector;

pub use isaac_tally::{Decision, ThresholdPolicy};
pub use isaac_tally::SyncError;

/// The outcome of feeding a ballot into a `RoundVote` via [`IsaacCore::vote`]
/// or [`IsaacCore::vote_if_running_round_exists`] (§4.5).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteOutcome<Ctx: Context> {
    /// Whether this `(source, state)` pair had not been recorded before.
    pub is_new: bool,
    /// Set when the ballot's declared proposer disagrees with the running
    /// round's elected proposer (§4.3): the dispatcher must then treat the
    /// local vote as NO regardless of transaction validity.
    pub proposer_mismatch: bool,
    pub decision: Decision,
    _ctx: std::marker::PhantomData<Ctx>,
}

impl<Ctx: Context> VoteOutcome<Ctx> {
    fn new(is_new: bool, proposer_mismatch: bool, decision: Decision) -> Self {
        Self {
            is_new,
            proposer_mismatch,
            decision,
            _ctx: std::marker::PhantomData,
        }
    }
}

/// `running_rounds`, `latest_block` and `latest_voting_basis` are locked
/// together (§9 "Shared locks"): a `vote`/`finalize`/`close_consensus` call
/// typically needs to read-modify-write more than one of the three at once,
/// and splitting them into separate locks would only invite races between
/// the basis-validity check and the round table.
struct ConsensusState<Ctx: Context> {
    latest_block: Block<Ctx>,
    latest_voting_basis: Option<VotingBasis>,
    running_rounds: BTreeMap<BasisKey, RunningRound<Ctx>>,
}

/// The ISAAC Core (§4.5): the sole writer of the running-rounds table, the
/// latest confirmed block, and the cross-round voting tally. Readers (e.g.
/// an HTTP status endpoint) use the `&self` accessor methods, which take a
/// read lock and return an owned snapshot rather than a borrow, so that no
/// external caller can hold the lock across an `.await`.
pub struct IsaacCore<Ctx: Context> {
    validators: RwLock<ValidatorSet<Ctx>>,
    selector: Box<dyn ProposerSelector<Ctx>>,
    policy: Policy,
    network_id: Vec<u8>,
    max_transactions_per_ballot: usize,

    state: RwLock<ConsensusState<Ctx>>,
    tally: RwLock<VotingTally<Ctx>>,
    latest_req_sync_height: RwLock<Option<Height>>,
    node_state: RwLock<NodeState>,
}

impl<Ctx: Context> IsaacCore<Ctx> {
    pub fn new(
        validators: ValidatorSet<Ctx>,
        selector: impl ProposerSelector<Ctx> + 'static,
        policy: Policy,
        network_id: Vec<u8>,
        max_transactions_per_ballot: usize,
        genesis_height: Height,
    ) -> Self {
        let genesis_proposer = validators
            .sorted_addresses()
            .next()
            .cloned()
            .expect("cannot bootstrap IsaacCore with an empty validator set");

        let latest_block = Block::new(
            genesis_height,
            isaac_types::Hash::ZERO,
            0,
            0,
            genesis_proposer,
            "genesis".to_string(),
            Vec::new(),
        );

        Self {
            validators: RwLock::new(validators),
            selector: Box::new(selector),
            policy,
            network_id,
            max_transactions_per_ballot,
            state: RwLock::new(ConsensusState {
                latest_block,
                latest_voting_basis: None,
                running_rounds: BTreeMap::new(),
            }),
            tally: RwLock::new(VotingTally::new()),
            latest_req_sync_height: RwLock::new(None),
            node_state: RwLock::new(NodeState::Consensus),
        }
    }

    pub fn validators(&self) -> ValidatorSet<Ctx> {
        self.validators.read().unwrap().clone()
    }

    pub fn set_validators(&self, validators: ValidatorSet<Ctx>) {
        *self.validators.write().unwrap() = validators;
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn network_id(&self) -> &[u8] {
        &self.network_id
    }

    pub fn max_transactions_per_ballot(&self) -> usize {
        self.max_transactions_per_ballot
    }

    pub fn latest_block(&self) -> Block<Ctx> {
        self.state.read().unwrap().latest_block.clone()
    }

    pub fn latest_voting_basis(&self) -> Option<VotingBasis> {
        self.state.read().unwrap().latest_voting_basis
    }

    pub fn node_state(&self) -> NodeState {
        *self.node_state.read().unwrap()
    }

    /// §4.5: deterministic proposer selection over the sorted validator set.
    pub fn select_proposer(&self, height: Height, round: RoundNumber) -> Ctx::Address {
        let validators = self.validators.read().unwrap();
        self.selector.select_proposer(height, round, &validators)
    }

    /// §4.5: whether `basis` is an acceptable basis to act on right now.
    pub fn is_valid_basis(&self, basis: &VotingBasis) -> bool {
        let state = self.state.read().unwrap();

        if basis.height < state.latest_block.height {
            return false;
        }
        if basis.height > state.latest_block.height {
            return true;
        }

        match &state.latest_voting_basis {
            None => basis.round == RoundNumber::INITIAL,
            Some(prev) => basis.prev_block_hash == state.latest_block.hash && basis.round > prev.round,
        }
    }

    /// Records that the local node has acted on (proposed, or begun voting
    /// in) `basis`. Called by the state manager on entering a round so that
    /// subsequent `is_valid_basis` checks see the round actually in play,
    /// not just the last *decided* one.
    pub fn record_acted_basis(&self, basis: VotingBasis) {
        self.state.write().unwrap().latest_voting_basis = Some(basis);
    }

    /// §4.5: non-creating lookup of whether `ballot`'s `(source, state)`
    /// pair has already been recorded under its declared proposer.
    pub fn is_voted(&self, ballot: &Ballot<Ctx>) -> bool {
        let state = self.state.read().unwrap();
        state
            .running_rounds
            .get(&ballot.basis.key())
            .and_then(|round| round.vote_entry_if_exists(&ballot.proposer))
            .is_some_and(|rv| rv.is_voted(&ballot.source, ballot.state))
    }

    /// §4.5 `vote`: creates the `RunningRound` (electing its proposer via
    /// the selector) if this is the first ballot seen for `ballot.basis`.
    pub fn vote(&self, ballot: &Ballot<Ctx>) -> VoteOutcome<Ctx> {
        let validators = self.validators.read().unwrap();
        let validator_count = validators.len();
        let mut state = self.state.write().unwrap();

        let key = ballot.basis.key();
        if !state.running_rounds.contains_key(&key) {
            let elected = self
                .selector
                .select_proposer(ballot.basis.height, ballot.basis.round, &validators);
            let init_tx_hashes = ballot.tx_hashes.clone();
            state
                .running_rounds
                .insert(key, RunningRound::new(ballot.basis, elected, init_tx_hashes));
        }

        let running = state.running_rounds.get_mut(&key).expect("just inserted above");
        Self::record_into(running, ballot, self.policy, validator_count)
    }

    /// §4.5 `vote_if_running_round_exists`: the non-creating variant used
    /// for self-issued SIGN/ACCEPT rebroadcasts, where the running round is
    /// always expected to already exist.
    pub fn vote_if_running_round_exists(&self, ballot: &Ballot<Ctx>) -> Option<VoteOutcome<Ctx>> {
        let validator_count = self.validators.read().unwrap().len();
        let mut state = self.state.write().unwrap();
        let running = state.running_rounds.get_mut(&ballot.basis.key())?;
        Some(Self::record_into(running, ballot, self.policy, validator_count))
    }

    fn record_into(
        running: &mut RunningRound<Ctx>,
        ballot: &Ballot<Ctx>,
        policy: Policy,
        validator_count: usize,
    ) -> VoteOutcome<Ctx> {
        let proposer_mismatch = !running.is_elected_proposer(&ballot.proposer);
        let round_vote = running.vote_entry(ballot.proposer.clone(), &ballot.tx_hashes);
        let outcome = round_vote.record(ballot.source.clone(), ballot.state, ballot.vote, ballot.hash());
        let decision = round_vote.can_decide(ballot.state, policy, validator_count);

        VoteOutcome::new(matches!(outcome, isaac_tally::RecordOutcome::New), proposer_mismatch, decision)
    }

    /// §4.4: feeds an ACCEPT-state ballot's claim into the cross-round
    /// voting tally. A no-op for ballots in any other state.
    pub fn record_tally(&self, ballot: &Ballot<Ctx>) {
        self.tally
            .write()
            .unwrap()
            .record(ballot.source.clone(), ballot.state, ballot.basis.height, ballot.basis.round);
    }

    /// §4.4 `get_sync_info`.
    pub fn get_sync_info(&self, ballot: &Ballot<Ctx>) -> Result<(Height, Vec<Ctx::Address>), SyncError> {
        let threshold = self.policy.threshold(self.validators.read().unwrap().len());
        self.tally.write().unwrap().get_sync_info(
            ballot.source.clone(),
            ballot.basis.height,
            ballot.basis.round,
            threshold,
        )
    }

    /// §4.5 `finalize`: assembles the block from the elected proposer's
    /// transaction set, resolving each hash via `tx_pool`, persists it
    /// through `block_store`, and updates `latest_block`. Only ever called
    /// after an ACCEPT/YES threshold is reached.
    pub async fn finalize(
        &self,
        basis: &VotingBasis,
        tx_pool: &(dyn TxPool<Ctx> + Sync),
        block_store: &(dyn BlockStore<Ctx> + Sync),
        confirmed_at: impl Into<String>,
    ) -> Result<Block<Ctx>, CoreError<Ctx>> {
        let (proposer, tx_hashes, prev_hash, prev_total_txs, prev_total_ops) = {
            let state = self.state.read().unwrap();
            let running = state
                .running_rounds
                .get(&basis.key())
                .ok_or(CoreError::NotFound)?;
            (
                running.elected_proposer().clone(),
                running.elected_tx_hashes().to_vec(),
                state.latest_block.hash,
                state.latest_block.total_txs,
                state.latest_block.total_ops,
            )
        };

        let mut resolved = Vec::with_capacity(tx_hashes.len());
        for hash in &tx_hashes {
            if tx_pool.resolve(hash).await.is_some() {
                resolved.push(*hash);
            }
        }

        // §3: total_txs/total_ops are cumulative, derived from the latest
        // confirmed block, not reset to this round's own count (an empty
        // block must leave them unchanged, per §8 scenario 6).
        let block = Block::new(
            basis.height.increment(),
            prev_hash,
            prev_total_txs + resolved.len() as u64,
            prev_total_ops,
            proposer,
            confirmed_at.into(),
            resolved.clone(),
        );

        block_store
            .save(&block)
            .await
            .map_err(CoreError::StorageFatal)?;
        tx_pool.remove(&resolved).await;

        let mut state = self.state.write().unwrap();
        state.latest_block = block.clone();
        state.latest_voting_basis = None;

        Ok(block)
    }

    /// §4.5 `close_consensus`. Must be called with a concrete outcome; a
    /// `NOT-YET` vote is a programming error, not a valid consensus result.
    pub fn close_consensus(
        &self,
        proposer: &Ctx::Address,
        basis: &VotingBasis,
        outcome_vote: VoteValue,
    ) -> Result<(), CoreError<Ctx>> {
        if outcome_vote == VoteValue::NotYet {
            return Err(CoreError::NotYetIsNotAnOutcome);
        }

        let mut state = self.state.write().unwrap();
        match outcome_vote {
            VoteValue::Yes => {
                state.running_rounds.retain(|key, _| key.height > basis.height);
            }
            VoteValue::No => {
                if let Some(running) = state.running_rounds.get_mut(&basis.key()) {
                    running.remove_proposer_slice(proposer);
                }
            }
            VoteValue::Exp => {
                state.running_rounds.remove(&basis.key());
            }
            VoteValue::NotYet => unreachable!("checked above"),
        }

        Ok(())
    }

    /// §4.5 `start_sync`: hands off to the external syncer if `height` is
    /// past the last height we already requested a sync target for.
    pub async fn start_sync(
        &self,
        height: Height,
        sources: Vec<Ctx::Address>,
        syncer: &(dyn Syncer<Ctx> + Sync),
    ) -> bool {
        {
            let mut latest_req = self.latest_req_sync_height.write().unwrap();
            if latest_req.is_some_and(|requested| height <= requested) {
                return false;
            }
            *latest_req = Some(height);
        }

        *self.node_state.write().unwrap() = NodeState::Sync;
        syncer.set_sync_target(height, sources).await;
        true
    }

    /// Called once a sync completes up to `height`, returning the node to
    /// CONSENSUS and pruning stale tally entries below it.
    pub fn finish_sync(&self, height: Height) {
        self.tally.write().unwrap().prune_below(height);
        *self.node_state.write().unwrap() = NodeState::Consensus;
    }
}
