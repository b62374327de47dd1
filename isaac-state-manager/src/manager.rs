//! The State Manager (§4.6): a single cooperative task that owns one timer
//! and one phase variable, driving a single active round through
//! INIT → SIGN → ACCEPT → ALL-CONFIRM and back. Grounded on `driver::Driver`'s
//! single-task run loop and the teacher's `handle::timeout`/`step_timeout`
//! tracing idiom, generalized from malachite's gossip-driven event loop to
//! ISAAC's timer-plus-inbound-channel design (§5 "Scheduling model").

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, Sleep};
use tracing::{debug, info, warn};

use isaac_config::{Config, TimeoutConfig};
use isaac_core::dispatch::{dispatch, Checker, Effect, Outcome};
use isaac_core::{BlockStore, Broadcaster, IsaacCore, Syncer, TxPool};
use isaac_round::{Input, Output as RoundOutput, RoundState};
use isaac_types::{
    Ballot, BallotState, Context, Hash, Phase, ProposerTransaction, RoundNumber, VoteValue, VotingBasis,
};

use crate::block_time::BlockTimeTracker;
use crate::error::Error;
use crate::handle::StateManagerHandle;

/// Backpressure bound on the inbound ballot channel; a node that falls this
/// far behind is better served by `Syncer` than by an unbounded queue.
const INBOUND_CHANNEL_CAPACITY: usize = 256;

type TxValidator = dyn Fn(&[Hash]) -> bool + Send + Sync;

/// The single-threaded cooperative driver of §4.6. Not `Clone`: there is
/// exactly one state manager per node, and callers interact with it only
/// through the [`StateManagerHandle`] returned by [`StateManager::new`].
pub struct StateManager<Ctx: Context> {
    core: Arc<IsaacCore<Ctx>>,
    broadcaster: Arc<dyn Broadcaster<Ctx>>,
    block_store: Arc<dyn BlockStore<Ctx>>,
    tx_pool: Arc<dyn TxPool<Ctx>>,
    syncer: Arc<dyn Syncer<Ctx>>,
    tx_validator: Arc<TxValidator>,

    public_key: Ctx::PublicKey,
    private_key: Ctx::PrivateKey,
    network_id: Vec<u8>,
    timeouts: TimeoutConfig,
    max_transactions_per_ballot: usize,

    /// The round attempt at the height the node is currently working, reset
    /// to [`RoundNumber::INITIAL`] whenever a new height is confirmed.
    round: RoundNumber,
    /// The proposer elected for `(latest.height + 1, round)`, recomputed on
    /// every entry into INIT.
    proposer: Ctx::Address,
    round_state: RoundState<Ctx>,
    /// The last ballot this node broadcast or received for the active round;
    /// the base a timeout-driven EXP ballot is re-signed from so that the
    /// real proposer's signature, not a forged one, is carried forward.
    base_ballot: Option<Ballot<Ctx>>,
    block_time: BlockTimeTracker,
    round_started_at: Instant,

    timer: Pin<Box<Sleep>>,
    inbound: mpsc::Receiver<Ballot<Ctx>>,
    phase_tx: watch::Sender<Phase>,
    confirmed_tx: watch::Sender<Option<isaac_types::Block<Ctx>>>,
    shutdown: watch::Receiver<bool>,
}

impl<Ctx: Context> StateManager<Ctx> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        core: Arc<IsaacCore<Ctx>>,
        broadcaster: Arc<dyn Broadcaster<Ctx>>,
        block_store: Arc<dyn BlockStore<Ctx>>,
        tx_pool: Arc<dyn TxPool<Ctx>>,
        syncer: Arc<dyn Syncer<Ctx>>,
        tx_validator: Arc<TxValidator>,
        public_key: Ctx::PublicKey,
        private_key: Ctx::PrivateKey,
        config: &Config,
    ) -> (Self, StateManagerHandle<Ctx>) {
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CHANNEL_CAPACITY);
        let (phase_tx, phase_rx) = watch::channel(Phase::Init);
        let (confirmed_tx, confirmed_rx) = watch::channel(None);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let round = RoundNumber::INITIAL;
        let latest = core.latest_block();
        let proposer = core.select_proposer(latest.height.increment(), round);
        let basis = VotingBasis::new(
            latest.height.increment(),
            round,
            latest.hash,
            latest.total_txs,
            latest.total_ops,
        );

        let manager = Self {
            core,
            broadcaster,
            block_store,
            tx_pool,
            syncer,
            tx_validator,
            public_key,
            private_key,
            network_id: config.network_id_bytes(),
            timeouts: config.timeouts,
            max_transactions_per_ballot: config.max_transactions_per_ballot,
            round,
            proposer,
            round_state: RoundState::new(basis),
            base_ballot: None,
            block_time: BlockTimeTracker::new(config.block_time, config.block_time_delta),
            round_started_at: Instant::now(),
            timer: Box::pin(tokio::time::sleep(Duration::ZERO)),
            inbound: inbound_rx,
            phase_tx,
            confirmed_tx,
            shutdown: shutdown_rx,
        };

        let handle = StateManagerHandle {
            inbound: inbound_tx,
            phase: phase_rx,
            confirmed: confirmed_rx,
            shutdown: shutdown_tx,
        };

        (manager, handle)
    }

    /// Runs the cooperative loop until `stop()` is called on the handle (or
    /// every handle is dropped) or a `StorageFatal` error occurs, per §8
    /// "ACCEPT-YES finalized but block store returns error: propagate as
    /// fatal; node must restart."
    pub async fn run(mut self) -> Result<(), Error<Ctx>> {
        self.transit(Phase::Init).await?;

        loop {
            tokio::select! {
                changed = self.shutdown.changed() => {
                    match changed {
                        Ok(()) if *self.shutdown.borrow() => {
                            info!("state manager stopping");
                            return Ok(());
                        }
                        Ok(()) => continue,
                        Err(_) => {
                            info!("state manager stopping: handle dropped");
                            return Ok(());
                        }
                    }
                }
                () = &mut self.timer => {
                    self.on_timeout().await?;
                }
                maybe_ballot = self.inbound.recv() => {
                    match maybe_ballot {
                        Some(ballot) => self.on_ballot(ballot).await?,
                        None => return Err(Error::InboundClosed),
                    }
                }
            }
        }
    }

    /// Feeds one inbound ballot through the dispatcher pipeline and carries
    /// out whatever `Effect`s it produces (§4.7).
    async fn on_ballot(&mut self, ballot: Ballot<Ctx>) -> Result<(), Error<Ctx>> {
        // A voter cannot know the proposer's chosen transaction count ahead
        // of time, so the round_state this node waits with necessarily
        // guesses `total_txs`/`total_ops` at zero (§4.6 `begin_new_round`).
        // The first INIT actually seen for this (height, round, prev_hash)
        // is authoritative: adopt its basis verbatim before dispatching so
        // the dispatcher's basis-equality gate does not reject it outright.
        if self.round_state.phase == Phase::Init
            && self.round_state.local_vote.is_none()
            && ballot.state == BallotState::Init
            && ballot.basis.height == self.round_state.basis.height
            && ballot.basis.round == self.round_state.basis.round
            && ballot.basis.prev_block_hash == self.round_state.basis.prev_block_hash
        {
            self.round_state.basis = ballot.basis;
        }

        let core = Arc::clone(&self.core);
        let tx_validator = Arc::clone(&self.tx_validator);
        let validator_fn = move |hashes: &[Hash]| (tx_validator)(hashes);

        let mut checker = Checker::new(core.as_ref(), ballot, &validator_fn);
        let outcome = dispatch(&mut checker, &mut self.round_state);

        let effects = match outcome {
            Outcome::Continue => std::mem::take(&mut checker.effects),
            Outcome::StopOk(reason) => {
                debug!(reason, "ballot dropped by the dispatcher");
                return Ok(());
            }
            Outcome::StopErr(err) => {
                warn!(error = %err, "ballot rejected by the dispatcher");
                return Ok(());
            }
        };
        drop(checker);

        for effect in effects {
            self.apply_effect(effect).await?;
        }
        Ok(())
    }

    async fn apply_effect(&mut self, effect: Effect<Ctx>) -> Result<(), Error<Ctx>> {
        match effect {
            Effect::BroadcastAdvance { base, to_state, vote } => {
                let ballot = base.advance(&self.public_key, &self.private_key, to_state, vote, &self.network_id);
                self.base_ballot = Some(ballot.clone());
                self.broadcaster.broadcast(ballot).await;
                Ok(())
            }
            Effect::RequestTransit(phase) => self.transit(phase).await,
            Effect::Finalize { basis } => self.finalize(basis).await,
            Effect::CloseWithoutStore => {
                debug!("round closed without producing a block");
                Ok(())
            }
            Effect::CloseConsensus { proposer, basis, vote } => {
                if let Err(err) = self.core.close_consensus(&proposer, &basis, vote) {
                    warn!(error = %err, "close_consensus rejected a concrete vote outcome");
                }
                Ok(())
            }
            Effect::StartSync { height, sources } => {
                self.core.start_sync(height, sources, self.syncer.as_ref()).await;
                Ok(())
            }
        }
    }

    async fn finalize(&mut self, basis: VotingBasis) -> Result<(), Error<Ctx>> {
        let confirmed_at = now_rfc3339();
        match self
            .core
            .finalize(&basis, self.tx_pool.as_ref(), self.block_store.as_ref(), confirmed_at)
            .await
        {
            Ok(block) => {
                info!(height = %block.height, total_txs = block.total_txs, "block confirmed");
                let _ = self.confirmed_tx.send(Some(block));
                Ok(())
            }
            Err(err) => Err(Error::from_core_finalize(err)),
        }
    }

    /// The timer-expiry half of §4.6's loop: synthesizes and broadcasts an
    /// EXP ballot for the next ballot state, or closes the round without a
    /// block if ACCEPT itself timed out.
    async fn on_timeout(&mut self) -> Result<(), Error<Ctx>> {
        warn!(phase = %self.round_state.phase, round = self.round.as_u64(), "ballot phase timed out");

        let transition = isaac_round::apply(self.round_state.clone(), Input::TimeoutExpired);
        self.round_state = transition.next_state;

        match transition.output {
            Some(RoundOutput::BroadcastBallot { next_state, vote }) => {
                let ballot = self.synthesize_exp_ballot(next_state, vote);
                self.base_ballot = Some(ballot.clone());
                self.broadcaster.broadcast(ballot).await;
                self.transit(self.round_state.phase).await
            }
            Some(RoundOutput::CloseWithoutStore) => {
                let vote = self.round_state.local_vote.unwrap_or(VoteValue::No);
                let basis = self.round_state.basis;
                if let Err(err) = self.core.close_consensus(&self.proposer, &basis, vote) {
                    warn!(error = %err, "close_consensus rejected a timeout-driven vote outcome");
                }
                self.transit(self.round_state.phase).await
            }
            // `TimeoutExpired` never drives a Finalize decision in the
            // per-round state machine; only ThresholdReached(Yes) does.
            Some(RoundOutput::Finalize) | None => Ok(()),
        }
    }

    /// Signs the EXP ballot that a timeout broadcasts, re-signing the last
    /// known base ballot when one exists (so the real proposer's signature
    /// survives), or falling back to a self-signed ballot for a round that
    /// timed out before any base ballot was ever seen.
    fn synthesize_exp_ballot(&self, to_state: BallotState, vote: VoteValue) -> Ballot<Ctx> {
        let basis = self.round_state.basis;
        match &self.base_ballot {
            Some(base) => base.advance(&self.public_key, &self.private_key, to_state, vote, &self.network_id),
            None => Ballot::new_self_signed(
                &self.public_key,
                &self.private_key,
                basis,
                to_state,
                vote,
                Vec::new(),
                ProposerTransaction::empty(),
                &self.network_id,
            ),
        }
    }

    /// §4.6 "on external transit(Q)": performs the side effect of entering
    /// `phase` and publishes it to subscribers.
    async fn transit(&mut self, phase: Phase) -> Result<(), Error<Ctx>> {
        let _ = self.phase_tx.send(phase);

        match phase {
            Phase::Init => self.enter_init().await,
            Phase::Sign => {
                self.arm_timer(Phase::Sign);
                Ok(())
            }
            Phase::Accept => {
                self.arm_timer(Phase::Accept);
                Ok(())
            }
            Phase::AllConfirm => {
                self.recompute_block_time();
                self.begin_new_round();
                self.enter_init().await
            }
        }
    }

    /// §4.6 "propose-or-wait".
    async fn enter_init(&mut self) -> Result<(), Error<Ctx>> {
        let latest = self.core.latest_block();
        let proposer = self.core.select_proposer(latest.height.increment(), self.round);
        self.proposer = proposer.clone();

        let local_address = Ctx::derive_address(&self.public_key);
        let until_now = self.round_started_at.elapsed();

        if proposer == local_address {
            let buffer = self.block_time.buffer(until_now);
            tokio::time::sleep(buffer).await;
            self.propose_new_ballot().await
        } else {
            let wait = self.block_time.buffer(until_now) + self.timeouts.duration_for_round(Phase::Init, self.round);
            self.arm_timer_for(wait);
            Ok(())
        }
    }

    /// Builds, signs, and self-feeds a new INIT ballot, pulling candidate
    /// transactions from the external pool (§6 "Empty block after timeout on
    /// proposer role": an empty pool is a valid, well-formed proposal).
    async fn propose_new_ballot(&mut self) -> Result<(), Error<Ctx>> {
        let latest = self.core.latest_block();
        let tx_hashes = self.tx_pool.pending(self.max_transactions_per_ballot).await;
        let basis = VotingBasis::new(
            latest.height.increment(),
            self.round,
            latest.hash,
            latest.total_txs + tx_hashes.len() as u64,
            latest.total_ops,
        );

        let ballot = Ballot::new_proposed(
            &self.public_key,
            &self.private_key,
            basis,
            tx_hashes,
            ProposerTransaction::empty(),
            &self.network_id,
        );

        info!(%basis, "proposing new ballot");
        self.round_state = RoundState::new(basis);
        self.broadcaster.broadcast(ballot.clone()).await;
        self.on_ballot(ballot).await
    }

    fn arm_timer(&mut self, phase: Phase) {
        self.arm_timer_for(self.timeouts.duration_for_round(phase, self.round));
    }

    fn arm_timer_for(&mut self, duration: Duration) {
        self.timer = Box::pin(tokio::time::sleep(duration));
    }

    fn recompute_block_time(&mut self) {
        self.block_time.record(self.round_started_at.elapsed());
    }

    /// §4.6 "request re-INIT": picks the next round number per whether the
    /// round just closed by finalizing a new height (`finalize` clears
    /// `latest_voting_basis`, so the next attempt starts back at round 0) or
    /// by closing without one (the same height is retried at `round + 1`).
    fn begin_new_round(&mut self) {
        self.round = match self.core.latest_voting_basis() {
            None => RoundNumber::INITIAL,
            Some(_) => self.round.increment(),
        };
        self.round_started_at = Instant::now();
        self.base_ballot = None;

        let latest = self.core.latest_block();
        let basis = VotingBasis::new(
            latest.height.increment(),
            self.round,
            latest.hash,
            latest.total_txs,
            latest.total_ops,
        );
        self.round_state = RoundState::new(basis);
    }
}

fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}
