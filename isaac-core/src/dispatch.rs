//! The ballot dispatcher pipeline (§4.7): converts one inbound ballot into
//! zero or more [`Effect`]s the caller must carry out.
//!
//! Per the REDESIGN FLAG in spec §9 ("pipeline stages as tagged variants,
//! not virtual dispatch"), the pipeline is an explicit `[Stage; N]` array
//! rather than a chain of trait objects; each `Stage` maps to one pure
//! method on [`Checker`]. Stages never perform I/O themselves — broadcast,
//! finalize, and sync hand-off are all deferred [`Effect`]s that the caller
//! (`isaac-state-manager` or a test harness) executes after the pipeline
//! returns, exactly the seam the spec's "Suspension points" (§5) describe.

use isaac_round::{Output as RoundOutput, RoundState};
use isaac_types::{Ballot, BallotError, BallotState, Context, Height, Phase, VoteValue, VotingBasis};

use crate::core::{IsaacCore, VoteOutcome};
use isaac_tally::Decision;

/// Errors surfaced to the caller across the dispatcher boundary. Everything
/// else (stale basis, duplicate ballot, equivocation, proposer mismatch) is
/// absorbed inside the pipeline as a [`Outcome::StopOk`] (§7 "Recovery
/// policy").
#[derive(Debug, thiserror::Error)]
pub enum DispatchError<Ctx: Context> {
    #[error("ballot failed well-formedness checks: {0}")]
    Malformed(#[from] BallotError),

    #[error("source {0:?} is not a known validator")]
    Unauthorized(Ctx::Address),
}

impl<Ctx: Context> PartialEq for DispatchError<Ctx> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Malformed(a), Self::Malformed(b)) => a == b,
            (Self::Unauthorized(a), Self::Unauthorized(b)) => a == b,
            _ => false,
        }
    }
}

/// What a ballot ultimately requires the caller to do. Accumulated onto
/// [`Checker::effects`] as the pipeline runs; never executed by the stages
/// themselves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect<Ctx: Context> {
    /// Re-sign `base` with the local key at `to_state`/`vote` and broadcast
    /// it. The dispatcher cannot sign on its own behalf — it has no private
    /// key — so it hands the unsigned intent back to the caller.
    BroadcastAdvance {
        base: Ballot<Ctx>,
        to_state: BallotState,
        vote: VoteValue,
    },
    /// Ask the state manager to transition to `phase`.
    RequestTransit(Phase),
    /// ACCEPT/YES reached threshold: assemble and persist the block.
    Finalize { basis: VotingBasis },
    /// The round closed without a block (ACCEPT/NO or ACCEPT/EXP).
    CloseWithoutStore,
    /// Evict running-round bookkeeping per the decided outcome (§4.5).
    CloseConsensus {
        proposer: Ctx::Address,
        basis: VotingBasis,
        vote: VoteValue,
    },
    /// The cross-round tally just crossed threshold at a height past ours.
    StartSync {
        height: Height,
        sources: Vec<Ctx::Address>,
    },
}

/// The result of running one [`Stage`].
#[derive(Debug)]
pub enum Outcome<Ctx: Context> {
    /// Proceed to the next stage.
    Continue,
    /// Stop the pipeline successfully; `reason` is logged, never surfaced
    /// as an error (§7 "StopSuccess").
    StopOk(&'static str),
    /// Stop the pipeline with a hard rejection.
    StopErr(DispatchError<Ctx>),
}

/// The seven pipeline stages of §4.7, in the fixed order they run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Stage {
    WellFormed,
    KnownValidator,
    NotAlreadyFinished,
    Vote,
    SameProposer,
    CheckResult,
    StateSpecific,
}

impl Stage {
    pub const PIPELINE: [Stage; 7] = [
        Stage::WellFormed,
        Stage::KnownValidator,
        Stage::NotAlreadyFinished,
        Stage::Vote,
        Stage::SameProposer,
        Stage::CheckResult,
        Stage::StateSpecific,
    ];

    fn run<Ctx: Context>(self, checker: &mut Checker<'_, Ctx>, round_state: &mut RoundState<Ctx>) -> Outcome<Ctx> {
        match self {
            Stage::WellFormed => checker.well_formed(),
            Stage::KnownValidator => checker.known_validator(),
            Stage::NotAlreadyFinished => checker.not_already_finished(),
            Stage::Vote => checker.vote(),
            Stage::SameProposer => checker.same_proposer(),
            Stage::CheckResult => checker.check_result(),
            Stage::StateSpecific => checker.state_specific(round_state),
        }
    }
}

/// Mutable context threaded through the pipeline. Built fresh per inbound
/// ballot; `tx_validator` plugs in the external transaction-validation
/// collaborator the spec leaves opaque (§1).
pub struct Checker<'a, Ctx: Context> {
    pub core: &'a IsaacCore<Ctx>,
    pub ballot: Ballot<Ctx>,
    pub tx_validator: &'a dyn Fn(&[isaac_types::Hash]) -> bool,

    vote_outcome: Option<VoteOutcome<Ctx>>,
    voting_finished: bool,
    finished_vote: Option<VoteValue>,
    pub effects: Vec<Effect<Ctx>>,
}

impl<'a, Ctx: Context> Checker<'a, Ctx> {
    pub fn new(
        core: &'a IsaacCore<Ctx>,
        ballot: Ballot<Ctx>,
        tx_validator: &'a dyn Fn(&[isaac_types::Hash]) -> bool,
    ) -> Self {
        Self {
            core,
            ballot,
            tx_validator,
            vote_outcome: None,
            voting_finished: false,
            finished_vote: None,
            effects: Vec::new(),
        }
    }

    fn well_formed(&mut self) -> Outcome<Ctx> {
        let validators = self.core.validators();
        match self.ballot.is_well_formed(
            self.core.network_id(),
            &validators,
            self.core.max_transactions_per_ballot(),
        ) {
            Ok(()) => Outcome::Continue,
            Err(BallotError::UnknownProposer(_)) | Err(BallotError::UnknownSource(_)) => {
                Outcome::StopErr(DispatchError::Unauthorized(self.ballot.source.clone()))
            }
            Err(other) => Outcome::StopErr(DispatchError::Malformed(other)),
        }
    }

    fn known_validator(&mut self) -> Outcome<Ctx> {
        if self.core.validators().contains(&self.ballot.source) {
            Outcome::Continue
        } else {
            Outcome::StopErr(DispatchError::Unauthorized(self.ballot.source.clone()))
        }
    }

    fn not_already_finished(&mut self) -> Outcome<Ctx> {
        // Only ACCEPT-state ballots are fed to the tally (§4.4); `record_tally`
        // is itself a no-op for INIT/SIGN ballots, so it is safe to call here
        // unconditionally before the height comparison below.
        self.core.record_tally(&self.ballot);

        let local_height = self.core.latest_block().height;

        if self.ballot.basis.height < local_height {
            return Outcome::StopOk("stale: basis height below local height");
        }

        if self.ballot.basis.height > local_height {
            // Only an ACCEPT claim is a meaningful sync signal (§4.4,
            // invariant 5); an INIT/SIGN ballot at a future height must not
            // be counted toward the sync tally.
            if self.ballot.state == BallotState::Accept {
                if let Ok((height, sources)) = self.core.get_sync_info(&self.ballot) {
                    self.effects.push(Effect::StartSync { height, sources });
                }
            }
            return Outcome::StopOk("future height: fed to tally only, no running-round update");
        }

        Outcome::Continue
    }

    fn vote(&mut self) -> Outcome<Ctx> {
        self.vote_outcome = Some(self.core.vote(&self.ballot));
        Outcome::Continue
    }

    fn same_proposer(&mut self) -> Outcome<Ctx> {
        // Proposer-mismatch handling happens in `state_specific`, where the
        // local vote decision is actually synthesized; this stage only
        // exists as a named checkpoint matching §4.7 step 5.
        Outcome::Continue
    }

    fn check_result(&mut self) -> Outcome<Ctx> {
        let decision = self
            .vote_outcome
            .as_ref()
            .expect("Vote stage always runs before CheckResult")
            .decision
            .clone();

        if let Decision::Finished(vote) = decision {
            self.voting_finished = true;
            self.finished_vote = Some(vote);
        }

        Outcome::Continue
    }

    /// Delegates to `isaac_round::apply`, the pure per-round ballot state
    /// machine (§4.6/§4.7 step 7), rather than re-deriving INIT/SIGN/ACCEPT
    /// transition logic here. `round_state` is the single currently-active
    /// round the caller (the state manager) owns; a ballot whose basis does
    /// not match it is evidence about some other round and is not acted on.
    fn state_specific(&mut self, round_state: &mut RoundState<Ctx>) -> Outcome<Ctx> {
        if round_state.basis != self.ballot.basis {
            return Outcome::StopOk("ballot basis does not match the currently active round");
        }

        let outcome = self
            .vote_outcome
            .as_ref()
            .expect("Vote stage always runs before StateSpecific");
        let is_new = outcome.is_new;
        let proposer_mismatch = outcome.proposer_mismatch;

        let input = match self.ballot.state {
            BallotState::Init => {
                if !is_new {
                    return Outcome::StopOk("duplicate INIT ballot");
                }

                // `is_valid_basis` only gates acceptance of a *new* round
                // (§4.5): once accepted, the SIGN/ACCEPT ballots that carry
                // the same basis forward are let through by the round-state
                // match above, not re-checked here.
                if !self.core.is_valid_basis(&self.ballot.basis) {
                    return Outcome::StopOk("basis rejected: stale or out-of-order round");
                }

                self.core.record_acted_basis(self.ballot.basis);
                let tx_valid = (self.tx_validator)(&self.ballot.tx_hashes);

                isaac_round::Input::ProposalAccepted {
                    proposer_matches: !proposer_mismatch,
                    tx_valid,
                }
            }

            BallotState::Sign | BallotState::Accept => {
                if !self.voting_finished {
                    return Outcome::Continue;
                }

                isaac_round::Input::ThresholdReached(
                    self.finished_vote.expect("voting_finished implies a vote"),
                )
            }
        };

        let transition = isaac_round::apply(round_state.clone(), input);
        if let Some(output) = transition.output {
            self.emit(&transition.next_state, output);
        }
        *round_state = transition.next_state;

        Outcome::Continue
    }

    fn emit(&mut self, next_state: &RoundState<Ctx>, output: RoundOutput) {
        match output {
            RoundOutput::BroadcastBallot { next_state: to_state, vote } => {
                self.effects.push(Effect::BroadcastAdvance {
                    base: self.ballot.clone(),
                    to_state,
                    vote,
                });
                self.effects.push(Effect::RequestTransit(next_state.phase));
            }
            RoundOutput::Finalize => {
                self.effects.push(Effect::Finalize { basis: self.ballot.basis });
                self.effects.push(Effect::CloseConsensus {
                    proposer: self.ballot.proposer.clone(),
                    basis: self.ballot.basis,
                    vote: VoteValue::Yes,
                });
                self.effects.push(Effect::RequestTransit(Phase::AllConfirm));
            }
            RoundOutput::CloseWithoutStore => {
                let vote = next_state.local_vote.unwrap_or(VoteValue::No);
                self.effects.push(Effect::CloseWithoutStore);
                self.effects.push(Effect::CloseConsensus {
                    proposer: self.ballot.proposer.clone(),
                    basis: self.ballot.basis,
                    vote,
                });
                self.effects.push(Effect::RequestTransit(Phase::AllConfirm));
            }
        }
    }
}

/// Runs the fixed seven-stage pipeline over `checker` against the caller's
/// currently-active `round_state`, stopping early on the first non-`Continue`
/// outcome.
pub fn dispatch<Ctx: Context>(checker: &mut Checker<'_, Ctx>, round_state: &mut RoundState<Ctx>) -> Outcome<Ctx> {
    for stage in Stage::PIPELINE {
        match stage.run(checker, round_state) {
            Outcome::Continue => continue,
            other => return other,
        }
    }

    Outcome::Continue
}
