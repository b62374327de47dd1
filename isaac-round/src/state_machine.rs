use isaac_types::{BallotState, Context, Phase, VoteValue};

use crate::input::Input;
use crate::output::Output;
use crate::state::RoundState;
use crate::transition::Transition;

/// Applies `input` to `state`, implementing the per-phase logic of the
/// dispatcher's "state-specific" stage (§4.7 step 7) and the timeout
/// handling of the state manager (§4.6): on timeout, broadcast an EXP
/// ballot for the next phase and advance.
pub fn apply<Ctx: Context>(state: RoundState<Ctx>, input: Input) -> Transition<Ctx> {
    match (state.phase, input) {
        (Phase::Init, Input::ProposalAccepted { proposer_matches, tx_valid }) => {
            let vote = if proposer_matches && tx_valid {
                VoteValue::Yes
            } else {
                VoteValue::No
            };
            let next = state.with_phase(Phase::Sign).with_local_vote(vote);
            Transition::to(next).with_output(Output::BroadcastBallot {
                next_state: BallotState::Sign,
                vote,
            })
        }

        (Phase::Sign, Input::ThresholdReached(vote)) => {
            let next = state.with_phase(Phase::Accept).with_local_vote(vote);
            Transition::to(next).with_output(Output::BroadcastBallot {
                next_state: BallotState::Accept,
                vote,
            })
        }

        (Phase::Accept, Input::ThresholdReached(VoteValue::Yes)) => {
            let next = state.with_phase(Phase::AllConfirm).with_local_vote(VoteValue::Yes);
            Transition::to(next).with_output(Output::Finalize)
        }

        (Phase::Accept, Input::ThresholdReached(vote)) => {
            let next = state.with_phase(Phase::AllConfirm).with_local_vote(vote);
            Transition::to(next).with_output(Output::CloseWithoutStore)
        }

        (phase, Input::TimeoutExpired) => {
            let next_ballot_state = phase.ballot_state().unwrap_or(BallotState::Init).next();
            match next_ballot_state {
                Some(next_state) => {
                    let next = state.with_phase(next_state_phase(next_state)).with_local_vote(VoteValue::Exp);
                    Transition::to(next).with_output(Output::BroadcastBallot {
                        next_state,
                        vote: VoteValue::Exp,
                    })
                }
                // ACCEPT timed out: synthesize the EXP ballot that closes this
                // round and lets the caller move to a new INIT round.
                None => {
                    let next = state.with_phase(Phase::AllConfirm).with_local_vote(VoteValue::Exp);
                    Transition::to(next).with_output(Output::CloseWithoutStore)
                }
            }
        }

        // Any other (phase, input) pairing is a stale or duplicate event
        // (e.g. a threshold notification arriving after the phase already
        // advanced); ignored rather than treated as an error.
        (phase, _) => Transition::to(state.with_phase(phase)),
    }
}

fn next_state_phase(state: BallotState) -> Phase {
    match state {
        BallotState::Init => Phase::Init,
        BallotState::Sign => Phase::Sign,
        BallotState::Accept => Phase::Accept,
    }
}
