use isaac_types::{BallotState, VoteValue};

/// What the ballot state machine asks its caller (the dispatcher) to do
/// after a transition.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Output {
    /// Synthesize a ballot at `next_state` carrying `vote`, re-signed by the
    /// local key, and broadcast it.
    BroadcastBallot { next_state: BallotState, vote: VoteValue },

    /// ACCEPT/YES reached threshold: assemble and persist the block.
    Finalize,

    /// The round closed without a block (ACCEPT/NO or ACCEPT/EXP).
    CloseWithoutStore,
}
