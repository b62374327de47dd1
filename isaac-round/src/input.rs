use isaac_types::VoteValue;

/// Input to the per-round ballot state machine. Each variant corresponds to
/// one of the events the dispatcher pipeline (§4.7) can feed a running
/// round, stripped down to the data the state machine itself needs to
/// decide the next phase and what, if anything, to broadcast.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Input {
    /// An INIT ballot for this basis was just accepted into the running
    /// round for the first time. `proposer_matches` is false when the
    /// ballot's declared proposer disagrees with the elected one (§4.3),
    /// which forces the local vote to NO regardless of tx validation.
    ProposalAccepted {
        proposer_matches: bool,
        tx_valid: bool,
    },

    /// `RoundVote::can_decide` reached a decision for the current phase.
    ThresholdReached(VoteValue),

    /// The state manager's timer for the current phase expired with no
    /// decision reached.
    TimeoutExpired,
}
