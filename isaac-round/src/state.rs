use core::fmt;
use core::marker::PhantomData;

use isaac_types::{Context, Phase, VoteValue, VotingBasis};

/// The state tracked per running round by the ballot state machine: which
/// phase it is in, and the vote decision the local node committed to when it
/// last acted (set when processing the proposal, or overridden to NO by an
/// elected-proposer mismatch or tie-break).
pub struct RoundState<Ctx: Context> {
    pub basis: VotingBasis,
    pub phase: Phase,
    pub local_vote: Option<VoteValue>,
    _ctx: PhantomData<Ctx>,
}

impl<Ctx: Context> RoundState<Ctx> {
    pub fn new(basis: VotingBasis) -> Self {
        Self {
            basis,
            phase: Phase::Init,
            local_vote: None,
            _ctx: PhantomData,
        }
    }

    pub fn with_phase(self, phase: Phase) -> Self {
        Self { phase, ..self }
    }

    pub fn with_local_vote(self, vote: VoteValue) -> Self {
        Self {
            local_vote: Some(vote),
            ..self
        }
    }
}

// Manual impls: deriving would infer a `Ctx: Clone/Debug/...` bound from the
// phantom-like generic parameter even though no field actually stores a
// `Ctx` value directly.
impl<Ctx: Context> Clone for RoundState<Ctx> {
    fn clone(&self) -> Self {
        Self {
            basis: self.basis,
            phase: self.phase,
            local_vote: self.local_vote,
            _ctx: PhantomData,
        }
    }
}

impl<Ctx: Context> fmt::Debug for RoundState<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoundState")
            .field("basis", &self.basis)
            .field("phase", &self.phase)
            .field("local_vote", &self.local_vote)
            .finish()
    }
}

impl<Ctx: Context> PartialEq for RoundState<Ctx> {
    fn eq(&self, other: &Self) -> bool {
        self.basis == other.basis && self.phase == other.phase && self.local_vote == other.local_vote
    }
}

impl<Ctx: Context> Eq for RoundState<Ctx> {}
