use core::fmt;

use serde::{Deserialize, Serialize};

/// The phase of a ballot: INIT, SIGN or ACCEPT. `ALL-CONFIRM` is not a
/// ballot state — it is a meta-phase of the [`Phase`] driven by the state
/// manager once an ACCEPT ballot reaches consensus.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BallotState {
    Init,
    Sign,
    Accept,
}

impl BallotState {
    /// The ballot state a voter moves a ballot to after acting on it.
    pub fn next(&self) -> Option<BallotState> {
        match self {
            BallotState::Init => Some(BallotState::Sign),
            BallotState::Sign => Some(BallotState::Accept),
            BallotState::Accept => None,
        }
    }
}

impl fmt::Display for BallotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BallotState::Init => write!(f, "INIT"),
            BallotState::Sign => write!(f, "SIGN"),
            BallotState::Accept => write!(f, "ACCEPT"),
        }
    }
}

/// The vote value carried by a ballot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VoteValue {
    Yes,
    No,
    Exp,
    /// Only ever used transiently; a well-formed ballot never carries this.
    NotYet,
}

impl fmt::Display for VoteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteValue::Yes => write!(f, "YES"),
            VoteValue::No => write!(f, "NO"),
            VoteValue::Exp => write!(f, "EXP"),
            VoteValue::NotYet => write!(f, "NOT-YET"),
        }
    }
}

/// The phase of the per-height/round state manager. Unlike [`BallotState`],
/// this includes the terminal `AllConfirm` phase.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    Init,
    Sign,
    Accept,
    AllConfirm,
}

impl Phase {
    pub fn next(&self) -> Phase {
        match self {
            Phase::Init => Phase::Sign,
            Phase::Sign => Phase::Accept,
            Phase::Accept => Phase::AllConfirm,
            Phase::AllConfirm => Phase::Init,
        }
    }

    /// The ballot state a phase corresponds to, if any.
    pub fn ballot_state(&self) -> Option<BallotState> {
        match self {
            Phase::Init => Some(BallotState::Init),
            Phase::Sign => Some(BallotState::Sign),
            Phase::Accept => Some(BallotState::Accept),
            Phase::AllConfirm => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Init => write!(f, "INIT"),
            Phase::Sign => write!(f, "SIGN"),
            Phase::Accept => write!(f, "ACCEPT"),
            Phase::AllConfirm => write!(f, "ALL-CONFIRM"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ballot_state_advances_init_sign_accept() {
        assert_eq!(BallotState::Init.next(), Some(BallotState::Sign));
        assert_eq!(BallotState::Sign.next(), Some(BallotState::Accept));
        assert_eq!(BallotState::Accept.next(), None);
    }

    #[test]
    fn phase_cycles_through_all_confirm() {
        assert_eq!(Phase::Init.next(), Phase::Sign);
        assert_eq!(Phase::Sign.next(), Phase::Accept);
        assert_eq!(Phase::Accept.next(), Phase::AllConfirm);
        assert_eq!(Phase::AllConfirm.next(), Phase::Init);
    }
}
