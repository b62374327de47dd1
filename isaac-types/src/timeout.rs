use core::fmt;
use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::BallotState;

/// The phase a timeout is scoped to. Distinct from [`BallotState`] because a
/// timeout can also be armed for the `AllConfirm` pseudo-phase (which has no
/// ballot state of its own, but still needs a duration to recompute the
/// block-time buffer against).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeoutStep {
    Init,
    Sign,
    Accept,
}

impl TimeoutStep {
    pub fn next(&self) -> TimeoutStep {
        match self {
            TimeoutStep::Init => TimeoutStep::Sign,
            TimeoutStep::Sign => TimeoutStep::Accept,
            TimeoutStep::Accept => TimeoutStep::Init,
        }
    }
}

impl From<BallotState> for TimeoutStep {
    fn from(state: BallotState) -> Self {
        match state {
            BallotState::Init => TimeoutStep::Init,
            BallotState::Sign => TimeoutStep::Sign,
            BallotState::Accept => TimeoutStep::Accept,
        }
    }
}

impl fmt::Display for TimeoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeoutStep::Init => write!(f, "init"),
            TimeoutStep::Sign => write!(f, "sign"),
            TimeoutStep::Accept => write!(f, "accept"),
        }
    }
}

/// A concrete timeout: which step it is scoped to, and how long to wait.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Timeout {
    pub step: TimeoutStep,
    pub duration: Duration,
}

impl Timeout {
    pub fn new(step: TimeoutStep, duration: Duration) -> Self {
        Self { step, duration }
    }
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timeout({}, {:?})", self.step, self.duration)
    }
}
