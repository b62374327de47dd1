use core::fmt;

use serde::{Deserialize, Serialize};

/// A blockchain height.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Height(u64);

impl Height {
    pub const fn new(height: u64) -> Self {
        Self(height)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn increment(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Height {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Height {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// A round number within a height. Unlike `malachite`'s `Round`, ISAAC round
/// numbers have no "nil" variant: the basis always names a concrete round.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct RoundNumber(u64);

impl RoundNumber {
    pub const INITIAL: RoundNumber = RoundNumber(0);

    pub const fn new(round: u64) -> Self {
        Self(round)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn increment(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for RoundNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RoundNumber {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn height_increments() {
        assert_eq!(Height::new(1).increment(), Height::new(2));
    }

    #[test]
    fn round_increments() {
        assert_eq!(RoundNumber::INITIAL.increment(), RoundNumber::new(1));
    }
}
