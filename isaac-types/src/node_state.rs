use core::fmt;

/// Whether the local node currently believes it is caught up with the
/// network, or has detected it has fallen behind and must catch up.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeState {
    Consensus,
    Sync,
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeState::Consensus => write!(f, "CONSENSUS"),
            NodeState::Sync => write!(f, "SYNC"),
        }
    }
}
