//! Vote aggregation: per-round tallying, running rounds, the threshold
//! policy, and the cross-round sync-detecting voting tally.

mod round_vote;
mod running_round;
#[cfg(test)]
mod test_support;
mod threshold;
mod tally;

pub use round_vote::{Decision, RecordOutcome, RoundVote, VoteRecord};
pub use running_round::RunningRound;
pub use tally::{SyncError, VotingTally};
pub use threshold::ThresholdPolicy;
