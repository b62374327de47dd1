use thiserror::Error;

/// Errors surfaced by `isaac-types` operations. Per the spec's error model
/// (§7), most of these are meant to be logged and absorbed by the caller
/// rather than propagated as fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BallotError {
    #[error("proposer signature does not verify")]
    InvalidProposerSignature,

    #[error("source signature does not verify")]
    InvalidSourceSignature,

    #[error("vote is NOT-YET, which is never valid on a signed ballot")]
    NotYetVote,

    #[error("ballot carries {carried} transactions, exceeding the cap of {max}")]
    TooManyTransactions { carried: usize, max: usize },

    #[error("proposer {0:?} is not a known validator")]
    UnknownProposer(String),

    #[error("source {0:?} is not a known validator")]
    UnknownSource(String),
}
