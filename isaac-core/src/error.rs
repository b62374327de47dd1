use isaac_types::{BallotError, Context};

/// Errors surfaced by [`crate::IsaacCore`] and the dispatcher pipeline.
///
/// Per the spec's error model (§7), only [`CoreError::StorageFatal`] is
/// meant to propagate out of the driving loop; every other variant is
/// logged and absorbed by the dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum CoreError<Ctx: Context> {
    #[error("ballot is not well-formed: {0}")]
    Malformed(#[from] BallotError),

    #[error("source {0:?} is not a known validator")]
    Unauthorized(Ctx::Address),

    #[error("basis is stale: {basis_height} < local height {local_height}")]
    Stale {
        basis_height: isaac_types::Height,
        local_height: isaac_types::Height,
    },

    #[error("no running round for the given basis")]
    NotFound,

    #[error("close_consensus called with vote=NOT-YET, which is not a valid outcome")]
    NotYetIsNotAnOutcome,

    #[error("block store refused to persist the finalized block: {0}")]
    StorageFatal(String),
}

impl<Ctx: Context> PartialEq for CoreError<Ctx> {
    fn eq(&self, other: &Self) -> bool {
        use CoreError::*;
        match (self, other) {
            (Malformed(a), Malformed(b)) => a == b,
            (Unauthorized(a), Unauthorized(b)) => a == b,
            (
                Stale { basis_height: a, local_height: b },
                Stale { basis_height: c, local_height: d },
            ) => a == c && b == d,
            (NotFound, NotFound) => true,
            (NotYetIsNotAnOutcome, NotYetIsNotAnOutcome) => true,
            (StorageFatal(a), StorageFatal(b)) => a == b,
            _ => false,
        }
    }
}
