use isaac_core::CoreError;
use isaac_types::Context;

/// Errors that can stop the state manager's run loop. Per the spec's error
/// model (§7/§8 "ACCEPT-YES finalized but block store returns error"), only
/// the block store's own failure is fatal; every other `CoreError` is either
/// impossible to see here (the dispatcher already absorbed it before this
/// crate gets involved) or is logged and swallowed by [`crate::manager`]
/// rather than surfaced through this type.
#[derive(Debug, thiserror::Error)]
pub enum Error<Ctx: Context> {
    #[error("block store refused to persist a finalized block, node must restart: {0}")]
    StorageFatal(String),

    #[error("state manager's inbound channel closed unexpectedly")]
    InboundClosed,

    #[error(transparent)]
    Core(#[from] CoreError<Ctx>),
}

impl<Ctx: Context> Error<Ctx> {
    /// Narrows a [`CoreError`] down to this crate's error type, per §7: a
    /// `StorageFatal` propagates, everything else is logged by the caller
    /// and treated as a no-op.
    pub fn from_core_finalize(err: CoreError<Ctx>) -> Self {
        match err {
            CoreError::StorageFatal(msg) => Error::StorageFatal(msg),
            other => Error::Core(other),
        }
    }
}
