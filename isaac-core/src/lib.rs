//! ISAAC Core: the sole owner of the running-rounds table, the latest
//! confirmed block, and the cross-round voting tally (§4.5), plus the
//! ballot dispatcher pipeline that feeds it from inbound network messages
//! (§4.7).

pub mod collaborators;
pub mod dispatch;
mod core;
mod error;
mod selector;

pub use collaborators::{BlockStore, Broadcaster, ConnectionManager, Syncer, TxPool};
pub use core::{IsaacCore, VoteOutcome};
pub use dispatch::{Checker, DispatchError, Effect, Outcome, Stage};
pub use error::CoreError;
pub use isaac_tally::{Decision, SyncError, ThresholdPolicy};
pub use selector::{DeterministicSelector, ProposerSelector};
