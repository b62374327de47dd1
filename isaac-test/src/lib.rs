//! Test fixtures shared across the workspace: a real Ed25519-backed
//! `Context`, deterministic validator-set generation, ballot-construction
//! helpers, and in-memory collaborator implementations.
//!
//! Grounded on `test/src/{signing,validator_set,vote,client,env}.rs`,
//! generalized from malachite's `Round`/`Value`/`Proposal` fixtures to
//! ISAAC's `VotingBasis`/`Ballot`/`Block`.

mod ballots;
mod collaborators;
mod signing;
mod validator_set;

pub use ballots::{advance, propose, NETWORK_ID};
pub use collaborators::{
    FailingBlockStore, FixedConnectionManager, InMemoryBlockStore, InMemoryBroadcaster, InMemoryTxPool,
    RecordingSyncer,
};
pub use signing::{Address, PrivateKey, PublicKey, Signature, TestContext};
pub use validator_set::{make_validators, validator_set};
