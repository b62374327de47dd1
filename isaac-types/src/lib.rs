//! Core value types shared across the consensus engine: the voting basis,
//! ballots, blocks, validator sets, and the pluggable signing-scheme
//! abstraction they are generic over.

mod ballot;
mod basis;
mod block;
mod crypto;
pub mod error;
mod hash;
mod height;
mod node_state;
mod proposer_tx;
mod state;
#[cfg(test)]
mod test_support;
mod timeout;
mod validator;

pub use ballot::Ballot;
pub use basis::{BasisKey, VotingBasis};
pub use block::Block;
pub use crypto::{Address, Context, PublicKey, Signature};
pub use error::BallotError;
pub use hash::Hash;
pub use height::{Height, RoundNumber};
pub use node_state::NodeState;
pub use proposer_tx::ProposerTransaction;
pub use state::{BallotState, Phase, VoteValue};
pub use timeout::{Timeout, TimeoutStep};
pub use validator::{Validator, ValidatorSet, VotingPower};
