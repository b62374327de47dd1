//! Ballot-construction helpers for integration tests, generalizing
//! `test::vote`'s `Vote::signed` to ISAAC's proposer/source double-signature
//! scheme.

use isaac_types::{Ballot, BallotState, Hash, ProposerTransaction, VoteValue, VotingBasis};

use crate::signing::{PrivateKey, TestContext};

pub const NETWORK_ID: &[u8] = b"isaac-test-network";

/// Builds and signs the INIT ballot that opens a round.
pub fn propose(
    proposer_sk: &PrivateKey,
    basis: VotingBasis,
    tx_hashes: Vec<Hash>,
) -> Ballot<TestContext> {
    Ballot::new_proposed(
        &proposer_sk.public_key(),
        proposer_sk,
        basis,
        tx_hashes,
        ProposerTransaction::empty(),
        NETWORK_ID,
    )
}

/// Advances `ballot` to `new_state`/`new_vote`, re-signed by `voter_sk`.
pub fn advance(
    ballot: &Ballot<TestContext>,
    voter_sk: &PrivateKey,
    new_state: BallotState,
    new_vote: VoteValue,
) -> Ballot<TestContext> {
    ballot.advance(&voter_sk.public_key(), voter_sk, new_state, new_vote, NETWORK_ID)
}
