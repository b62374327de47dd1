use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::BallotError;
use crate::{BallotState, Context, Hash, ProposerTransaction, ValidatorSet, VotingBasis, VoteValue};

/// The unit of vote. A `Ballot` is immutable once signed: `advance` produces
/// a new, re-signed ballot rather than mutating this one.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Ballot<Ctx: Context> {
    pub basis: VotingBasis,
    pub proposer: Ctx::Address,
    pub source: Ctx::Address,
    pub state: BallotState,
    pub vote: VoteValue,
    pub tx_hashes: Vec<Hash>,
    pub proposer_tx: ProposerTransaction,
    pub sig_proposer: Ctx::Signature,
    pub sig_source: Ctx::Signature,
}

impl<Ctx: Context> Ballot<Ctx> {
    /// Builds the INIT ballot a proposer broadcasts to open a round. Signs
    /// twice with the proposer's own key: once as proposer, once as source.
    pub fn new_proposed(
        proposer_public_key: &Ctx::PublicKey,
        proposer_private_key: &Ctx::PrivateKey,
        basis: VotingBasis,
        tx_hashes: Vec<Hash>,
        proposer_tx: ProposerTransaction,
        network_id: &[u8],
    ) -> Self {
        Self::new_self_signed(
            proposer_public_key,
            proposer_private_key,
            basis,
            BallotState::Init,
            VoteValue::Yes,
            tx_hashes,
            proposer_tx,
            network_id,
        )
    }

    /// Builds a ballot where the same key signs both the proposer and
    /// source slots, at an arbitrary state/vote rather than the fixed
    /// INIT/YES of [`Ballot::new_proposed`]. Used by the state manager to
    /// synthesize the EXP ballot for a round whose real proposer was never
    /// heard from (§4.6 "EXP ballot synthesis"): there is no other
    /// validator's signature to carry forward, so the local node asserts
    /// the timeout under its own address in both slots.
    pub fn new_self_signed(
        public_key: &Ctx::PublicKey,
        private_key: &Ctx::PrivateKey,
        basis: VotingBasis,
        state: BallotState,
        vote: VoteValue,
        tx_hashes: Vec<Hash>,
        proposer_tx: ProposerTransaction,
        network_id: &[u8],
    ) -> Self {
        let address = Ctx::derive_address(public_key);

        let body_hash = canonical_body_hash(&address, &address, &basis, state, vote, &tx_hashes, &proposer_tx);
        let sig = Ctx::sign(private_key, &signing_payload(network_id, &body_hash));

        Self {
            basis,
            proposer: address.clone(),
            source: address,
            state,
            vote,
            tx_hashes,
            proposer_tx,
            sig_proposer: sig.clone(),
            sig_source: sig,
        }
    }

    /// Returns a new ballot with `source` re-signed by `voter_private_key`,
    /// moved to `new_state`/`new_vote`. The proposer signature is carried
    /// over unchanged.
    pub fn advance(
        &self,
        voter_public_key: &Ctx::PublicKey,
        voter_private_key: &Ctx::PrivateKey,
        new_state: BallotState,
        new_vote: VoteValue,
        network_id: &[u8],
    ) -> Self {
        let source = Ctx::derive_address(voter_public_key);
        let body_hash = canonical_body_hash(
            &source,
            &self.proposer,
            &self.basis,
            new_state,
            new_vote,
            &self.tx_hashes,
            &self.proposer_tx,
        );
        let sig_source = Ctx::sign(voter_private_key, &signing_payload(network_id, &body_hash));

        Self {
            basis: self.basis,
            proposer: self.proposer.clone(),
            source,
            state: new_state,
            vote: new_vote,
            tx_hashes: self.tx_hashes.clone(),
            proposer_tx: self.proposer_tx.clone(),
            sig_proposer: self.sig_proposer.clone(),
            sig_source,
        }
    }

    /// Verifies both signatures and the shape invariants from the spec.
    /// Validator-set membership of proposer/source is checked here too,
    /// since both signatures and membership are required for well-formedness.
    pub fn is_well_formed(
        &self,
        network_id: &[u8],
        validators: &ValidatorSet<Ctx>,
        max_transactions_per_ballot: usize,
    ) -> Result<(), BallotError> {
        if self.vote == VoteValue::NotYet {
            return Err(BallotError::NotYetVote);
        }

        if self.tx_hashes.len() > max_transactions_per_ballot {
            return Err(BallotError::TooManyTransactions {
                carried: self.tx_hashes.len(),
                max: max_transactions_per_ballot,
            });
        }

        let proposer_validator = validators
            .get_by_address(&self.proposer)
            .ok_or_else(|| BallotError::UnknownProposer(format!("{:?}", self.proposer)))?;
        let source_validator = validators
            .get_by_address(&self.source)
            .ok_or_else(|| BallotError::UnknownSource(format!("{:?}", self.source)))?;

        let payload = signing_payload(network_id, &self.hash());

        if !Ctx::verify(&proposer_validator.public_key, &payload, &self.sig_proposer) {
            return Err(BallotError::InvalidProposerSignature);
        }
        if !Ctx::verify(&source_validator.public_key, &payload, &self.sig_source) {
            return Err(BallotError::InvalidSourceSignature);
        }

        Ok(())
    }

    /// The deterministic hash of the ballot body, stable under re-signing
    /// since signatures are excluded.
    pub fn hash(&self) -> Hash {
        canonical_body_hash(
            &self.source,
            &self.proposer,
            &self.basis,
            self.state,
            self.vote,
            &self.tx_hashes,
            &self.proposer_tx,
        )
    }
}

fn ballot_state_tag(state: BallotState) -> u8 {
    match state {
        BallotState::Init => 0,
        BallotState::Sign => 1,
        BallotState::Accept => 2,
    }
}

fn vote_value_tag(vote: VoteValue) -> u8 {
    match vote {
        VoteValue::Yes => 0,
        VoteValue::No => 1,
        VoteValue::Exp => 2,
        VoteValue::NotYet => 3,
    }
}

/// Canonical byte encoding of every ballot field except the two signatures,
/// in declaration order, with fixed-width integers and UTF-8 addresses. Two
/// implementations that agree on field values must emit identical bytes, and
/// therefore the same hash, here.
#[allow(clippy::too_many_arguments)]
fn canonical_body_hash<Addr: fmt::Debug>(
    source: &Addr,
    proposer: &Addr,
    basis: &VotingBasis,
    state: BallotState,
    vote: VoteValue,
    tx_hashes: &[Hash],
    proposer_tx: &ProposerTransaction,
) -> Hash {
    let mut buf = Vec::new();
    buf.extend_from_slice(format!("{:?}", source).as_bytes());
    buf.push(0);
    buf.extend_from_slice(format!("{:?}", proposer).as_bytes());
    buf.push(0);
    buf.extend_from_slice(&basis.height.as_u64().to_be_bytes());
    buf.extend_from_slice(&basis.round.as_u64().to_be_bytes());
    buf.extend_from_slice(basis.prev_block_hash.as_bytes());
    buf.extend_from_slice(&basis.total_txs.to_be_bytes());
    buf.extend_from_slice(&basis.total_ops.to_be_bytes());
    buf.push(ballot_state_tag(state));
    buf.push(vote_value_tag(vote));
    buf.extend_from_slice(&(tx_hashes.len() as u64).to_be_bytes());
    for tx in tx_hashes {
        buf.extend_from_slice(tx.as_bytes());
    }
    buf.extend_from_slice(proposer_tx.as_bytes());
    Hash::digest(&buf)
}

/// `network_id ‖ body_hash`, the payload both signatures are computed over.
fn signing_payload(network_id: &[u8], body_hash: &Hash) -> Vec<u8> {
    let mut payload = Vec::with_capacity(network_id.len() + 32);
    payload.extend_from_slice(network_id);
    payload.extend_from_slice(body_hash.as_bytes());
    payload
}

impl<Ctx: Context> fmt::Debug for Ballot<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ballot")
            .field("basis", &self.basis)
            .field("proposer", &self.proposer)
            .field("source", &self.source)
            .field("state", &self.state)
            .field("vote", &self.vote)
            .field("tx_hashes", &self.tx_hashes)
            .finish()
    }
}

impl<Ctx: Context> fmt::Display for Ballot<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ballot(basis={}, state={}, vote={}, source={:?})",
            self.basis, self.state, self.vote, self.source
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubContext;
    use crate::{Height, RoundNumber};

    fn basis() -> VotingBasis {
        VotingBasis::new(Height::new(2), RoundNumber::new(0), Hash::digest(b"prev"), 1, 0)
    }

    #[test]
    fn advance_preserves_proposer_signature_and_rewrites_source() {
        let (p_pk, p_sk) = StubContext::keypair(1);
        let (v_pk, v_sk) = StubContext::keypair(2);

        let init = Ballot::<StubContext>::new_proposed(
            &p_pk,
            &p_sk,
            basis(),
            vec![Hash::digest(b"tx1")],
            ProposerTransaction::empty(),
            b"net",
        );
        let signed = init.advance(&v_pk, &v_sk, BallotState::Sign, VoteValue::Yes, b"net");

        assert_eq!(signed.sig_proposer, init.sig_proposer);
        assert_ne!(signed.sig_source, init.sig_source);
        assert_eq!(signed.source, StubContext::derive_address(&v_pk));
        assert_eq!(signed.proposer, init.proposer);
    }

    #[test]
    fn hash_is_stable_across_resigning_by_the_same_source() {
        let (p_pk, p_sk) = StubContext::keypair(1);

        let a = Ballot::<StubContext>::new_proposed(
            &p_pk,
            &p_sk,
            basis(),
            vec![],
            ProposerTransaction::empty(),
            b"net-a",
        );
        let b = Ballot::<StubContext>::new_proposed(
            &p_pk,
            &p_sk,
            basis(),
            vec![],
            ProposerTransaction::empty(),
            b"net-b",
        );

        // network_id is not part of the body hash, only of the signing payload.
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn well_formed_rejects_unknown_validator() {
        let (p_pk, p_sk) = StubContext::keypair(1);
        let ballot = Ballot::<StubContext>::new_proposed(
            &p_pk,
            &p_sk,
            basis(),
            vec![],
            ProposerTransaction::empty(),
            b"net",
        );

        let empty_set = ValidatorSet::<StubContext>::new(vec![]);
        let err = ballot.is_well_formed(b"net", &empty_set, 1000).unwrap_err();
        assert_eq!(err, BallotError::UnknownProposer(format!("{:?}", ballot.proposer)));
    }
}
