//! The per-round ballot state machine: a pure function from `(RoundState,
//! Input)` to `Transition`, advancing a round through INIT → SIGN → ACCEPT →
//! ALL-CONFIRM.

mod input;
mod output;
mod state;
mod state_machine;
mod transition;

pub use input::Input;
pub use output::Output;
pub use state::RoundState;
pub use state_machine::apply;
pub use transition::Transition;

#[cfg(test)]
mod tests {
    use isaac_types::{BallotState, Hash, Height, Phase, RoundNumber, VoteValue, VotingBasis};

    use super::*;

    mod stub {
        use isaac_types::{Address, Context, PublicKey, Signature};
        use serde::{Deserialize, Serialize};

        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct StubAddress(pub u8);
        impl Address for StubAddress {}

        #[derive(Clone, Debug, PartialEq, Eq)]
        pub struct StubPublicKey(pub u8);
        impl PublicKey for StubPublicKey {}

        #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
        pub struct StubSignature(pub u8);
        impl Signature for StubSignature {}

        #[derive(Clone, Debug, PartialEq, Eq)]
        pub struct StubContext;

        impl Context for StubContext {
            type Address = StubAddress;
            type PublicKey = StubPublicKey;
            type PrivateKey = u8;
            type Signature = StubSignature;

            fn sign(private_key: &u8, _message: &[u8]) -> StubSignature {
                StubSignature(*private_key)
            }

            fn verify(public_key: &StubPublicKey, _message: &[u8], signature: &StubSignature) -> bool {
                signature.0 == public_key.0
            }

            fn derive_address(public_key: &StubPublicKey) -> StubAddress {
                StubAddress(public_key.0)
            }
        }
    }

    use stub::StubContext;

    fn basis() -> VotingBasis {
        VotingBasis::new(Height::new(2), RoundNumber::new(0), Hash::digest(b"prev"), 0, 0)
    }

    #[test]
    fn init_to_sign_on_well_formed_proposal() {
        let state = RoundState::<StubContext>::new(basis());
        let transition = apply(
            state,
            Input::ProposalAccepted { proposer_matches: true, tx_valid: true },
        );

        assert_eq!(transition.next_state.phase, Phase::Sign);
        assert_eq!(
            transition.output,
            Some(Output::BroadcastBallot { next_state: BallotState::Sign, vote: VoteValue::Yes })
        );
    }

    #[test]
    fn proposer_mismatch_forces_local_no() {
        let state = RoundState::<StubContext>::new(basis());
        let transition = apply(
            state,
            Input::ProposalAccepted { proposer_matches: false, tx_valid: true },
        );

        assert_eq!(
            transition.output,
            Some(Output::BroadcastBallot { next_state: BallotState::Sign, vote: VoteValue::No })
        );
    }

    #[test]
    fn accept_yes_threshold_finalizes() {
        let state = RoundState::<StubContext>::new(basis()).with_phase(Phase::Accept);
        let transition = apply(state, Input::ThresholdReached(VoteValue::Yes));

        assert_eq!(transition.next_state.phase, Phase::AllConfirm);
        assert_eq!(transition.output, Some(Output::Finalize));
    }

    #[test]
    fn accept_no_threshold_closes_without_store() {
        let state = RoundState::<StubContext>::new(basis()).with_phase(Phase::Accept);
        let transition = apply(state, Input::ThresholdReached(VoteValue::No));

        assert_eq!(transition.next_state.phase, Phase::AllConfirm);
        assert_eq!(transition.output, Some(Output::CloseWithoutStore));
    }

    #[test]
    fn timeout_in_sign_broadcasts_exp_and_advances_to_accept() {
        let state = RoundState::<StubContext>::new(basis()).with_phase(Phase::Sign);
        let transition = apply(state, Input::TimeoutExpired);

        assert_eq!(transition.next_state.phase, Phase::Accept);
        assert_eq!(
            transition.output,
            Some(Output::BroadcastBallot { next_state: BallotState::Accept, vote: VoteValue::Exp })
        );
    }

    #[test]
    fn timeout_in_accept_closes_the_round() {
        let state = RoundState::<StubContext>::new(basis()).with_phase(Phase::Accept);
        let transition = apply(state, Input::TimeoutExpired);

        assert_eq!(transition.next_state.phase, Phase::AllConfirm);
        assert_eq!(transition.output, Some(Output::CloseWithoutStore));
    }
}
