//! End-to-end scenarios (§8): each test wires up a real `IsaacCore` plus the
//! dispatcher pipeline against `isaac-test`'s Ed25519 fixtures and in-memory
//! collaborators, feeding ballots in the order a real network would deliver
//! them and asserting on the resulting `Effect`s and core state.
//!
//! Scenario numbering matches the spec's end-to-end list. Scenarios 3 and 6
//! (timeout-driven) live in `isaac-state-manager`'s own integration tests,
//! since the dispatcher alone never fires a timer.

use isaac_core::dispatch::{dispatch, Checker, Effect, Outcome};
use isaac_core::{DeterministicSelector, IsaacCore, ThresholdPolicy};
use isaac_round::RoundState;
use isaac_test::{
    advance, make_validators, propose, FixedConnectionManager, InMemoryBlockStore, InMemoryTxPool,
    TestContext, NETWORK_ID,
};
use isaac_types::{BallotState, Hash, Height, RoundNumber, ValidatorSet, VoteValue, VotingBasis};

fn accept_all_txs(_hashes: &[Hash]) -> bool {
    true
}

struct Fixture {
    core: IsaacCore<TestContext>,
    basis: VotingBasis,
    proposer_sk: isaac_test::PrivateKey,
    voter_sks: Vec<isaac_test::PrivateKey>,
}

/// Five equal-power validators, threshold 80% (T=4), genesis at height 1 so
/// the basis under test (height=1, round=0) is immediately valid.
fn five_node_fixture() -> Fixture {
    let validators = make_validators(5);
    let validator_set: ValidatorSet<TestContext> =
        ValidatorSet::new(validators.iter().map(|(v, _)| v.clone()));

    let core = IsaacCore::new(
        validator_set,
        DeterministicSelector,
        ThresholdPolicy::new(80),
        NETWORK_ID.to_vec(),
        1000,
        Height::new(1),
    );

    let basis = VotingBasis::new(Height::new(1), RoundNumber::new(0), core.latest_block().hash, 1, 0);
    let proposer_addr = core.select_proposer(basis.height, basis.round);

    let proposer_sk = validators
        .iter()
        .find(|(v, _)| v.address == proposer_addr)
        .map(|(_, sk)| sk.clone())
        .expect("selector must pick one of the known validators");

    let voter_sks: Vec<_> = validators
        .iter()
        .filter(|(v, _)| v.address != proposer_addr)
        .map(|(_, sk)| sk.clone())
        .collect();
    assert_eq!(voter_sks.len(), 4);

    Fixture { core, basis, proposer_sk, voter_sks }
}

#[tokio::test]
async fn five_node_single_tx_confirm() {
    let Fixture { core, basis, proposer_sk, voter_sks } = five_node_fixture();

    let tx_hash = Hash::digest(b"tx1");
    let tx_pool = InMemoryTxPool::new();
    tx_pool.seed(tx_hash, b"payload".to_vec());
    let block_store = InMemoryBlockStore::new();

    let mut round_state = RoundState::<TestContext>::new(basis);

    let init = propose(&proposer_sk, basis, vec![tx_hash]);
    let mut checker = Checker::new(&core, init.clone(), &accept_all_txs);
    let outcome = dispatch(&mut checker, &mut round_state);
    assert!(matches!(outcome, Outcome::Continue));
    assert!(checker
        .effects
        .iter()
        .any(|e| matches!(e, Effect::BroadcastAdvance { to_state: BallotState::Sign, vote: VoteValue::Yes, .. })));

    // The four non-proposer validators each advance to SIGN(YES).
    let mut last_effects = Vec::new();
    for (i, sk) in voter_sks.iter().enumerate() {
        let sign = advance(&init, sk, BallotState::Sign, VoteValue::Yes);
        let mut checker = Checker::new(&core, sign, &accept_all_txs);
        dispatch(&mut checker, &mut round_state);
        if i == voter_sks.len() - 1 {
            last_effects = checker.effects;
        }
    }
    assert!(last_effects
        .iter()
        .any(|e| matches!(e, Effect::BroadcastAdvance { to_state: BallotState::Accept, vote: VoteValue::Yes, .. })));

    // ...then each advances to ACCEPT(YES).
    let mut final_effects = Vec::new();
    for (i, sk) in voter_sks.iter().enumerate() {
        let accept = advance(&init, sk, BallotState::Accept, VoteValue::Yes);
        let mut checker = Checker::new(&core, accept, &accept_all_txs);
        dispatch(&mut checker, &mut round_state);
        if i == voter_sks.len() - 1 {
            final_effects = checker.effects;
        }
    }

    assert!(final_effects.iter().any(|e| matches!(e, Effect::Finalize { .. })));
    assert!(final_effects
        .iter()
        .any(|e| matches!(e, Effect::CloseConsensus { vote: VoteValue::Yes, .. })));

    let block = core
        .finalize(&basis, &tx_pool, &block_store, "2026-01-01T00:00:00Z")
        .await
        .expect("block store accepts the block");

    assert_eq!(block.height, Height::new(2));
    assert_eq!(block.total_txs, 1);
    assert_eq!(block.tx_hashes, vec![tx_hash]);
    assert_eq!(block.proposer, core.select_proposer(basis.height, basis.round));

    core.close_consensus(&block.proposer, &basis, VoteValue::Yes).expect("yes is a valid outcome");

    assert!(!core.is_voted(&init), "round cleanup must drop the basis=1 running round entirely");
    assert_eq!(tx_pool.removed(), vec![tx_hash]);
    assert_eq!(block_store.blocks().len(), 1);
}

#[tokio::test]
async fn no_voting_majority_stores_nothing_and_evicts_only_the_proposer_slice() {
    let Fixture { core, basis, proposer_sk, voter_sks } = five_node_fixture();

    let init = propose(&proposer_sk, basis, vec![]);
    let mut round_state = RoundState::<TestContext>::new(basis);
    let mut checker = Checker::new(&core, init.clone(), &accept_all_txs);
    dispatch(&mut checker, &mut round_state);

    let mut sign_effects = Vec::new();
    for (i, sk) in voter_sks.iter().enumerate() {
        let sign = advance(&init, sk, BallotState::Sign, VoteValue::No);
        let mut checker = Checker::new(&core, sign, &accept_all_txs);
        dispatch(&mut checker, &mut round_state);
        if i == voter_sks.len() - 1 {
            sign_effects = checker.effects;
        }
    }
    assert!(sign_effects
        .iter()
        .any(|e| matches!(e, Effect::BroadcastAdvance { to_state: BallotState::Accept, vote: VoteValue::No, .. })));

    let mut accept_effects = Vec::new();
    for (i, sk) in voter_sks.iter().enumerate() {
        let accept = advance(&init, sk, BallotState::Accept, VoteValue::No);
        let mut checker = Checker::new(&core, accept, &accept_all_txs);
        dispatch(&mut checker, &mut round_state);
        if i == voter_sks.len() - 1 {
            accept_effects = checker.effects;
        }
    }

    assert!(accept_effects.iter().any(|e| matches!(e, Effect::CloseWithoutStore)));
    let proposer = init.proposer.clone();
    core.close_consensus(&proposer, &basis, VoteValue::No).expect("no is a valid outcome");

    assert!(!core.is_voted(&init), "the proposer's evidence slice must be gone");

    let block_store = InMemoryBlockStore::new();
    assert!(block_store.blocks().is_empty());
}

#[tokio::test]
async fn equivocating_source_is_tallied_as_no() {
    let Fixture { core, basis, proposer_sk, voter_sks } = five_node_fixture();

    let init = propose(&proposer_sk, basis, vec![]);
    let mut round_state = RoundState::<TestContext>::new(basis);
    let mut checker = Checker::new(&core, init.clone(), &accept_all_txs);
    dispatch(&mut checker, &mut round_state);

    let equivocator = &voter_sks[0];
    let sign_yes = advance(&init, equivocator, BallotState::Sign, VoteValue::Yes);
    let mut checker = Checker::new(&core, sign_yes, &accept_all_txs);
    dispatch(&mut checker, &mut round_state);

    let sign_no = advance(&init, equivocator, BallotState::Sign, VoteValue::No);
    let mut checker = Checker::new(&core, sign_no.clone(), &accept_all_txs);
    dispatch(&mut checker, &mut round_state);
    // the equivocator is now counted as NO; voting is not yet finished (1 of 4)
    assert!(checker.effects.is_empty());

    // The other three split NO/EXP/YES so that no single value can reach
    // T=4 even once the validator set (5, one abstaining proposer) is
    // exhausted: 1 NO (equivocator) + 1 NO + 1 EXP + 1 YES = 4 cast, 1
    // remaining, and 2 (NO's best case) + 1 < 4. The tie-break fires NO.
    let sign_no_2 = advance(&init, &voter_sks[1], BallotState::Sign, VoteValue::No);
    let mut checker = Checker::new(&core, sign_no_2, &accept_all_txs);
    dispatch(&mut checker, &mut round_state);
    assert!(checker.effects.is_empty());

    let sign_exp = advance(&init, &voter_sks[2], BallotState::Sign, VoteValue::Exp);
    let mut checker = Checker::new(&core, sign_exp, &accept_all_txs);
    dispatch(&mut checker, &mut round_state);
    assert!(checker.effects.is_empty());

    let sign_yes_last = advance(&init, &voter_sks[3], BallotState::Sign, VoteValue::Yes);
    let mut checker = Checker::new(&core, sign_yes_last, &accept_all_txs);
    dispatch(&mut checker, &mut round_state);

    assert!(checker
        .effects
        .iter()
        .any(|e| matches!(e, Effect::BroadcastAdvance { to_state: BallotState::Accept, vote: VoteValue::No, .. })));
}

#[tokio::test]
async fn connection_manager_exposes_the_fixed_roster() {
    let validators = make_validators(3);
    let validator_set: ValidatorSet<TestContext> =
        ValidatorSet::new(validators.iter().map(|(v, _)| v.clone()));
    let conn = FixedConnectionManager::new(validator_set.clone());

    assert_eq!(
        isaac_core::ConnectionManager::all_validators(&conn).len(),
        validator_set.len()
    );
}
