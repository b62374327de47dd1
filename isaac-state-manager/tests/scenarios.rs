//! Timeout-driven end-to-end scenarios (§8) that `isaac-core/tests/
//! scenarios.rs` cannot exercise on its own, since they need a live timer:
//! scenario 3 (SIGN times out with only 3 of 4 YES votes in) and scenario 6
//! (the proposer's own block-time timer elapses with an empty tx-pool).
//!
//! Uses `tokio::time::pause`/`advance` for deterministic virtual time,
//! grounded on the teacher's own `#[tokio::test(start_paused = true)]` usage
//! in its timeout-handling tests.

use std::sync::Arc;
use std::time::Duration;

use isaac_config::Config;
use isaac_core::{DeterministicSelector, IsaacCore, ThresholdPolicy};
use isaac_state_manager::StateManager;
use isaac_test::{make_validators, InMemoryBlockStore, InMemoryTxPool, RecordingSyncer, TestContext};
use isaac_types::{BallotState, Hash, Height, Phase, ValidatorSet, VoteValue};

struct Node {
    core: Arc<IsaacCore<TestContext>>,
    block_store: Arc<InMemoryBlockStore>,
}

fn five_node_config() -> Config {
    let mut config = Config::default();
    config.threshold_percent = 80; // T = 4 of 5
    config.timeouts.timeout_init = Duration::from_secs(2);
    config.timeouts.timeout_sign = Duration::from_secs(2);
    config.timeouts.timeout_accept = Duration::from_secs(2);
    config.block_time = Duration::ZERO;
    config.block_time_delta = Duration::from_millis(0);
    config
}

#[tokio::test(start_paused = true)]
async fn sign_timeout_broadcasts_an_exp_accept_ballot() {
    let config = five_node_config();
    let validators = make_validators(5);
    let validator_set: ValidatorSet<TestContext> =
        ValidatorSet::new(validators.iter().map(|(v, _)| v.clone()));

    let core = Arc::new(IsaacCore::new(
        validator_set.clone(),
        DeterministicSelector,
        ThresholdPolicy::new(config.threshold_percent),
        config.network_id_bytes(),
        config.max_transactions_per_ballot,
        Height::new(config.genesis_height),
    ));

    let broadcaster = Arc::new(isaac_test::InMemoryBroadcaster::new());
    let block_store = Arc::new(InMemoryBlockStore::new());
    let tx_pool = Arc::new(InMemoryTxPool::new());
    let syncer = Arc::new(RecordingSyncer::new());
    let tx_validator: Arc<dyn Fn(&[Hash]) -> bool + Send + Sync> = Arc::new(|_: &[Hash]| true);

    let proposer_addr = core.select_proposer(Height::new(2), isaac_types::RoundNumber::new(0));
    let (proposer, proposer_sk) = validators
        .iter()
        .find(|(v, _)| v.address == proposer_addr)
        .cloned()
        .expect("selector picks a known validator");

    let (manager, handle) = StateManager::new(
        Arc::clone(&core),
        Arc::clone(&broadcaster) as Arc<dyn isaac_core::Broadcaster<TestContext>>,
        Arc::clone(&block_store) as Arc<dyn isaac_core::BlockStore<TestContext>>,
        tx_pool as Arc<dyn isaac_core::TxPool<TestContext>>,
        syncer as Arc<dyn isaac_core::Syncer<TestContext>>,
        tx_validator,
        proposer.public_key.clone(),
        proposer_sk.clone(),
        &config,
    );

    let mut phase = handle.subscribe_phase();
    tokio::spawn(manager.run());

    // Let the proposer's own `propose-or-wait` (block_time == 0) fire and
    // broadcast the INIT ballot, then feed 3 of 4 SIGN(YES) responses —
    // one short of T=4 — and let the SIGN timer run out.
    tokio::time::advance(Duration::from_millis(10)).await;
    while *phase.borrow() != Phase::Sign {
        phase.changed().await.unwrap();
    }

    let init = broadcaster
        .sent()
        .into_iter()
        .find(|b| b.state == BallotState::Init)
        .expect("proposer must have broadcast an INIT ballot");

    let other_sks: Vec<_> = validators
        .iter()
        .filter(|(v, _)| v.address != proposer_addr)
        .map(|(_, sk)| sk.clone())
        .collect();

    for sk in other_sks.iter().take(3) {
        let sign = isaac_test::advance(&init, sk, BallotState::Sign, VoteValue::Yes);
        handle.submit_ballot(sign).await.unwrap();
    }

    tokio::time::advance(Duration::from_secs(3)).await;
    while *phase.borrow() != Phase::Accept {
        phase.changed().await.unwrap();
    }

    let exp_accept = broadcaster
        .sent()
        .into_iter()
        .filter(|b| b.state == BallotState::Accept)
        .find(|b| b.vote == VoteValue::Exp)
        .expect("SIGN timeout must synthesize an EXP ACCEPT ballot");
    assert_eq!(exp_accept.basis, init.basis);

    handle.stop();
}

#[tokio::test(start_paused = true)]
async fn proposer_confirms_an_empty_block_when_the_pool_is_empty() {
    let config = five_node_config();
    let validators = make_validators(5);
    let validator_set: ValidatorSet<TestContext> =
        ValidatorSet::new(validators.iter().map(|(v, _)| v.clone()));

    let core = Arc::new(IsaacCore::new(
        validator_set.clone(),
        DeterministicSelector,
        ThresholdPolicy::new(config.threshold_percent),
        config.network_id_bytes(),
        config.max_transactions_per_ballot,
        Height::new(config.genesis_height),
    ));

    let broadcaster = Arc::new(isaac_test::InMemoryBroadcaster::new());
    let block_store = Arc::new(InMemoryBlockStore::new());
    let tx_pool = Arc::new(InMemoryTxPool::new()); // deliberately empty
    let syncer = Arc::new(RecordingSyncer::new());
    let tx_validator: Arc<dyn Fn(&[Hash]) -> bool + Send + Sync> = Arc::new(|_: &[Hash]| true);

    let proposer_addr = core.select_proposer(Height::new(2), isaac_types::RoundNumber::new(0));
    let (proposer, proposer_sk) = validators
        .iter()
        .find(|(v, _)| v.address == proposer_addr)
        .cloned()
        .expect("selector picks a known validator");

    let (manager, handle) = StateManager::new(
        Arc::clone(&core),
        Arc::clone(&broadcaster) as Arc<dyn isaac_core::Broadcaster<TestContext>>,
        Arc::clone(&block_store) as Arc<dyn isaac_core::BlockStore<TestContext>>,
        tx_pool as Arc<dyn isaac_core::TxPool<TestContext>>,
        syncer as Arc<dyn isaac_core::Syncer<TestContext>>,
        tx_validator,
        proposer.public_key.clone(),
        proposer_sk.clone(),
        &config,
    );

    let mut confirmed = handle.subscribe_confirmed();
    tokio::spawn(manager.run());

    tokio::time::advance(Duration::from_millis(10)).await;

    let init = loop {
        if let Some(init) = broadcaster.sent().into_iter().find(|b| b.state == BallotState::Init) {
            break init;
        }
        tokio::task::yield_now().await;
    };
    assert!(init.tx_hashes.is_empty());

    let other_sks: Vec<_> = validators
        .iter()
        .filter(|(v, _)| v.address != proposer_addr)
        .map(|(_, sk)| sk.clone())
        .collect();

    for sk in &other_sks {
        let sign = isaac_test::advance(&init, sk, BallotState::Sign, VoteValue::Yes);
        handle.submit_ballot(sign).await.unwrap();
    }
    for sk in &other_sks {
        let accept = isaac_test::advance(&init, sk, BallotState::Accept, VoteValue::Yes);
        handle.submit_ballot(accept).await.unwrap();
    }

    confirmed.changed().await.unwrap();
    let block = confirmed.borrow().clone().expect("a block must have been confirmed");

    assert_eq!(block.height, Height::new(2));
    assert_eq!(block.total_txs, 0);
    assert!(block.tx_hashes.is_empty());
    assert_eq!(block_store.blocks().len(), 1);

    handle.stop();
}
