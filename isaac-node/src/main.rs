//! Demo binary: runs a small in-memory ISAAC validator network inside one
//! process, end to end, to exercise the whole pipeline (config → core →
//! dispatcher → state manager → finalized block) without any real network,
//! storage, or HSM. Grounded on `cli/src/main.rs`'s `start` command, but
//! collapsed to a single command since this binary has no files to
//! initialize (§1: node discovery and validator membership are out of
//! scope, so the roster is simply generated for the run).

mod args;
mod logging;
mod network;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::Result;
use tokio::sync::OnceCell;
use tracing::info;

use isaac_core::{DeterministicSelector, IsaacCore, ThresholdPolicy};
use isaac_state_manager::{StateManager, StateManagerHandle};
use isaac_test::{make_validators, InMemoryBlockStore, InMemoryTxPool, RecordingSyncer, TestContext};
use isaac_types::{Height, ValidatorSet};

use crate::args::Args;
use crate::network::FanOutBroadcaster;

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let config = args.load_config()?;
    logging::init(config.logging.log_level);

    info!(validators = args.validators, heights = args.heights, "starting isaac-node demo network");

    let rt = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    rt.block_on(run(args, config))
}

async fn run(args: Args, config: isaac_config::Config) -> Result<()> {
    let keyed_validators = make_validators(args.validators);
    let validator_set: ValidatorSet<TestContext> =
        ValidatorSet::new(keyed_validators.iter().map(|(v, _)| v.clone()));

    let roster_cell: Arc<OnceCell<Vec<StateManagerHandle<TestContext>>>> = Arc::new(OnceCell::new());

    let mut handles = Vec::with_capacity(keyed_validators.len());
    let mut confirmed_watchers = Vec::with_capacity(keyed_validators.len());
    let mut block_stores = Vec::with_capacity(keyed_validators.len());

    for (validator, private_key) in &keyed_validators {
        let core = Arc::new(IsaacCore::new(
            validator_set.clone(),
            DeterministicSelector,
            ThresholdPolicy::new(config.threshold_percent),
            config.network_id_bytes(),
            config.max_transactions_per_ballot,
            Height::new(config.genesis_height),
        ));

        let broadcaster = Arc::new(FanOutBroadcaster::new(Arc::clone(&roster_cell)));
        let block_store = Arc::new(InMemoryBlockStore::new());
        let tx_pool = Arc::new(InMemoryTxPool::new());
        let syncer = Arc::new(RecordingSyncer::new());
        let tx_validator: Arc<dyn Fn(&[isaac_types::Hash]) -> bool + Send + Sync> = Arc::new(|_: &[isaac_types::Hash]| true);

        let (manager, handle) = StateManager::new(
            core,
            broadcaster,
            Arc::clone(&block_store),
            tx_pool,
            syncer,
            tx_validator,
            validator.public_key.clone(),
            private_key.clone(),
            &config,
        );

        confirmed_watchers.push(handle.subscribe_confirmed());
        handles.push(handle);
        block_stores.push(block_store);
        tokio::spawn(manager.run());
    }

    roster_cell
        .set(handles.clone())
        .expect("roster_cell is only ever filled once, right here");

    // Wait until every node has confirmed at least `args.heights` blocks, or
    // bail out after a generous timeout so a stuck demo still exits.
    let target = Height::new(config.genesis_height + args.heights);
    let mut poll = tokio::time::interval(Duration::from_millis(50));
    let deadline = tokio::time::sleep(Duration::from_secs(120));
    tokio::pin!(deadline);

    loop {
        let all_reached = confirmed_watchers
            .iter()
            .all(|w| w.borrow().as_ref().is_some_and(|b| b.height >= target));
        if all_reached {
            break;
        }

        tokio::select! {
            _ = poll.tick() => continue,
            () = &mut deadline => {
                tracing::warn!("demo network did not reach the target height before the deadline");
                break;
            }
        }
    }

    for handle in &handles {
        handle.stop();
    }

    for (i, store) in block_stores.iter().enumerate() {
        let blocks = store.blocks();
        info!(node = i, confirmed = blocks.len(), "node finished");
        for block in blocks {
            info!(node = i, height = %block.height, total_txs = block.total_txs, hash = %block.hash, "confirmed block");
        }
    }

    Ok(())
}
