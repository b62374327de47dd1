//! `tracing-subscriber` wiring, grounded on `cli/src/logging.rs`'s
//! `EnvFilter`-driven `FmtSubscriber`, narrowed to the one target crate
//! prefix this workspace actually has.

use itertools::Itertools;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::FmtSubscriber;

use isaac_config::LogLevel;

/// The crates whose spans/events the default filter enables.
const TARGET_CRATES: &[&str] = &["isaac_core", "isaac_state_manager", "isaac_round", "isaac_tally", "isaac_node"];

pub fn init(log_level: LogLevel) {
    let filter = build_filter(log_level);

    FmtSubscriber::builder()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stdout)
        .with_ansi(enable_ansi())
        .with_thread_ids(false)
        .finish()
        .init();
}

fn enable_ansi() -> bool {
    use std::io::IsTerminal;
    std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
}

fn build_filter(default_level: LogLevel) -> EnvFilter {
    let directive = std::env::var("RUST_LOG").unwrap_or_else(|_| default_directive(default_level));

    EnvFilter::try_new(&directive)
        .unwrap_or_else(|e| panic!("invalid log filtering directive {directive:?}: {e}"))
}

fn default_directive(log_level: LogLevel) -> String {
    TARGET_CRATES.iter().map(|&c| format!("{c}={log_level}")).join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directive_covers_every_crate() {
        let directive = default_directive(LogLevel::Debug);
        for crate_name in TARGET_CRATES {
            assert!(directive.contains(&format!("{crate_name}=debug")));
        }
    }
}
