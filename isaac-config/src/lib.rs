//! Node configuration (§6): `serde` + `toml` structs with `humantime_serde`
//! durations, grounded on `code/crates/config/src/lib.rs`'s
//! `ConsensusConfig`/`TimeoutConfig`/`LoggingConfig` split, pared down to the
//! options the spec actually names — no p2p/gossipsub/mempool surface,
//! since transport is an external collaborator (§1) this workspace never
//! implements itself.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level node configuration. `Default` matches the defaults listed in
/// spec §6 exactly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub timeouts: TimeoutConfig,

    /// Target inter-block interval the `block_time_buffer` controller (§4.6)
    /// drives the observed average toward.
    #[serde(with = "humantime_serde")]
    pub block_time: Duration,

    /// The proportional step the `block_time_buffer` controller nudges the
    /// sleep by once the observed average has drifted past `block_time` by
    /// more than epsilon (50ms). Same role as `timeout_*_delta` below, but
    /// for the propose-or-wait smoothing delay rather than a ballot timeout.
    #[serde(with = "humantime_serde")]
    pub block_time_delta: Duration,

    /// Integer 1-100; see [`ThresholdPolicy`](isaac_tally::ThresholdPolicy).
    pub threshold_percent: u8,

    pub max_transactions_per_ballot: usize,

    /// Opaque bytes mixed into every ballot signature; stored here as a
    /// UTF-8 string for config-file friendliness.
    pub network_id: String,

    pub genesis_height: u64,

    pub logging: LoggingConfig,
}

impl Config {
    pub fn network_id_bytes(&self) -> Vec<u8> {
        self.network_id.as_bytes().to_vec()
    }

    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeouts: TimeoutConfig::default(),
            block_time: Duration::from_secs(5),
            block_time_delta: Duration::from_millis(200),
            threshold_percent: 66,
            max_transactions_per_ballot: 1000,
            network_id: "isaac".to_string(),
            genesis_height: 1,
            logging: LoggingConfig::default(),
        }
    }
}

/// Per-phase ballot timeouts and their round-over-round deltas (§4.6, §6).
/// Mirrors `TimeoutConfig::{timeout_propose,...,timeout_propose_delta,...}`,
/// renamed to the ballot phases this engine actually has (INIT/SIGN/ACCEPT,
/// no PREVOTE/PRECOMMIT split).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    #[serde(with = "humantime_serde")]
    pub timeout_init: Duration,
    #[serde(with = "humantime_serde")]
    pub timeout_init_delta: Duration,

    #[serde(with = "humantime_serde")]
    pub timeout_sign: Duration,
    #[serde(with = "humantime_serde")]
    pub timeout_sign_delta: Duration,

    #[serde(with = "humantime_serde")]
    pub timeout_accept: Duration,
    #[serde(with = "humantime_serde")]
    pub timeout_accept_delta: Duration,
}

impl TimeoutConfig {
    pub fn duration(&self, phase: isaac_types::Phase) -> Duration {
        match phase {
            isaac_types::Phase::Init => self.timeout_init,
            isaac_types::Phase::Sign => self.timeout_sign,
            isaac_types::Phase::Accept => self.timeout_accept,
            isaac_types::Phase::AllConfirm => Duration::ZERO,
        }
    }

    pub fn delta(&self, phase: isaac_types::Phase) -> Duration {
        match phase {
            isaac_types::Phase::Init => self.timeout_init_delta,
            isaac_types::Phase::Sign => self.timeout_sign_delta,
            isaac_types::Phase::Accept => self.timeout_accept_delta,
            isaac_types::Phase::AllConfirm => Duration::ZERO,
        }
    }

    /// `duration(phase) + delta(phase) * round`, matching the grow-per-round
    /// timeout shape every round-based BFT engine in the pack uses so a
    /// network that keeps timing out doesn't hammer itself with the same
    /// too-short timeout forever.
    pub fn duration_for_round(&self, phase: isaac_types::Phase, round: isaac_types::RoundNumber) -> Duration {
        self.duration(phase) + self.delta(phase) * round.as_u64() as u32
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            timeout_init: Duration::from_secs(2),
            timeout_init_delta: Duration::from_millis(500),
            timeout_sign: Duration::from_secs(2),
            timeout_sign_delta: Duration::from_millis(500),
            timeout_accept: Duration::from_secs(2),
            timeout_accept_delta: Duration::from_millis(500),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_level: LogLevel,
    pub log_format: LogFormat,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    #[default]
    Debug,
    Info,
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("invalid log level: {other}")),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plaintext,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plaintext" => Ok(LogFormat::Plaintext),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("invalid log format: {other}")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Plaintext => write!(f, "plaintext"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}
