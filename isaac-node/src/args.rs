//! Command-line parameters, grounded on `cli/src/args.rs`'s `Args` struct
//! but trimmed to what a single-process demo needs: no `--home` directory,
//! no genesis/priv-key files, since the validator set and keys are
//! generated in memory for every run (§1 "node discovery, validator set
//! membership" stays out of scope; this binary hard-codes a roster).

use std::path::PathBuf;

use clap::Parser;

use isaac_config::{LogFormat, LogLevel};

#[derive(Parser, Clone, Debug)]
#[command(version, about = "Run an in-memory ISAAC consensus demo network", long_about = None)]
pub struct Args {
    /// Optional TOML config file overriding the engine defaults (§6).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of validators to simulate in this process.
    #[arg(long, default_value_t = 4)]
    pub validators: usize,

    /// Number of blocks to confirm before the demo stops.
    #[arg(long, default_value_t = 5)]
    pub heights: u64,

    /// Log level (default: `info`).
    #[arg(long, value_name = "LOG_LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Log format (default: `plaintext`).
    #[arg(long, value_name = "LOG_FORMAT")]
    pub log_format: Option<LogFormat>,
}

impl Args {
    pub fn load_config(&self) -> color_eyre::eyre::Result<isaac_config::Config> {
        let mut config = match &self.config {
            Some(path) => {
                let contents = std::fs::read_to_string(path)?;
                isaac_config::Config::from_toml_str(&contents)?
            }
            None => isaac_config::Config::default(),
        };

        if let Some(log_level) = self.log_level {
            config.logging.log_level = log_level;
        }
        if let Some(log_format) = self.log_format {
            config.logging.log_format = log_format;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse() {
        let args = Args::parse_from(["isaac-node"]);
        assert_eq!(args.validators, 4);
        assert_eq!(args.heights, 5);
        assert!(args.config.is_none());
    }

    #[test]
    fn overrides_parse() {
        let args = Args::parse_from([
            "isaac-node",
            "--validators",
            "7",
            "--heights",
            "2",
            "--log-level",
            "warn",
        ]);
        assert_eq!(args.validators, 7);
        assert_eq!(args.heights, 2);
        assert_eq!(args.log_level, Some(LogLevel::Warn));
    }
}
