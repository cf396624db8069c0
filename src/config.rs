//! # Config — Explicit Miner Configuration
//!
//! One immutable value carrying everything the supervisor and workers need:
//! service URL, owner key, solution prefix, pool size, and loop cadences.
//! Constructed from CLI flags and environment in `main`, validated once
//! before any thread is spawned.

use std::time::Duration;

use anyhow::{bail, Result};

/// Public coin service.
pub const DEFAULT_SERVER: &str = "https://fleececoin.herokuapp.com";
/// Credential embedded in every candidate message.
pub const DEFAULT_OWNER_KEY: &str = "steve";
/// Digest prefix a candidate must hit to count as solved.
pub const DEFAULT_SOLUTION_PREFIX: &str = "f1eece";
/// Search workers per generation.
pub const DEFAULT_POOL_SIZE: usize = 5;
/// Bounded wait between puzzle freshness checks.
pub const DEFAULT_POLL_MS: u64 = 200;
/// Interval between progress reports.
pub const DEFAULT_REPORT_SECS: u64 = 10;

#[derive(Clone, Debug)]
pub struct MinerConfig {
    pub server: String,
    pub owner_key: String,
    pub solution_prefix: String,
    pub pool_size: usize,
    pub poll_interval: Duration,
    pub report_interval: Duration,
}

impl Default for MinerConfig {
    fn default() -> Self {
        MinerConfig {
            server: DEFAULT_SERVER.to_string(),
            owner_key: DEFAULT_OWNER_KEY.to_string(),
            solution_prefix: DEFAULT_SOLUTION_PREFIX.to_string(),
            pool_size: DEFAULT_POOL_SIZE,
            poll_interval: Duration::from_millis(DEFAULT_POLL_MS),
            report_interval: Duration::from_secs(DEFAULT_REPORT_SECS),
        }
    }
}

impl MinerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            bail!("pool size must be at least 1");
        }
        if self.server.trim().is_empty() {
            bail!("server URL must not be empty");
        }
        if self.solution_prefix.is_empty() {
            bail!("solution prefix must not be empty");
        }
        if !self
            .solution_prefix
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        {
            bail!(
                "solution prefix must be lowercase hex, got {:?}",
                self.solution_prefix
            );
        }
        if self.owner_key.is_empty() {
            bail!("owner key must not be empty");
        }
        // The owner key sits inside the comma-separated message and the
        // pipe-framed worker line; a separator inside it would corrupt both.
        if self.owner_key.contains([',', '|']) {
            bail!("owner key must not contain ',' or '|'");
        }
        Ok(())
    }
}
