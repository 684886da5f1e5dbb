//! Runtime knobs read from the environment.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `MPI_DEMO_TICK_MS` | `1000` | Length of one rank-0 sleep tick |
//!
//! Rank 0 always sleeps [`SLEEP_TICKS`] times; only the tick length moves.
//! An unset or unparseable value falls back to the default, so reading the
//! configuration never fails.

use std::env;
use std::time::Duration;

/// Tick length variable.
pub const TICK_MS_VAR: &str = "MPI_DEMO_TICK_MS";

/// Number of rank-0 sleep iterations.
pub const SLEEP_TICKS: u32 = 3;

/// Settings for the barrier demo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoConfig {
    /// How long rank 0 sleeps per iteration.
    pub tick: Duration,
}

impl Default for DemoConfig {
    fn default() -> Self {
        DemoConfig {
            tick: Duration::from_secs(1),
        }
    }
}

impl DemoConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name to
    /// its value if set. Bad values are logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = DemoConfig::default();
        if let Some(value) = lookup(TICK_MS_VAR) {
            match value.trim().parse::<u64>() {
                Ok(ms) => config.tick = Duration::from_millis(ms),
                Err(e) => tracing::warn!(
                    var = TICK_MS_VAR,
                    %value,
                    error = %e,
                    "ignoring unparseable tick length"
                ),
            }
        }
        config
    }
}
