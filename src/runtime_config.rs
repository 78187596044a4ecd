//! # Runtime Configuration Module
//!
//! Environment variable-based knobs for the router's runtime behavior.
//!
//! ## Environment Variables
//!
//! ### `SEGROUTER_SLOW_MATCH_US`
//!
//! Route lookups slower than this many microseconds are logged at `warn`
//! ("Slow route matching detected"). Accepts decimal or `0x`-prefixed hex.
//!
//! Default: `1000` (1 ms)
//!
//! ## Usage
//!
//! ```rust
//! use segrouter::runtime_config::RuntimeConfig;
//! use segrouter::router::Router;
//!
//! let config = RuntimeConfig::from_env();
//! let router: Router<()> = config.apply(Router::new());
//! assert!(router.is_empty());
//! ```

use std::env;
use std::time::Duration;

use crate::router::{Router, DEFAULT_SLOW_MATCH};

/// Environment variable holding the slow-match threshold in microseconds
pub const SLOW_MATCH_ENV: &str = "SEGROUTER_SLOW_MATCH_US";

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Lookup duration above which a match is logged as slow
    pub slow_match: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            slow_match: DEFAULT_SLOW_MATCH,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_value(env::var(SLOW_MATCH_ENV).ok().as_deref())
    }

    /// Parse a raw threshold value; unparseable input falls back to the default
    #[must_use]
    pub fn from_value(value: Option<&str>) -> Self {
        let micros = value.map(str::trim).and_then(|val| {
            if let Some(hex) = val.strip_prefix("0x") {
                u64::from_str_radix(hex, 16).ok()
            } else {
                val.parse().ok()
            }
        });
        match micros {
            Some(us) => RuntimeConfig {
                slow_match: Duration::from_micros(us),
            },
            None => RuntimeConfig::default(),
        }
    }

    /// Configure a router with these settings
    #[must_use]
    pub fn apply<H>(&self, router: Router<H>) -> Router<H> {
        router.with_slow_match_threshold(self.slow_match)
    }
}
