//! Design constants and index-creation configuration for the stepped-merge
//! core: fan-out, level count, and the bounds the manifest's fixed-shape
//! arrays are checked against.

use crate::{Error, Result};

/// Upper bound on [Config::k], the fan-out per level. A manifest whose `K`
/// exceeds this cannot be constructed.
pub const MAX_K: usize = 16;
/// Upper bound on [Config::n], the number of numbered levels.
pub const MAX_N: usize = 8;
/// Ceiling on the number of indexed attributes a single index may carry.
pub const MAX_KEYS: usize = 32;

/// Default fan-out, matching the worked examples.
pub const DEFAULT_K: usize = 3;
/// Default level count, matching the worked examples.
pub const DEFAULT_N: usize = 3;
/// Default threshold on `curr`'s tuple count before promotion.
pub const DEFAULT_MAX_INMEM_TUPLES: usize = 2;

/// Configuration used to create a new stepped-merge index.
///
/// `K` and `N` are suggested at 3 and 3 for development-scale exercises; a
/// production deployment should raise these to 16 and 8 (the values
/// `MAX_K`/`MAX_N` were chosen to bound).
#[derive(Clone, Debug)]
pub struct Config {
    /// Fan-out per level: the number of sibling runs that triggers a merge.
    pub k: usize,
    /// Number of numbered levels, 0 .. n-1. Beyond is the root level.
    pub n: usize,
    /// Threshold on `curr`'s tuple count before it is promoted to level 0.
    pub max_inmem_tuples: usize,
    /// Number of indexed attributes, must not exceed [MAX_KEYS].
    pub attnum: usize,
    /// Whether the index enforces/records key uniqueness.
    pub unique: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            k: DEFAULT_K,
            n: DEFAULT_N,
            max_inmem_tuples: DEFAULT_MAX_INMEM_TUPLES,
            attnum: 1,
            unique: false,
        }
    }
}

impl Config {
    /// Create a configuration with the development defaults (`K=3`, `N=3`).
    pub fn new() -> Config {
        Config::default()
    }

    pub fn set_fanout(&mut self, k: usize, n: usize) -> &mut Self {
        self.k = k;
        self.n = n;
        self
    }

    pub fn set_max_inmem_tuples(&mut self, max_inmem_tuples: usize) -> &mut Self {
        self.max_inmem_tuples = max_inmem_tuples;
        self
    }

    pub fn set_attnum(&mut self, attnum: usize) -> &mut Self {
        self.attnum = attnum;
        self
    }

    pub fn set_unique(&mut self, unique: bool) -> &mut Self {
        self.unique = unique;
        self
    }

    /// Validate this configuration against the crate's design-constant
    /// ceilings. Every manifest is built from a validated [Config].
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 || self.k > MAX_K {
            err_at!(InvalidInput, msg: "k {} out of bounds (1..={})", self.k, MAX_K)?;
        }
        if self.n == 0 || self.n > MAX_N {
            err_at!(InvalidInput, msg: "n {} out of bounds (1..={})", self.n, MAX_N)?;
        }
        if self.attnum == 0 || self.attnum > MAX_KEYS {
            err_at!(InvalidInput, msg: "attnum {} out of bounds (1..={})", self.attnum, MAX_KEYS)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
