//! config.rs
//!
//! Simulation configuration and protocol constants.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{BenorError, NodeId, Value};

/// Round cap: a node still undecided here forces a random decision.
pub const MAX_ROUNDS: u64 = 10;

/// Fixed collection window each round waits for peer votes.
pub const COLLECT_WINDOW: Duration = Duration::from_millis(500);

/// Attempts per peer before a send is dropped.
pub const MAX_RETRIES: u32 = 3;

/// Backoff between send attempts.
pub const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Node `i` listens on `BASE_NODE_PORT + i` unless overridden.
pub const BASE_NODE_PORT: u16 = 3000;

/// Parameters of one simulated cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Total number of nodes.
    pub n: usize,
    /// Number of faulty nodes tolerated (and present in `faulty`).
    pub f: usize,
    /// Initial value per node. Ignored for faulty nodes.
    pub initial_values: Vec<Value>,
    /// Which nodes are faulty, by index.
    pub faulty: Vec<bool>,
    /// First port of the cluster; node `i` listens on `base_port + i`.
    pub base_port: u16,
    /// Seed for the round engines' tie-break coin. `None` uses entropy.
    pub seed: Option<u64>,
}

impl SimConfig {
    pub fn new(n: usize, f: usize, initial_values: Vec<Value>, faulty: Vec<bool>) -> Self {
        Self {
            n,
            f,
            initial_values,
            faulty,
            base_port: BASE_NODE_PORT,
            seed: None,
        }
    }

    pub fn with_base_port(mut self, base_port: u16) -> Self {
        self.base_port = base_port;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Startup invariants. Violations are fatal before any node is created.
    pub fn validate(&self) -> Result<(), BenorError> {
        if self.initial_values.len() != self.n || self.faulty.len() != self.n {
            return Err(BenorError::Config(format!(
                "arrays don't match: n={}, {} initial values, {} faulty flags",
                self.n,
                self.initial_values.len(),
                self.faulty.len()
            )));
        }
        let faulty_count = self.faulty.iter().filter(|&&b| b).count();
        if faulty_count != self.f {
            return Err(BenorError::Config(format!(
                "faulty list has {} faulties, expected f={}",
                faulty_count, self.f
            )));
        }
        Ok(())
    }

    pub fn port_of(&self, id: NodeId) -> u16 {
        self.base_port + id.0 as u16
    }
}
