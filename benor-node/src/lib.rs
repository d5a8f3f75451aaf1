//! lib.rs
//!
//! The node boundary: per-node REST API, HTTP vote transport with retries,
//! and the orchestrator that launches a whole simulated cluster.

pub mod api;
pub mod cli;
pub mod launcher;
pub mod transport;

pub use launcher::{launch, ClusterHandle, NodeHandle};
