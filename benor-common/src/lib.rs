//! lib.rs
//!
//! Shared types for the benor consensus simulator: node identifiers,
//! binary consensus values, vote messages, errors and simulation
//! configuration. Everything here is wire- and crate-neutral so both the
//! consensus core and the node boundary can depend on it.

pub mod config;
pub mod error;
pub mod node_id;
pub mod value;
pub mod vote;

pub use config::SimConfig;
pub use error::BenorError;
pub use node_id::NodeId;
pub use value::Value;
pub use vote::Vote;
