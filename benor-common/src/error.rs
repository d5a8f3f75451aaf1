// benor-common/src/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BenorError {
    #[error("Invalid config: {0}")]
    Config(String),

    #[error("Node is stopped")]
    NodeStopped,

    #[error("Node is faulty")]
    NodeFaulty,

    #[error("Invalid vote received: {0}")]
    InvalidVote(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
