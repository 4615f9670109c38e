//! Error types for minidfs

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Network Errors ===
    #[error("node unreachable: {0}")]
    Unreachable(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    // === Orchestration Errors ===
    #[error("fragment {index} of {name} unavailable after {attempts} attempts")]
    FragmentExhausted {
        name: String,
        index: usize,
        attempts: usize,
    },

    #[error("deletion incomplete: {0}")]
    DeletionFailed(String),

    #[error("only {reachable} of {total} storage nodes reachable, need {required}")]
    TooFewNodes {
        reachable: usize,
        total: usize,
        required: usize,
    },

    // === Request Errors ===
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("invalid object name: {0}")]
    InvalidName(String),

    // === Config Errors ===
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // === Generic ===
    #[error("{0}")]
    Other(String),
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}
