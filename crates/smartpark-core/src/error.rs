use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Controller line protocol errors
    #[error("Invalid message format: {message}")]
    InvalidMessageFormat { message: String },

    #[error("Invalid slot state: {value}")]
    InvalidSlotState { value: i64 },

    #[error("Line too long: {size} bytes (max {max_size})")]
    LineTooLong { size: usize, max_size: usize },

    // Remote document errors
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    // Lifecycle errors
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
