//! Bot error types.

use thiserror::Error;

/// Errors raised while parsing a button payload.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CallbackError {
    /// The payload matches no known button.
    #[error("Unrecognized callback payload: {0}")]
    Unrecognized(String),

    /// The payload carries a position that is not a number.
    #[error("Invalid index '{index}' in callback payload {data}")]
    InvalidIndex { data: String, index: String },
}
