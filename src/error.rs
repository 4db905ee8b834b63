use thiserror::Error;

/// Errors raised while talking to the realtime store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid store path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("store returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("could not decode store payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("subscription to {path} was cancelled: {reason}")]
    Cancelled { path: String, reason: String },

    #[error("subscription to {0} closed")]
    Closed(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised when validating the station edit form.
#[derive(Debug, Error, PartialEq)]
pub enum FormError {
    #[error("{field} is not a number: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("{field} {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("station name {name:?} cannot be used as a listing key: {reason}")]
    InvalidName { name: String, reason: &'static str },
}
