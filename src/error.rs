use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed timestamp {value:?}: {reason}")]
    MalformedTimestamp { value: String, reason: String },

    #[error("non-finite {field} value at {timestamp}")]
    NonFiniteValue {
        field: &'static str,
        timestamp: String,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
