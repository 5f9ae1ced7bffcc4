//! Error types shared across LeapMove crates.

/// Top-level error type for LeapMove operations.
#[derive(Debug, thiserror::Error)]
pub enum LeapmoveError {
    /// The sensor could not be reached when starting a frame source.
    #[error("Sensor connection error: {message}")]
    Connection { message: String },

    #[error("Sensor driver error: {message}")]
    Driver { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using LeapmoveError.
pub type LeapmoveResult<T> = Result<T, LeapmoveError>;

impl LeapmoveError {
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection {
            message: msg.into(),
        }
    }

    pub fn driver(msg: impl Into<String>) -> Self {
        Self::Driver {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether this error means the sensor was unreachable.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}
