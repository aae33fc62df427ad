use thiserror::Error;

#[derive(Error, Debug)]
pub enum LineError {
    /// The point cannot be serialized in its current state.
    #[error("Invalid point state: {0}")]
    InvalidState(String),

    #[error("Point pool exhausted: no instance freed within {timeout_ms}ms")]
    PoolExhausted { timeout_ms: u64 },

    #[error("Point pool has been shut down")]
    PoolShutdown,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for lineflux operations
pub type Result<T> = std::result::Result<T, LineError>;

impl LineError {
    /// Creates a new invalid-state error
    pub fn invalid_state<S: Into<String>>(msg: S) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Creates a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a new parse error
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Returns true if the caller may retry the same operation later.
    ///
    /// Only pool exhaustion qualifies; backoff is left to the caller.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::PoolExhausted { .. })
    }

    /// Returns the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidState(_) => "validation",
            Self::PoolExhausted { .. } | Self::PoolShutdown => "pool",
            Self::Io(_) => "io",
            Self::Config(_) => "config",
            Self::Parse { .. } | Self::Serialization(_) => "serialization",
        }
    }
}
