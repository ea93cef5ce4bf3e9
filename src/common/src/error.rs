use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure to obtain a pricing catalog. A missing price is not an error.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("pricing endpoint {url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("pricing document from {url} is not valid JSON")]
    InvalidBody {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// `transient` is false for rejections such as access denied or bad
    /// parameters that will fail the same way on every attempt.
    #[error("pricing query for service {service} failed: {message}")]
    Service {
        service: String,
        message: String,
        transient: bool,
    },
}

impl RetrievalError {
    pub fn transport(url: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Transport {
            url: url.into(),
            source: source.into(),
        }
    }

    /// Worth another attempt: throttling, server-side failures and transport errors.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Transport { .. } => true,
            Self::Service { transient, .. } => *transient,
            Self::InvalidBody { .. } => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum SinkError {
    /// The stored record changed between the read and the conditional write.
    #[error("savings record for account {account_id} in {region} was modified concurrently")]
    Conflict { account_id: String, region: String },

    #[error("store rejected the operation: {message}")]
    Rejected { message: String },

    #[error("stored record is malformed: {message}")]
    InvalidRecord { message: String },
}

impl SinkError {
    pub fn rejected(err: impl std::fmt::Display) -> Self {
        Self::Rejected {
            message: err.to_string(),
        }
    }

    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            message: message.into(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
