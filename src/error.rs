//! Error types for modelmux.

/// Result type alias for modelmux operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for modelmux.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid routing constraints: {0}")]
    InvalidConstraints(String),

    #[error("No suitable model: {0}")]
    NoSuitableModel(String),

    #[error("No provider registered for model '{model}'")]
    NoProviderRegistered { model: String },

    #[error("Provider rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Provider authentication failed: {0}")]
    Auth(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("All provider attempts failed")]
    AllAttemptsFailed {
        #[source]
        last: Option<Box<Error>>,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether a provider adapter should retry this error with backoff.
    ///
    /// Only rate limits and outages are transient; auth failures and
    /// malformed-response errors surface immediately.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::RateLimited(_) | Error::Unavailable(_))
    }
}
