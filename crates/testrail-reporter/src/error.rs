//! Error types for the TestRail reporter.

/// Reporter errors.
///
/// Every variant is recoverable from the host test run's point of view: the
/// caller decides whether a publishing failure matters.
#[derive(Debug, thiserror::Error)]
pub enum ReporterError {
    /// Credentials rejected (401/403).
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// Endpoint or entity not found (404).
    #[error("not found: {endpoint}")]
    NotFound { endpoint: String },

    /// Any other non-2xx response.
    #[error("TestRail API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Network error.
    #[error("network error: {message}")]
    Network { message: String },

    /// Invalid response body.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Operation requires a run but none has been created or adopted.
    #[error("no active test run: create_run must succeed first")]
    NoActiveRun,

    /// A run is already established for this publisher.
    #[error("test run {run_id} is already active")]
    RunAlreadyActive { run_id: u64 },
}

impl ReporterError {
    /// Whether the failure is likely transient (network or 5xx).
    ///
    /// Informational only; the reporter itself never retries.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ReporterError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

/// Result type for reporter operations.
pub type ReporterResult<T> = Result<T, ReporterError>;
