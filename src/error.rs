use thiserror::Error;

/// Failure of a single vendor API call.
///
/// Every remote call resolves to `Result<T, ApiError>`; callers log the error
/// and move on to the next task, account or pass.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// DNS, connect, timeout or body decoding failure.
    #[error("{0}")]
    Transport(String),

    /// The vendor answered with a non-zero `code` (or a non-200 status).
    #[error("{0}")]
    Vendor(String),

    /// The account already spent all of today's clicks.
    #[error("You have reached the maximum number of clicks today")]
    DailyLimit,
}

impl ApiError {
    pub fn is_daily_limit(&self) -> bool {
        matches!(self, ApiError::DailyLimit)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
