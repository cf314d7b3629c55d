use thiserror::Error;

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("malformed aggregate payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("inconsistent {kind} payload: {reason}")]
    Inconsistent { kind: &'static str, reason: String },
}

impl AnalyticsError {
    pub(crate) fn inconsistent(kind: &'static str, reason: impl Into<String>) -> Self {
        Self::Inconsistent {
            kind,
            reason: reason.into(),
        }
    }
}
