use thiserror::Error;

/// Failures of a single unsubscribe attempt.
#[derive(Debug, Error)]
pub enum UnsubscribeError {
    #[error("unsupported unsubscribe scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid unsubscribe target {target:?}")]
    InvalidTarget {
        target: String,
        #[source]
        source: url::ParseError,
    },

    /// A remote or prompt failure. Not recoverable within the run.
    #[error(transparent)]
    Remote(#[from] anyhow::Error),
}

impl UnsubscribeError {
    /// Whether the error only invalidates the current message's attempt.
    pub fn is_per_message(&self) -> bool {
        !matches!(self, UnsubscribeError::Remote(_))
    }
}
