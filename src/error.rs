use thiserror::Error;

pub type ImportResult<T> = Result<T, ImportError>;

#[derive(Debug, Error)]
pub enum ImportError {
    /// Token endpoint returned a non-success status, a malformed body or was unreachable
    #[error("token request failed: {0}")]
    Auth(String),

    #[error("GET {url} failed with status {status}")]
    Fetch { url: String, status: u16 },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid resource link '{link}': {reason}")]
    InvalidLink { link: String, reason: String },

    #[error("sink write failed: {0}")]
    Sink(#[source] anyhow::Error),

    #[error("branch task aborted: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("import cancelled")]
    Cancelled,
}

impl ImportError {
    /// Errors that make every remaining branch pointless.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Auth(_) | Self::Cancelled)
    }

    pub fn status(&self) -> Option<u16> {
        if let Self::Fetch { status, .. } = self {
            Some(*status)
        } else {
            None
        }
    }
}
