use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{service} returned {status}: {message}")]
    Upstream {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL '{0}'")]
    InvalidUrl(String),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

impl StoreError {
    /// True when the failure came from the remote service or the network,
    /// as opposed to local configuration or IO.
    pub fn is_upstream(&self) -> bool {
        matches!(self, StoreError::Upstream { .. } | StoreError::Http(_))
    }
}
