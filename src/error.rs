//! Errors raised while talking to the content repository

use thiserror::Error;

/// Failures of a content-repository operation.
#[derive(Error, Debug)]
pub enum CmsError {
    #[error("Network failure: {0}")]
    Network(#[from] reqwest::Error),

    #[error("CMS returned HTTP {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("Malformed CMS response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("No {doc_type} document with uid '{uid}'")]
    NotFound { doc_type: String, uid: String },

    #[error("Invalid CMS endpoint '{0}'")]
    InvalidEndpoint(String),

    #[error("Refusing to follow page locator '{0}'")]
    InvalidLocator(String),

    #[error("CMS API did not advertise a master ref")]
    MissingMasterRef,

    #[error("Invalid publication timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("A page load is already in progress")]
    LoadInProgress,

    #[error("Failed to read fixture {path}: {source}")]
    Fixture {
        path: String,
        source: std::io::Error,
    },
}

impl CmsError {
    /// Whether the requested document simply does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type CmsResult<T> = std::result::Result<T, CmsError>;
