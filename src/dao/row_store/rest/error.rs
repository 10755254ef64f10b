//! Error types shared by the REST row store implementation.

use reqwest::StatusCode;
use thiserror::Error;

use crate::dao::storage::StorageError;

/// Convenient result alias returning [`RestDaoError`] failures.
pub type RestResult<T> = Result<T, RestDaoError>;

/// Failures that can occur while talking to the hosted row store.
#[derive(Debug, Error)]
pub enum RestDaoError {
    /// Required environment variable is missing.
    #[error("missing row store environment variable `{var}`")]
    MissingEnvVar {
        /// Name of the variable.
        var: &'static str,
    },
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build row store client")]
    ClientBuilder {
        /// Underlying builder failure.
        #[source]
        source: reqwest::Error,
    },
    /// A request could not be sent or timed out.
    #[error("failed to send row store request to `{path}`")]
    RequestSend {
        /// Path the request was aimed at.
        path: String,
        /// Transport failure.
        #[source]
        source: reqwest::Error,
    },
    /// The store returned an unexpected status code without an error marker.
    #[error("unexpected row store response status {status} for `{path}`")]
    RequestStatus {
        /// Path the request was aimed at.
        path: String,
        /// Status returned by the store.
        status: StatusCode,
    },
    /// Response payload could not be read as JSON.
    #[error("failed to decode row store response for `{path}`")]
    DecodeResponse {
        /// Path the request was aimed at.
        path: String,
        /// Body read failure.
        #[source]
        source: reqwest::Error,
    },
    /// JSON payload did not have any of the expected shapes.
    #[error("unexpected row store payload for `{path}`")]
    UnexpectedPayload {
        /// Path the request was aimed at.
        path: String,
        /// Shape mismatch.
        #[source]
        source: serde_json::Error,
    },
    /// The store answered with an `error` marker.
    #[error("row store rejected `{path}`: {message}")]
    Rejected {
        /// Path the request was aimed at.
        path: String,
        /// `error (detail)` as carried by the marker.
        message: String,
    },
}

impl From<RestDaoError> for StorageError {
    fn from(err: RestDaoError) -> Self {
        match err {
            RestDaoError::Rejected { .. } => StorageError::rejected(err.to_string()),
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
