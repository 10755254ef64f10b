use std::error::Error;
use thiserror::Error;

use crate::dao::models::RowId;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by row stores regardless of the underlying backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The store could not be reached or answered something unusable.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Human-readable summary.
        message: String,
        /// Backend failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The store answered, but with an error marker instead of rows.
    #[error("storage rejected the request: {message}")]
    Rejected {
        /// Message carried by the marker.
        message: String,
    },
    /// The addressed row does not exist.
    #[error("row `{id}` not found in table `{table}`")]
    Missing {
        /// Table identifier.
        table: String,
        /// Row that was addressed.
        id: RowId,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a rejection from the message carried by an error marker.
    pub fn rejected(message: impl Into<String>) -> Self {
        StorageError::Rejected {
            message: message.into(),
        }
    }
}
