//! Ingestion error types.

use thiserror::Error;

use geoproof_store::StoreError;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("missing required fields: {0}")]
    MissingField(String),

    #[error("invalid GPS coordinates")]
    InvalidCoordinate,

    #[error("only image files (JPEG, JPG, PNG) are allowed")]
    UnsupportedMediaType,

    #[error("photo exceeds the maximum upload size of {max} bytes")]
    PayloadTooLarge { size: u64, max: u64 },

    #[error("could not allocate a unique transaction id")]
    IdRetriesExhausted,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IngestError {
    /// Whether this is a client error (bad submission) rather than a
    /// server-side failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingField(_)
                | Self::InvalidCoordinate
                | Self::UnsupportedMediaType
                | Self::PayloadTooLarge { .. }
        )
    }
}
