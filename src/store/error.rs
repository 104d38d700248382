use super::{StoreHandle, StoreKind};

/// Errors raised by data point stores
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing resource (scratch file, database) could not be allocated.
    ///
    /// Raised only while a store is being created, never by a store that
    /// opened successfully.
    #[error("Failed to initialize {kind} data point store: {source}")]
    Initialization {
        /// Backend that failed to initialize
        kind: StoreKind,
        /// Underlying cause
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// I/O error while reading or writing the scratch file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from the embedded database engine
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// The handle does not refer to a record in this store
    #[error("Unknown data point handle: {0}")]
    UnknownHandle(StoreHandle),

    /// A stored record could not be decoded
    #[error("Corrupted record {handle}: {reason}")]
    CorruptedRecord {
        /// Handle of the damaged record
        handle: StoreHandle,
        /// What was wrong with it
        reason: String,
    },

    /// The store was disposed and no longer holds any data
    #[error("{0} data point store has been disposed")]
    Disposed(StoreKind),
}

impl StoreError {
    pub(crate) fn initialization<E>(kind: StoreKind, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        StoreError::Initialization {
            kind,
            source: source.into(),
        }
    }

    /// Returns true if this error was raised while creating a store
    pub fn is_initialization(&self) -> bool {
        matches!(self, StoreError::Initialization { .. })
    }
}
