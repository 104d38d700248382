//! Out-of-core storage for spectrum data points
//!
//! A [`DataPointStore`] persists [`DataPointContainer`]s and hands back an
//! opaque [`StoreHandle`] that resolves to a copy of the stored points. Three
//! backends share the same semantics and differ only in where the bytes live:
//!
//! | Backend | Where data lives | Created by |
//! |---------|------------------|------------|
//! | [`MemoryDataPointStore`] | process heap, one shared instance | [`DataPointStoreFactory::memory_store`] |
//! | [`TmpFileDataPointStore`] | append-only scratch file | [`DataPointStoreFactory::temp_file_store`] |
//! | [`EmbeddedDbDataPointStore`] | embedded SQLite database | [`DataPointStoreFactory::embedded_db_store`] |
//!
//! Stored data is always copied; mutating the caller's container after a
//! call to [`DataPointStore::store`] never changes what was stored.
//!
//! ```rust
//! use mzscan::datapoints::DataPointContainer;
//! use mzscan::store::{DataPointStore, DataPointStoreFactory};
//!
//! let store = DataPointStoreFactory::global().temp_file_store()?;
//! let mut points = DataPointContainer::new();
//! points.push(445.12, 1.0e5);
//! let handle = store.store(&points)?;
//! assert_eq!(store.retrieve(handle)?, points);
//! store.dispose()?;
//! # Ok::<(), mzscan::store::StoreError>(())
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::datapoints::DataPointContainer;

pub(crate) mod codec;
mod embedded;
mod error;
mod factory;
mod memory;
mod tmpfile;


pub use embedded::EmbeddedDbDataPointStore;
pub use error::StoreError;
pub use factory::DataPointStoreFactory;
pub use memory::MemoryDataPointStore;
pub use tmpfile::TmpFileDataPointStore;

/// Opaque identifier of a stored container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreHandle(pub(crate) u64);

impl StoreHandle {
    /// Raw numeric value of the handle
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for StoreHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The available storage backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreKind {
    /// Process heap, shared by every caller
    #[default]
    Memory,
    /// Private scratch file on local disk
    TempFile,
    /// Embedded database in a private scratch directory
    EmbeddedDb,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoreKind::Memory => "memory",
            StoreKind::TempFile => "temp-file",
            StoreKind::EmbeddedDb => "embedded-db",
        };
        f.write_str(name)
    }
}

/// A backend that persists data point containers.
///
/// Implementations are internally synchronised so a store can be shared
/// behind an `Arc`. Stored data survives until it is removed or the store is
/// disposed.
pub trait DataPointStore: Send + Sync + fmt::Debug {
    /// Which backend this is
    fn kind(&self) -> StoreKind;

    /// Persist a copy of `data` and return a handle to it
    fn store(&self, data: &DataPointContainer) -> Result<StoreHandle, StoreError>;

    /// Load the record behind `handle` into `buf`, replacing its contents
    fn retrieve_into(
        &self,
        handle: StoreHandle,
        buf: &mut DataPointContainer,
    ) -> Result<(), StoreError>;

    /// Load the record behind `handle` into a new container
    fn retrieve(&self, handle: StoreHandle) -> Result<DataPointContainer, StoreError> {
        let mut buf = DataPointContainer::new();
        self.retrieve_into(handle, &mut buf)?;
        Ok(buf)
    }

    /// Release a single record
    fn remove(&self, handle: StoreHandle) -> Result<(), StoreError>;

    /// Number of records currently held
    fn len(&self) -> usize;

    /// Returns true if the store holds no records
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Release every record and all backing resources
    fn dispose(&self) -> Result<(), StoreError>;
}
