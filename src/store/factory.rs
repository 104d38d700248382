use std::path::Path;
use std::sync::{Arc, OnceLock};

use super::{
    DataPointStore, EmbeddedDbDataPointStore, MemoryDataPointStore, StoreError, StoreKind,
    TmpFileDataPointStore,
};

static GLOBAL_FACTORY: OnceLock<DataPointStoreFactory> = OnceLock::new();

/// Hands out data point stores.
///
/// The factory owns the in-memory store; every call to
/// [`memory_store`](Self::memory_store) returns a new reference to that same
/// instance. File and database stores are created fresh on every call.
/// [`global`](Self::global) gives access to one factory for the whole process.
#[derive(Debug, Clone, Default)]
pub struct DataPointStoreFactory {
    memory: Arc<MemoryDataPointStore>,
}

impl DataPointStoreFactory {
    /// Create a factory with its own in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide factory, created on first use
    pub fn global() -> &'static DataPointStoreFactory {
        GLOBAL_FACTORY.get_or_init(DataPointStoreFactory::new)
    }

    /// The shared in-memory store. Never fails.
    pub fn memory_store(&self) -> Arc<dyn DataPointStore> {
        self.memory.clone()
    }

    /// A new store backed by a scratch file in the system temporary directory
    pub fn temp_file_store(&self) -> Result<Arc<dyn DataPointStore>, StoreError> {
        Ok(Arc::new(TmpFileDataPointStore::new()?))
    }

    /// A new store backed by a scratch file in `dir`
    pub fn temp_file_store_in<P: AsRef<Path>>(
        &self,
        dir: P,
    ) -> Result<Arc<dyn DataPointStore>, StoreError> {
        Ok(Arc::new(TmpFileDataPointStore::new_in(dir)?))
    }

    /// A new store backed by an embedded database in the system temporary directory
    pub fn embedded_db_store(&self) -> Result<Arc<dyn DataPointStore>, StoreError> {
        Ok(Arc::new(EmbeddedDbDataPointStore::new()?))
    }

    /// A new store backed by an embedded database under `dir`
    pub fn embedded_db_store_in<P: AsRef<Path>>(
        &self,
        dir: P,
    ) -> Result<Arc<dyn DataPointStore>, StoreError> {
        Ok(Arc::new(EmbeddedDbDataPointStore::new_in(dir)?))
    }

    /// Acquire a store by kind.
    ///
    /// `scratch_dir` places the file and database backends; it is ignored for
    /// the in-memory store.
    pub fn create(
        &self,
        kind: StoreKind,
        scratch_dir: Option<&Path>,
    ) -> Result<Arc<dyn DataPointStore>, StoreError> {
        match (kind, scratch_dir) {
            (StoreKind::Memory, _) => Ok(self.memory_store()),
            (StoreKind::TempFile, Some(dir)) => self.temp_file_store_in(dir),
            (StoreKind::TempFile, None) => self.temp_file_store(),
            (StoreKind::EmbeddedDb, Some(dir)) => self.embedded_db_store_in(dir),
            (StoreKind::EmbeddedDb, None) => self.embedded_db_store(),
        }
    }
}
