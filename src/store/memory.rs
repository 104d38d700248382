use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use log::debug;

use super::{DataPointStore, StoreError, StoreHandle, StoreKind};
use crate::datapoints::DataPointContainer;

/// Heap-backed store.
///
/// One instance is shared process-wide through
/// [`DataPointStoreFactory`](super::DataPointStoreFactory); callers must not
/// assume they are its only user. [`dispose`](DataPointStore::dispose) drops
/// every record but leaves the store usable.
#[derive(Debug, Default)]
pub struct MemoryDataPointStore {
    records: Mutex<HashMap<StoreHandle, DataPointContainer>>,
    next_id: AtomicU64,
}

impl MemoryDataPointStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> MutexGuard<'_, HashMap<StoreHandle, DataPointContainer>> {
        // A panic while holding the lock cannot leave a half-written record behind.
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DataPointStore for MemoryDataPointStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Memory
    }

    fn store(&self, data: &DataPointContainer) -> Result<StoreHandle, StoreError> {
        let handle = StoreHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.records().insert(handle, data.clone());
        Ok(handle)
    }

    fn retrieve_into(
        &self,
        handle: StoreHandle,
        buf: &mut DataPointContainer,
    ) -> Result<(), StoreError> {
        let records = self.records();
        let stored = records
            .get(&handle)
            .ok_or(StoreError::UnknownHandle(handle))?;
        buf.copy_from(stored);
        Ok(())
    }

    fn remove(&self, handle: StoreHandle) -> Result<(), StoreError> {
        self.records()
            .remove(&handle)
            .map(|_| ())
            .ok_or(StoreError::UnknownHandle(handle))
    }

    fn len(&self) -> usize {
        self.records().len()
    }

    fn dispose(&self) -> Result<(), StoreError> {
        let mut records = self.records();
        debug!("Releasing {} in-memory data point records", records.len());
        records.clear();
        records.shrink_to_fit();
        Ok(())
    }
}
