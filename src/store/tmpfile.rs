use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use log::{debug, info};
use tempfile::NamedTempFile;

use super::codec;
use super::{DataPointStore, StoreError, StoreHandle, StoreKind};
use crate::datapoints::DataPointContainer;

/// Location of one record inside the scratch file
#[derive(Debug, Clone, Copy)]
struct RecordSpan {
    offset: u64,
    len: usize,
}

#[derive(Debug)]
struct ScratchFile {
    file: NamedTempFile,
    index: HashMap<StoreHandle, RecordSpan>,
    end: u64,
    next_id: u64,
    bytes: Vec<u8>,
}

/// Store that appends encoded records to a private scratch file.
///
/// The file is created when the store is constructed and deleted on
/// [`dispose`](DataPointStore::dispose) or drop. Removed records are dropped
/// from the index; their bytes stay in the file until disposal.
#[derive(Debug)]
pub struct TmpFileDataPointStore {
    path: PathBuf,
    inner: Mutex<Option<ScratchFile>>,
}

impl TmpFileDataPointStore {
    /// Create a store with its scratch file in `dir`.
    ///
    /// Fails with [`StoreError::Initialization`] if the file cannot be created.
    pub fn new_in<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
        let file = tempfile::Builder::new()
            .prefix("mzscan-datapoints-")
            .suffix(".tmp")
            .tempfile_in(dir.as_ref())
            .map_err(|e| StoreError::initialization(StoreKind::TempFile, e))?;
        let path = file.path().to_path_buf();
        info!("Created temporary data point store {}", path.display());

        Ok(Self {
            path,
            inner: Mutex::new(Some(ScratchFile {
                file,
                index: HashMap::new(),
                end: 0,
                next_id: 0,
                bytes: Vec::new(),
            })),
        })
    }

    /// Create a store in the system temporary directory
    pub fn new() -> Result<Self, StoreError> {
        Self::new_in(std::env::temp_dir())
    }

    /// Path of the scratch file. It no longer exists after disposal.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn inner(&self) -> MutexGuard<'_, Option<ScratchFile>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DataPointStore for TmpFileDataPointStore {
    fn kind(&self) -> StoreKind {
        StoreKind::TempFile
    }

    fn store(&self, data: &DataPointContainer) -> Result<StoreHandle, StoreError> {
        let mut guard = self.inner();
        let scratch = guard.as_mut().ok_or(StoreError::Disposed(StoreKind::TempFile))?;

        codec::encode_record(data, &mut scratch.bytes)?;
        let offset = scratch.end;
        let file = scratch.file.as_file_mut();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(&scratch.bytes)?;

        let handle = StoreHandle(scratch.next_id);
        scratch.next_id += 1;
        scratch.end += scratch.bytes.len() as u64;
        scratch.index.insert(
            handle,
            RecordSpan {
                offset,
                len: scratch.bytes.len(),
            },
        );
        Ok(handle)
    }

    fn retrieve_into(
        &self,
        handle: StoreHandle,
        buf: &mut DataPointContainer,
    ) -> Result<(), StoreError> {
        let mut guard = self.inner();
        let scratch = guard.as_mut().ok_or(StoreError::Disposed(StoreKind::TempFile))?;
        let span = *scratch
            .index
            .get(&handle)
            .ok_or(StoreError::UnknownHandle(handle))?;

        scratch.bytes.resize(span.len, 0);
        let file = scratch.file.as_file_mut();
        file.seek(SeekFrom::Start(span.offset))?;
        file.read_exact(&mut scratch.bytes)?;
        codec::decode_record(&scratch.bytes, handle, buf)
    }

    fn remove(&self, handle: StoreHandle) -> Result<(), StoreError> {
        let mut guard = self.inner();
        let scratch = guard.as_mut().ok_or(StoreError::Disposed(StoreKind::TempFile))?;
        scratch
            .index
            .remove(&handle)
            .map(|_| ())
            .ok_or(StoreError::UnknownHandle(handle))
    }

    fn len(&self) -> usize {
        self.inner().as_ref().map_or(0, |s| s.index.len())
    }

    fn dispose(&self) -> Result<(), StoreError> {
        let Some(scratch) = self.inner().take() else {
            return Ok(());
        };
        debug!(
            "Deleting scratch file {} ({} bytes, {} records)",
            self.path.display(),
            scratch.end,
            scratch.index.len()
        );
        scratch.file.close()?;
        Ok(())
    }
}
