use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension};
use tempfile::TempDir;

use super::codec;
use super::{DataPointStore, StoreError, StoreHandle, StoreKind};
use crate::datapoints::DataPointContainer;

const DATABASE_FILE_NAME: &str = "datapoints.sqlite";

const CREATE_TABLE_SQL: &str = "
    PRAGMA journal_mode = OFF;
    PRAGMA synchronous = OFF;
    CREATE TABLE data_points (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        point_count INTEGER NOT NULL,
        mz BLOB NOT NULL,
        intensity BLOB NOT NULL
    );
";

#[derive(Debug)]
struct Database {
    conn: Connection,
    dir: TempDir,
    records: usize,
    mz_bytes: Vec<u8>,
    intensity_bytes: Vec<u8>,
}

/// Store backed by an embedded SQLite database.
///
/// The database lives in a private scratch directory that is removed on
/// [`dispose`](DataPointStore::dispose) or drop. m/z and intensity values are
/// kept in separate little-endian blob columns.
#[derive(Debug)]
pub struct EmbeddedDbDataPointStore {
    path: PathBuf,
    inner: Mutex<Option<Database>>,
}

impl EmbeddedDbDataPointStore {
    /// Create a store whose database directory lives in `dir`.
    ///
    /// Fails with [`StoreError::Initialization`] if the directory or the
    /// database cannot be created.
    pub fn new_in<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
        let init_err = |e: Box<dyn std::error::Error + Send + Sync>| {
            StoreError::initialization(StoreKind::EmbeddedDb, e)
        };

        let dir = tempfile::Builder::new()
            .prefix("mzscan-db-")
            .tempdir_in(dir.as_ref())
            .map_err(|e| init_err(e.into()))?;
        let path = dir.path().join(DATABASE_FILE_NAME);
        let conn = Connection::open(&path).map_err(|e| init_err(e.into()))?;
        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(|e| init_err(e.into()))?;
        info!("Created embedded data point store {}", path.display());

        Ok(Self {
            path,
            inner: Mutex::new(Some(Database {
                conn,
                dir,
                records: 0,
                mz_bytes: Vec::new(),
                intensity_bytes: Vec::new(),
            })),
        })
    }

    /// Create a store in the system temporary directory
    pub fn new() -> Result<Self, StoreError> {
        Self::new_in(std::env::temp_dir())
    }

    /// Path of the database file. It no longer exists after disposal.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn inner(&self) -> MutexGuard<'_, Option<Database>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DataPointStore for EmbeddedDbDataPointStore {
    fn kind(&self) -> StoreKind {
        StoreKind::EmbeddedDb
    }

    fn store(&self, data: &DataPointContainer) -> Result<StoreHandle, StoreError> {
        let mut guard = self.inner();
        let db = guard.as_mut().ok_or(StoreError::Disposed(StoreKind::EmbeddedDb))?;

        let count = codec::record_count(data.len())?;
        db.mz_bytes.clear();
        db.intensity_bytes.clear();
        codec::encode_mz(data.mz_buffer(), &mut db.mz_bytes)?;
        codec::encode_intensity(data.intensity_buffer(), &mut db.intensity_bytes)?;

        db.conn.execute(
            "INSERT INTO data_points (point_count, mz, intensity) VALUES (?1, ?2, ?3)",
            params![count, db.mz_bytes, db.intensity_bytes],
        )?;
        db.records += 1;
        Ok(StoreHandle(db.conn.last_insert_rowid() as u64))
    }

    fn retrieve_into(
        &self,
        handle: StoreHandle,
        buf: &mut DataPointContainer,
    ) -> Result<(), StoreError> {
        let guard = self.inner();
        let db = guard.as_ref().ok_or(StoreError::Disposed(StoreKind::EmbeddedDb))?;

        let row: Option<(i64, Vec<u8>, Vec<u8>)> = db
            .conn
            .query_row(
                "SELECT point_count, mz, intensity FROM data_points WHERE id = ?1",
                params![handle.0 as i64],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        let (count, mz, intensity) = row.ok_or(StoreError::UnknownHandle(handle))?;
        if count < 0 {
            return Err(StoreError::CorruptedRecord {
                handle,
                reason: format!("negative point count {}", count),
            });
        }
        codec::decode_columns(&mz, &intensity, count as usize, handle, buf)
    }

    fn remove(&self, handle: StoreHandle) -> Result<(), StoreError> {
        let mut guard = self.inner();
        let db = guard.as_mut().ok_or(StoreError::Disposed(StoreKind::EmbeddedDb))?;

        let deleted = db.conn.execute(
            "DELETE FROM data_points WHERE id = ?1",
            params![handle.0 as i64],
        )?;
        if deleted == 0 {
            return Err(StoreError::UnknownHandle(handle));
        }
        db.records -= 1;
        Ok(())
    }

    fn len(&self) -> usize {
        self.inner().as_ref().map_or(0, |db| db.records)
    }

    fn dispose(&self) -> Result<(), StoreError> {
        let Some(db) = self.inner().take() else {
            return Ok(());
        };
        debug!(
            "Closing embedded data point store {} ({} records)",
            self.path.display(),
            db.records
        );
        db.conn.close().map_err(|(_, e)| e)?;
        db.dir.close()?;
        Ok(())
    }
}
