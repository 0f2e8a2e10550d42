use std::{path::Path, sync::Arc};

pub mod models;
pub mod slot;

use slot::{FileSlotStorage, MemorySlotStorage, SlotStorage, StorageError};

/// Handle to the local key-value slots backing the application.
///
/// Cheap to clone; every clone shares the same underlying storage.
#[derive(Clone)]
pub struct DBService {
    pub storage: Arc<dyn SlotStorage>,
}

impl DBService {
    /// Opens file-backed slots under `data_dir`, creating the directory if needed.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<DBService, StorageError> {
        let storage = FileSlotStorage::open(data_dir)?;
        Ok(DBService {
            storage: Arc::new(storage),
        })
    }

    /// Slots that live only as long as this handle (and its clones).
    pub fn in_memory() -> DBService {
        DBService {
            storage: Arc::new(MemorySlotStorage::default()),
        }
    }
}
