//! Strongbox Storage Layer - Instance Repository
//!
//! Keeps track of the treasury instances this operator has published:
//! - One record per instance, keyed by the configuration's identifier
//! - In-memory repository for tests and one-shot runs
//! - JSON file repository, rewritten whole on every change

use thiserror::Error;

pub mod file;
pub mod memory;
pub mod record;

pub use file::FileRepository;
pub use memory::MemoryRepository;
pub use record::InstanceRecord;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Instance not found: {0}")]
    InstanceNotFound(String),

    #[error("Invalid instance: {0}")]
    InvalidInstance(#[from] strongbox_core::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage for published treasury instances
pub trait InstanceRepository: Send + Sync {
    fn get(&self, id: &str) -> Result<Option<InstanceRecord>>;

    /// Insert or replace the record with the same id
    fn put(&mut self, record: InstanceRecord) -> Result<()>;

    /// Every record, ordered by id
    fn list(&self) -> Result<Vec<InstanceRecord>>;

    /// Remove a record, returning whether it existed
    fn remove(&mut self, id: &str) -> Result<bool>;

    /// Like [`get`](Self::get), failing when the record is missing
    fn require(&self, id: &str) -> Result<InstanceRecord> {
        self.get(id)?
            .ok_or_else(|| StorageError::InstanceNotFound(id.to_string()))
    }
}
