//! JSON file instance repository
//!
//! All records live in a single `instances.json` inside the data directory.
//! The file is loaded once on open and rewritten whole after each change.

use crate::{InstanceRecord, InstanceRepository, Result, StorageError};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const INSTANCES_FILE: &str = "instances.json";

pub struct FileRepository {
    data_dir: PathBuf,
    records: BTreeMap<String, InstanceRecord>,
}

impl FileRepository {
    /// Open the data directory, creating it when missing
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data_dir = path.as_ref().to_path_buf();

        if !data_dir.exists() {
            fs::create_dir_all(&data_dir)?;
        }

        let file = data_dir.join(INSTANCES_FILE);
        let records = if file.exists() {
            let data = fs::read_to_string(&file)?;
            serde_json::from_str(&data)
                .map_err(|e| StorageError::SerializationError(e.to_string()))?
        } else {
            BTreeMap::new()
        };
        log::debug!(
            "Opened instance repository at {} ({} records)",
            data_dir.display(),
            records.len()
        );

        Ok(Self { data_dir, records })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn persist(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.records)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(self.data_dir.join(INSTANCES_FILE), json)?;
        Ok(())
    }
}

impl InstanceRepository for FileRepository {
    fn get(&self, id: &str) -> Result<Option<InstanceRecord>> {
        Ok(self.records.get(id).cloned())
    }

    fn put(&mut self, record: InstanceRecord) -> Result<()> {
        log::info!("Recording instance {} ({})", record.id, record.label);
        self.records.insert(record.id.clone(), record);
        self.persist()
    }

    fn list(&self) -> Result<Vec<InstanceRecord>> {
        Ok(self.records.values().cloned().collect())
    }

    fn remove(&mut self, id: &str) -> Result<bool> {
        if self.records.remove(id).is_none() {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }
}
