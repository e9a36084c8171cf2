//! In-memory instance repository

use crate::{InstanceRecord, InstanceRepository, Result};
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone)]
pub struct MemoryRepository {
    records: BTreeMap<String, InstanceRecord>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InstanceRepository for MemoryRepository {
    fn get(&self, id: &str) -> Result<Option<InstanceRecord>> {
        Ok(self.records.get(id).cloned())
    }

    fn put(&mut self, record: InstanceRecord) -> Result<()> {
        self.records.insert(record.id.clone(), record);
        Ok(())
    }

    fn list(&self) -> Result<Vec<InstanceRecord>> {
        Ok(self.records.values().cloned().collect())
    }

    fn remove(&mut self, id: &str) -> Result<bool> {
        Ok(self.records.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::sample;
    use crate::StorageError;

    #[test]
    fn test_put_get_remove() {
        let mut repo = MemoryRepository::new();
        let record = sample(5_000);

        repo.put(record.clone()).unwrap();
        assert_eq!(repo.get(&record.id).unwrap(), Some(record.clone()));
        assert_eq!(repo.list().unwrap().len(), 1);

        assert!(repo.remove(&record.id).unwrap());
        assert!(!repo.remove(&record.id).unwrap());
        assert!(matches!(
            repo.require(&record.id),
            Err(StorageError::InstanceNotFound(_))
        ));
    }
}
