use super::{coerce, SnapshotStore};
use crate::models::Property;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Snapshot store backed by `Arc<RwLock<HashMap>>`.
///
/// Cloning shares the same underlying storage.
#[derive(Clone, Default)]
pub struct InMemorySnapshotStore {
    storage: Arc<RwLock<HashMap<String, Vec<Property>>>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn put(&self, key: &str, properties: &[Property]) -> Result<()> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| anyhow!("snapshot lock poisoned"))?;
        storage.insert(key.to_string(), coerce(properties));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<Property>>> {
        let storage = self
            .storage
            .read()
            .map_err(|_| anyhow!("snapshot lock poisoned"))?;
        Ok(storage.get(key).cloned())
    }
}
