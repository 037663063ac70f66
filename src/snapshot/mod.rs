//! Storage for the most recently served page of records.

mod file;
mod in_memory;

pub use file::JsonFileSnapshotStore;
pub use in_memory::InMemorySnapshotStore;

use crate::models::Property;
use anyhow::Result;
use async_trait::async_trait;

/// Key under which `/scrape` and `/search` store the page they served.
pub const LAST_RESULT_KEY: &str = "results";

/// Overwrite-only store of record snapshots.
///
/// Each `put` replaces whatever was stored under the key. Concurrent writers
/// are not coordinated; the last write wins.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Replace the snapshot stored under `key`.
    async fn put(&self, key: &str, properties: &[Property]) -> Result<()>;

    /// Read the snapshot stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Vec<Property>>>;
}

/// Records as they are persisted: dates become strings.
fn coerce(properties: &[Property]) -> Vec<Property> {
    properties.iter().map(Property::coerced).collect()
}
