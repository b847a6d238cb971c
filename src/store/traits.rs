//! `ResponseStore` trait: the single interface to durable intake results.

use async_trait::async_trait;

use super::record::ResponseRecord;
use super::table::Table;
use crate::error::PersistenceError;

/// Append-only store of completed intakes.
///
/// Implementations own read-modify-write access to their backing file and
/// assume a single writer: two appends racing on the same store may lose one
/// of the records.
#[async_trait]
pub trait ResponseStore: Send + Sync {
    /// Append one record. Errors are surfaced as-is; there is no retry.
    async fn append(&self, record: &ResponseRecord) -> Result<(), PersistenceError>;

    /// Load every persisted row. A store that does not exist yet is `None`.
    async fn load(&self) -> Result<Option<Table>, PersistenceError>;

    /// Delete all persisted rows.
    async fn reset(&self) -> Result<(), PersistenceError>;
}
