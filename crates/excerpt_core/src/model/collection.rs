//! Collection record.

use serde::{Deserialize, Serialize};

/// Surrogate key of a collection row.
pub type CollectionId = i64;

/// Named group that owns paragraphs.
///
/// A collection never enumerates its paragraphs; listing them is a
/// paragraph query filtered by `collection_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Collection {
    pub id: CollectionId,
    /// Unique, non-empty display name.
    pub name: String,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds.
    pub updated_at: i64,
    /// Soft delete tombstone in epoch milliseconds.
    pub deleted_at: Option<i64>,
}
