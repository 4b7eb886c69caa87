//! Tag record and name normalization.

use crate::model::slug::slugify;
use crate::model::validation::ValidationError;
use serde::{Deserialize, Serialize};

/// Surrogate key of a tag row.
pub type TagId = i64;

/// Topical label attached to paragraphs.
///
/// Ordering and equality use the whole row with `id` first, so a set of tags
/// iterates in id order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    /// Normalized unique name (see [`normalize_tag_name`]).
    pub name: String,
    /// Free text shown in rendered output. Defaults to the raw name.
    pub description: Option<String>,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds.
    pub updated_at: i64,
    /// Soft delete tombstone in epoch milliseconds.
    pub deleted_at: Option<i64>,
}

impl Tag {
    /// Text used for headings and links: the description, else the name.
    pub fn display_text(&self) -> &str {
        match self.description.as_deref() {
            Some(description) if !description.trim().is_empty() => description,
            _ => self.name.as_str(),
        }
    }

    /// Returns whether this tag is visible (not tombstoned).
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Normalizes a raw tag name and rejects names that normalize to nothing.
pub fn normalize_tag_name(raw: &str) -> Result<String, ValidationError> {
    let normalized = slugify(raw);
    if normalized.is_empty() {
        return Err(ValidationError::EmptyTagName(raw.to_string()));
    }
    Ok(normalized)
}
