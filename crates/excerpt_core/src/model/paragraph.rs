//! Paragraph record and its write/query inputs.
//!
//! # Invariants
//! - A paragraph belongs to exactly one collection, fixed at creation.
//! - `tags` is a set; hydrated records never share it with other records.
//! - Title and content are never blank.

use crate::model::collection::{Collection, CollectionId};
use crate::model::tag::{Tag, TagId};
use crate::model::validation::{require_text, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Surrogate key of a paragraph row.
pub type ParagraphId = i64;

/// Fully hydrated excerpt with its owning collection and active tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    pub id: ParagraphId,
    pub title: String,
    /// Multi-line body, stored verbatim.
    pub content: String,
    pub collection: Collection,
    pub tags: BTreeSet<Tag>,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds.
    pub updated_at: i64,
    /// Soft delete tombstone in epoch milliseconds.
    pub deleted_at: Option<i64>,
}

impl Paragraph {
    /// Ids of the attached tags, in ascending order.
    pub fn tag_ids(&self) -> BTreeSet<TagId> {
        self.tags.iter().map(|tag| tag.id).collect()
    }

    /// Returns whether this paragraph is visible (not tombstoned).
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Input for paragraph creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewParagraph {
    pub collection_id: CollectionId,
    pub title: String,
    pub content: String,
    /// Duplicates are absorbed; ids without an active tag row are dropped.
    #[serde(default)]
    pub tag_ids: Vec<TagId>,
}

impl NewParagraph {
    pub fn new(
        collection_id: CollectionId,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            collection_id,
            title: title.into(),
            content: content.into(),
            tag_ids: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tag_ids: impl IntoIterator<Item = TagId>) -> Self {
        self.tag_ids = tag_ids.into_iter().collect();
        self
    }

    /// Checks that title and content carry visible text.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)?;
        require_text("content", &self.content)
    }
}

/// Partial update for an existing paragraph.
///
/// `None` leaves a field untouched. `tag_ids: Some(..)` replaces the whole
/// tag set, `Some(vec![])` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tag_ids: Option<Vec<TagId>>,
}

impl ParagraphPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.tag_ids.is_none()
    }

    /// Requires at least one field, and non-blank text for supplied scalars.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::NothingToUpdate);
        }
        if let Some(title) = self.title.as_deref() {
            require_text("title", title)?;
        }
        if let Some(content) = self.content.as_deref() {
            require_text("content", content)?;
        }
        Ok(())
    }
}

/// Filters for paragraph lookups. Both filters combine with AND.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParagraphQuery {
    pub paragraph_id: Option<ParagraphId>,
    pub collection_id: Option<CollectionId>,
}

impl ParagraphQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(paragraph_id: ParagraphId) -> Self {
        Self {
            paragraph_id: Some(paragraph_id),
            collection_id: None,
        }
    }

    pub fn in_collection(collection_id: CollectionId) -> Self {
        Self {
            paragraph_id: None,
            collection_id: Some(collection_id),
        }
    }
}
