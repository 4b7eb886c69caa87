//! Domain model for collections, tags and paragraphs.
//!
//! # Responsibility
//! - Define the plain records returned by repositories and consumed by the
//!   markdown renderer.
//! - Own input validation and name normalization rules.
//!
//! # Invariants
//! - Every record is identified by a stable surrogate integer id.
//! - Deletion is represented by a `deleted_at` tombstone, never a hard delete.
//! - A paragraph's tag membership is a set.

pub mod collection;
pub mod paragraph;
pub mod slug;
pub mod tag;
pub mod validation;

pub use collection::{Collection, CollectionId};
pub use paragraph::{NewParagraph, Paragraph, ParagraphId, ParagraphPatch, ParagraphQuery};
pub use slug::slugify;
pub use tag::{normalize_tag_name, Tag, TagId};
pub use validation::ValidationError;
