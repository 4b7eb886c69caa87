//! Markdown export of paragraphs.
//!
//! # Responsibility
//! - Turn hydrated paragraphs into one cross-referenced markdown document.
//! - Build anchor links with the same normalization as tag names.
//!
//! # Invariants
//! - Rendering is pure: no I/O, no mutation of the input.
//! - Same input (same order, same tag sets) gives byte-identical output.

mod document;
mod link;

pub use document::{render_document, EXCERPTS_HEADING, TOPICS_INDEX_HEADING};
pub use link::{anchor, hyperlink};
