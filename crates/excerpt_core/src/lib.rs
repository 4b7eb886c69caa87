//! Core domain logic for the excerpt library.
//! This crate is the single source of truth for storage invariants and the
//! markdown export; CLI/API layers only call into it.

pub mod config;
pub mod db;
pub mod editor;
pub mod logging;
pub mod markdown;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{DuplicateTagPolicy, LibraryConfig};
pub use db::{ConnectionProvider, FileConnectionProvider};
pub use editor::{EditorError, EditorProgram, ExternalEditor, TextEditor};
pub use logging::{default_log_level, init_logging, logging_status, LogSink, LoggingError};
pub use markdown::{hyperlink, render_document};
pub use model::{
    normalize_tag_name, slugify, Collection, CollectionId, NewParagraph, Paragraph, ParagraphId,
    ParagraphPatch, ParagraphQuery, Tag, TagId, ValidationError,
};
pub use repo::collection_repo::{CollectionRepository, SqliteCollectionRepository};
pub use repo::paragraph_repo::{ParagraphRepository, SqliteParagraphRepository};
pub use repo::tag_repo::{SqliteTagRepository, TagRepository};
pub use repo::{Entity, RepoError, RepoResult};
pub use service::library_service::{LibraryService, ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
