//! Library use-case service.
//!
//! # Responsibility
//! - Expose collection/tag/paragraph use-cases and markdown export.
//! - Acquire a fresh connection per call and release it on every exit path.
//! - Emit one metadata-only log event per use-case.
//!
//! # Invariants
//! - Every mutating use-case maps to exactly one repository transaction.
//! - No connection is held while an interactive editor is open.
//! - Created/updated paragraphs are returned from a read-back, never echoed.

use crate::config::{DuplicateTagPolicy, LibraryConfig};
use crate::db::{migrations, ConnectionProvider, DbError, FileConnectionProvider};
use crate::editor::{EditorError, TextEditor};
use crate::markdown::render_document;
use crate::model::{
    Collection, CollectionId, NewParagraph, Paragraph, ParagraphId, ParagraphPatch,
    ParagraphQuery, Tag,
};
use crate::repo::collection_repo::{CollectionRepository, SqliteCollectionRepository};
use crate::repo::paragraph_repo::{ParagraphRepository, SqliteParagraphRepository};
use crate::repo::tag_repo::{SqliteTagRepository, TagRepository};
use crate::repo::{Entity, RepoError};
use log::{error, info};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for library use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Repository contract failure (validation, not found, conflict, storage).
    Repo(RepoError),
    /// Interactive editing failed.
    Editor(EditorError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl ServiceError {
    /// Whether the failure was caused by caller input rather than the system.
    pub fn is_caller_error(&self) -> bool {
        match self {
            Self::Repo(err) => err.is_caller_error(),
            Self::Editor(_) | Self::InconsistentState(_) => false,
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Editor(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent library state: {details}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Editor(err) => Some(err),
            Self::InconsistentState(_) => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<DbError> for ServiceError {
    fn from(value: DbError) -> Self {
        Self::Repo(RepoError::Db(value))
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::from(value))
    }
}

impl From<EditorError> for ServiceError {
    fn from(value: EditorError) -> Self {
        Self::Editor(value)
    }
}

/// Use-case facade over the repositories.
pub struct LibraryService<P: ConnectionProvider> {
    provider: P,
    duplicate_tags: DuplicateTagPolicy,
}

impl LibraryService<FileConnectionProvider> {
    /// Creates a service over the configured database file.
    pub fn from_config(config: &LibraryConfig) -> Self {
        Self::new(config.connection_provider()).with_duplicate_tags(config.duplicate_tags)
    }
}

impl<P: ConnectionProvider> LibraryService<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            duplicate_tags: DuplicateTagPolicy::default(),
        }
    }

    pub fn with_duplicate_tags(mut self, policy: DuplicateTagPolicy) -> Self {
        self.duplicate_tags = policy;
        self
    }

    /// Opens the store once so that the schema exists; returns its version.
    pub fn init(&self) -> ServiceResult<u32> {
        self.run("db_init", |conn| {
            let version = migrations::current_version(conn)?;
            if version != migrations::latest_version() {
                return Err(ServiceError::InconsistentState(
                    "schema version differs from latest after migration",
                ));
            }
            Ok(version)
        })
    }

    pub fn create_collection(&self, name: &str) -> ServiceResult<Collection> {
        self.run("collection_create", |conn| {
            let collection = SqliteCollectionRepository::try_new(conn)?.create_collection(name)?;
            info!(
                "event=collection_create module=service status=ok collection_id={}",
                collection.id
            );
            Ok(collection)
        })
    }

    pub fn list_collections(&self) -> ServiceResult<Vec<Collection>> {
        self.run("collection_list", |conn| {
            Ok(SqliteCollectionRepository::try_new(conn)?.list_collections()?)
        })
    }

    pub fn create_tag(&self, name: &str, description: Option<&str>) -> ServiceResult<Tag> {
        let policy = self.duplicate_tags;
        self.run("tag_create", |conn| {
            let tag = SqliteTagRepository::try_new(conn)?
                .with_duplicate_policy(policy)
                .create_tag(name, description)?;
            info!("event=tag_create module=service status=ok tag_id={}", tag.id);
            Ok(tag)
        })
    }

    pub fn list_tags(&self) -> ServiceResult<Vec<Tag>> {
        self.run("tag_list", |conn| {
            Ok(SqliteTagRepository::try_new(conn)?.list_tags()?)
        })
    }

    /// Creates a paragraph and returns the hydrated stored record.
    pub fn create_paragraph(&self, paragraph: &NewParagraph) -> ServiceResult<Paragraph> {
        self.run("paragraph_create", |conn| {
            let mut repo = SqliteParagraphRepository::try_new(conn)?;
            let id = repo.create_paragraph(paragraph)?;
            let created = read_back(&repo, id, "created paragraph not found in read-back")?;
            info!(
                "event=paragraph_create module=service status=ok paragraph_id={} collection_id={} tag_count={}",
                created.id,
                created.collection.id,
                created.tags.len()
            );
            Ok(created)
        })
    }

    /// Gets one active paragraph.
    pub fn get_paragraph(&self, id: ParagraphId) -> ServiceResult<Option<Paragraph>> {
        Ok(self
            .get_paragraphs(&ParagraphQuery::by_id(id))?
            .into_iter()
            .next())
    }

    pub fn get_paragraphs(&self, query: &ParagraphQuery) -> ServiceResult<Vec<Paragraph>> {
        self.run("paragraph_list", |conn| {
            Ok(SqliteParagraphRepository::try_new(conn)?.get_paragraphs(query)?)
        })
    }

    /// Applies a partial update and returns the hydrated stored record.
    pub fn update_paragraph(
        &self,
        id: ParagraphId,
        patch: &ParagraphPatch,
    ) -> ServiceResult<Paragraph> {
        self.run("paragraph_update", |conn| {
            let mut repo = SqliteParagraphRepository::try_new(conn)?;
            repo.update_paragraph(id, patch)?;
            let updated = read_back(&repo, id, "updated paragraph not found in read-back")?;
            info!(
                "event=paragraph_update module=service status=ok paragraph_id={} tags_replaced={}",
                id,
                patch.tag_ids.is_some()
            );
            Ok(updated)
        })
    }

    pub fn delete_paragraph(&self, id: ParagraphId) -> ServiceResult<()> {
        self.run("paragraph_delete", |conn| {
            SqliteParagraphRepository::try_new(conn)?.delete_paragraph(id)?;
            info!("event=paragraph_delete module=service status=ok paragraph_id={id}");
            Ok(())
        })
    }

    /// Renders active paragraphs (all, or one collection's) as markdown.
    ///
    /// Fails with `NotFound` when `collection_id` names no active collection.
    pub fn export_markdown(&self, collection_id: Option<CollectionId>) -> ServiceResult<String> {
        let paragraphs = self.run("markdown_export", |conn| {
            let query = match collection_id {
                Some(id) => {
                    if SqliteCollectionRepository::try_new(conn)?
                        .get_collection(id)?
                        .is_none()
                    {
                        return Err(RepoError::NotFound {
                            entity: Entity::Collection,
                            id,
                        }
                        .into());
                    }
                    ParagraphQuery::in_collection(id)
                }
                None => ParagraphQuery::all(),
            };
            Ok(SqliteParagraphRepository::try_new(conn)?.get_paragraphs(&query)?)
        })?;

        let document = render_document(&paragraphs);
        info!(
            "event=markdown_export module=service status=ok paragraph_count={} bytes={}",
            paragraphs.len(),
            document.len()
        );
        Ok(document)
    }

    /// Opens a paragraph's content in `editor` and stores the edited text.
    ///
    /// Trailing whitespace of the edited text is dropped. When the result
    /// equals the current content nothing is written and the current record
    /// is returned. Blank results fail with a validation error.
    pub fn edit_paragraph_content(
        &self,
        id: ParagraphId,
        editor: &dyn TextEditor,
    ) -> ServiceResult<Paragraph> {
        let current = self.get_paragraph(id)?.ok_or(RepoError::NotFound {
            entity: Entity::Paragraph,
            id,
        })?;

        let edited = editor.edit(&current.content)?;
        let edited = edited.trim_end();
        if edited == current.content.trim_end() {
            info!("event=paragraph_edit module=service status=unchanged paragraph_id={id}");
            return Ok(current);
        }

        let patch = ParagraphPatch {
            content: Some(edited.to_string()),
            ..ParagraphPatch::default()
        };
        self.update_paragraph(id, &patch)
    }

    fn run<T, F>(&self, event: &'static str, op: F) -> ServiceResult<T>
    where
        F: FnOnce(&mut Connection) -> ServiceResult<T>,
    {
        let started_at = Instant::now();
        let result = self.provider.with_connection(op);
        if let Err(err) = &result {
            let duration_ms = started_at.elapsed().as_millis();
            if err.is_caller_error() {
                info!(
                    "event={event} module=service status=rejected duration_ms={duration_ms} error={err}"
                );
            } else {
                error!(
                    "event={event} module=service status=error duration_ms={duration_ms} error={err}"
                );
            }
        }
        result
    }
}

fn read_back(
    repo: &SqliteParagraphRepository<'_>,
    id: ParagraphId,
    details: &'static str,
) -> ServiceResult<Paragraph> {
    repo.get_paragraphs(&ParagraphQuery::by_id(id))?
        .into_iter()
        .next()
        .ok_or(ServiceError::InconsistentState(details))
}
