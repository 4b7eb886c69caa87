//! Tag repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Normalize tag names before any lookup or persistence.
//! - Apply the configured duplicate-name policy.
//!
//! # Invariants
//! - Persisted `tags.name` values are always normalized slugs.
//! - Under `DuplicateTagPolicy::Absorb`, creating an existing name returns
//!   the existing row unchanged (a tombstoned row is revived).

use crate::config::DuplicateTagPolicy;
use crate::db::NOW_MS_SQL;
use crate::model::{normalize_tag_name, Tag, TagId};
use crate::repo::{ensure_schema, Entity, RepoError, RepoResult};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

const TAG_SELECT_SQL: &str = "SELECT
    id,
    name,
    description,
    created_at,
    updated_at,
    deleted_at
FROM tags";

/// Repository interface for tag operations.
pub trait TagRepository {
    /// Creates (or absorbs into an existing) tag and returns the stored row.
    ///
    /// `description` defaults to the raw `name`, as typed, when absent or blank.
    fn create_tag(&mut self, name: &str, description: Option<&str>) -> RepoResult<Tag>;
    /// Lists active tags in insertion order.
    fn list_tags(&self) -> RepoResult<Vec<Tag>>;
    /// Gets one active tag by raw or normalized name.
    fn get_tag_by_name(&self, name: &str) -> RepoResult<Option<Tag>>;
}

/// SQLite-backed tag repository.
pub struct SqliteTagRepository<'conn> {
    conn: &'conn mut Connection,
    duplicate_policy: DuplicateTagPolicy,
}

impl<'conn> SqliteTagRepository<'conn> {
    /// Constructs a repository with the default duplicate policy.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_schema(
            conn,
            &[(
                "tags",
                &[
                    "id",
                    "name",
                    "description",
                    "created_at",
                    "updated_at",
                    "deleted_at",
                ],
            )],
        )?;
        Ok(Self {
            conn,
            duplicate_policy: DuplicateTagPolicy::default(),
        })
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicateTagPolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }
}

impl TagRepository for SqliteTagRepository<'_> {
    fn create_tag(&mut self, name: &str, description: Option<&str>) -> RepoResult<Tag> {
        let normalized = normalize_tag_name(name)?;
        let description = description
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(name);

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let tag_id = match find_tag_row(&tx, &normalized)? {
            Some(existing) if existing.is_active() => match self.duplicate_policy {
                DuplicateTagPolicy::Absorb => {
                    debug!(
                        "event=tag_create module=repo status=absorbed tag_id={}",
                        existing.id
                    );
                    existing.id
                }
                DuplicateTagPolicy::Reject => {
                    return Err(RepoError::Conflict {
                        entity: Entity::Tag,
                        name: normalized,
                    });
                }
            },
            Some(tombstoned) => {
                tx.execute(
                    &format!(
                        "UPDATE tags
                         SET deleted_at = NULL,
                             updated_at = {NOW_MS_SQL}
                         WHERE id = ?1;"
                    ),
                    [tombstoned.id],
                )?;
                debug!(
                    "event=tag_create module=repo status=revived tag_id={}",
                    tombstoned.id
                );
                tombstoned.id
            }
            None => {
                tx.execute(
                    &format!(
                        "INSERT INTO tags (name, description, created_at, updated_at)
                         VALUES (?1, ?2, {NOW_MS_SQL}, {NOW_MS_SQL});"
                    ),
                    params![normalized, description],
                )?;
                tx.last_insert_rowid()
            }
        };

        let tag = load_active_tag(&tx, tag_id)?
            .ok_or_else(|| RepoError::InvalidData(format!("tag {tag_id} missing after write")))?;
        tx.commit()?;
        Ok(tag)
    }

    fn list_tags(&self) -> RepoResult<Vec<Tag>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TAG_SELECT_SQL}
             WHERE deleted_at IS NULL
             ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            tags.push(parse_tag_row(row)?);
        }
        Ok(tags)
    }

    fn get_tag_by_name(&self, name: &str) -> RepoResult<Option<Tag>> {
        let normalized = normalize_tag_name(name)?;
        Ok(find_tag_row(self.conn, &normalized)?.filter(Tag::is_active))
    }
}

/// Finds a tag row by normalized name, tombstoned or not.
fn find_tag_row(conn: &Connection, normalized: &str) -> RepoResult<Option<Tag>> {
    conn.query_row(
        &format!("{TAG_SELECT_SQL} WHERE name = ?1;"),
        [normalized],
        |row| Ok(parse_tag_row(row)),
    )
    .optional()?
    .transpose()
}

fn load_active_tag(conn: &Connection, id: TagId) -> RepoResult<Option<Tag>> {
    conn.query_row(
        &format!(
            "{TAG_SELECT_SQL}
             WHERE id = ?1
               AND deleted_at IS NULL;"
        ),
        [id],
        |row| Ok(parse_tag_row(row)),
    )
    .optional()?
    .transpose()
}

/// Loads the active tags attached to one paragraph, in id order.
pub(crate) fn load_tags_for_paragraph(conn: &Connection, paragraph_id: i64) -> RepoResult<Vec<Tag>> {
    let mut stmt = conn.prepare(
        "SELECT
            t.id,
            t.name,
            t.description,
            t.created_at,
            t.updated_at,
            t.deleted_at
         FROM paragraph_tags pt
         INNER JOIN tags t ON t.id = pt.tag_id
         WHERE pt.paragraph_id = ?1
           AND t.deleted_at IS NULL
         ORDER BY t.id ASC;",
    )?;
    let mut rows = stmt.query([paragraph_id])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        tags.push(parse_tag_row(row)?);
    }
    Ok(tags)
}

fn parse_tag_row(row: &Row<'_>) -> RepoResult<Tag> {
    let tag = Tag {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
    };
    if normalize_tag_name(&tag.name).ok().as_deref() != Some(tag.name.as_str()) {
        return Err(RepoError::InvalidData(format!(
            "non-normalized name `{}` in tags row {}",
            tag.name, tag.id
        )));
    }
    Ok(tag)
}
