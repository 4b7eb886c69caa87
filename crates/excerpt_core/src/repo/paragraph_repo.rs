//! Paragraph repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist paragraphs together with their tag associations.
//! - Hydrate read models with owning collection and active tag set.
//!
//! # Invariants
//! - Create/update/delete each run in one `IMMEDIATE` transaction.
//! - Tag ids are deduplicated; ids without an active tag row are dropped.
//! - `update_paragraph` with `tag_ids` replaces the whole association set.
//! - Deleting an already deleted paragraph fails with `NotFound`.

use crate::db::NOW_MS_SQL;
use crate::model::{
    Collection, NewParagraph, Paragraph, ParagraphId, ParagraphPatch, ParagraphQuery, TagId,
};
use crate::repo::collection_repo::collection_is_active;
use crate::repo::tag_repo::load_tags_for_paragraph;
use crate::repo::{ensure_schema, Entity, RepoError, RepoResult};
use log::warn;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, TransactionBehavior};
use std::collections::BTreeSet;

const PARAGRAPH_SELECT_SQL: &str = "SELECT
    p.id,
    p.title,
    p.content,
    p.created_at,
    p.updated_at,
    p.deleted_at,
    c.id AS collection_id,
    c.name AS collection_name,
    c.created_at AS collection_created_at,
    c.updated_at AS collection_updated_at,
    c.deleted_at AS collection_deleted_at
FROM paragraphs p
INNER JOIN collections c ON c.id = p.collection_id";

/// Repository interface for paragraph operations.
pub trait ParagraphRepository {
    /// Creates one paragraph with its tag associations and returns its id.
    fn create_paragraph(&mut self, paragraph: &NewParagraph) -> RepoResult<ParagraphId>;
    /// Returns hydrated active paragraphs matching `query`, in insertion order.
    fn get_paragraphs(&self, query: &ParagraphQuery) -> RepoResult<Vec<Paragraph>>;
    /// Applies a partial update to one active paragraph.
    fn update_paragraph(&mut self, id: ParagraphId, patch: &ParagraphPatch) -> RepoResult<()>;
    /// Tombstones one active paragraph.
    fn delete_paragraph(&mut self, id: ParagraphId) -> RepoResult<()>;
}

/// SQLite-backed paragraph repository.
pub struct SqliteParagraphRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteParagraphRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_schema(
            conn,
            &[
                (
                    "paragraphs",
                    &[
                        "id",
                        "collection_id",
                        "title",
                        "content",
                        "created_at",
                        "updated_at",
                        "deleted_at",
                    ],
                ),
                ("paragraph_tags", &["paragraph_id", "tag_id"]),
                ("collections", &["id", "deleted_at"]),
                ("tags", &["id", "deleted_at"]),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl ParagraphRepository for SqliteParagraphRepository<'_> {
    fn create_paragraph(&mut self, paragraph: &NewParagraph) -> RepoResult<ParagraphId> {
        paragraph.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !collection_is_active(&tx, paragraph.collection_id)? {
            return Err(RepoError::NotFound {
                entity: Entity::Collection,
                id: paragraph.collection_id,
            });
        }

        tx.execute(
            &format!(
                "INSERT INTO paragraphs (collection_id, title, content, created_at, updated_at)
                 VALUES (?1, ?2, ?3, {NOW_MS_SQL}, {NOW_MS_SQL});"
            ),
            params![
                paragraph.collection_id,
                paragraph.title.as_str(),
                paragraph.content.as_str(),
            ],
        )?;
        let paragraph_id = tx.last_insert_rowid();

        attach_tags(&tx, paragraph_id, &paragraph.tag_ids)?;
        tx.commit()?;
        Ok(paragraph_id)
    }

    fn get_paragraphs(&self, query: &ParagraphQuery) -> RepoResult<Vec<Paragraph>> {
        let mut sql = format!("{PARAGRAPH_SELECT_SQL} WHERE p.deleted_at IS NULL");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(paragraph_id) = query.paragraph_id {
            sql.push_str(" AND p.id = ?");
            bind_values.push(Value::Integer(paragraph_id));
        }
        if let Some(collection_id) = query.collection_id {
            sql.push_str(" AND p.collection_id = ?");
            bind_values.push(Value::Integer(collection_id));
        }
        sql.push_str(" ORDER BY p.id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut paragraphs = Vec::new();
        while let Some(row) = rows.next()? {
            let mut paragraph = parse_paragraph_row(row)?;
            paragraph.tags = load_tags_for_paragraph(self.conn, paragraph.id)?
                .into_iter()
                .collect();
            paragraphs.push(paragraph);
        }

        Ok(paragraphs)
    }

    fn update_paragraph(&mut self, id: ParagraphId, patch: &ParagraphPatch) -> RepoResult<()> {
        patch.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut assignments = vec![format!("updated_at = {NOW_MS_SQL}")];
        let mut bind_values: Vec<Value> = Vec::new();
        if let Some(title) = patch.title.as_ref() {
            assignments.push("title = ?".to_string());
            bind_values.push(Value::Text(title.clone()));
        }
        if let Some(content) = patch.content.as_ref() {
            assignments.push("content = ?".to_string());
            bind_values.push(Value::Text(content.clone()));
        }
        bind_values.push(Value::Integer(id));

        let changed = tx.execute(
            &format!(
                "UPDATE paragraphs
                 SET {}
                 WHERE id = ?
                   AND deleted_at IS NULL;",
                assignments.join(", ")
            ),
            params_from_iter(bind_values),
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: Entity::Paragraph,
                id,
            });
        }

        if let Some(tag_ids) = patch.tag_ids.as_ref() {
            tx.execute("DELETE FROM paragraph_tags WHERE paragraph_id = ?1;", [id])?;
            attach_tags(&tx, id, tag_ids)?;
        }

        tx.commit()?;
        Ok(())
    }

    fn delete_paragraph(&mut self, id: ParagraphId) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            &format!(
                "UPDATE paragraphs
                 SET deleted_at = {NOW_MS_SQL},
                     updated_at = {NOW_MS_SQL}
                 WHERE id = ?1
                   AND deleted_at IS NULL;"
            ),
            [id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: Entity::Paragraph,
                id,
            });
        }

        tx.commit()?;
        Ok(())
    }
}

/// Inserts one association per unique active tag id and returns how many
/// were attached.
fn attach_tags(conn: &Connection, paragraph_id: ParagraphId, tag_ids: &[TagId]) -> RepoResult<usize> {
    let unique: BTreeSet<TagId> = tag_ids.iter().copied().collect();
    let mut attached = 0;
    for tag_id in &unique {
        attached += conn.execute(
            "INSERT OR IGNORE INTO paragraph_tags (paragraph_id, tag_id)
             SELECT ?1, id
             FROM tags
             WHERE id = ?2
               AND deleted_at IS NULL;",
            params![paragraph_id, tag_id],
        )?;
    }

    let dropped = unique.len() - attached;
    if dropped > 0 {
        // Unknown ids are not an error; keep a trace for the silent drop.
        warn!(
            "event=paragraph_tags_attach module=repo status=partial paragraph_id={} requested={} dropped={}",
            paragraph_id,
            unique.len(),
            dropped
        );
    }
    Ok(attached)
}

fn parse_paragraph_row(row: &Row<'_>) -> RepoResult<Paragraph> {
    let collection = Collection {
        id: row.get("collection_id")?,
        name: row.get("collection_name")?,
        created_at: row.get("collection_created_at")?,
        updated_at: row.get("collection_updated_at")?,
        deleted_at: row.get("collection_deleted_at")?,
    };
    let paragraph = Paragraph {
        id: row.get("id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        collection,
        tags: BTreeSet::new(),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
    };

    if paragraph.title.trim().is_empty() || paragraph.content.trim().is_empty() {
        return Err(RepoError::InvalidData(format!(
            "blank title or content in paragraphs row {}",
            paragraph.id
        )));
    }
    Ok(paragraph)
}
