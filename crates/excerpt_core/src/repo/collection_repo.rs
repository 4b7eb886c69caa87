//! Collection repository contract and SQLite implementation.
//!
//! # Invariants
//! - Collection names are unique; a duplicate create fails with `Conflict`.
//! - Listing is in insertion (id) order and skips tombstoned rows.

use crate::db::NOW_MS_SQL;
use crate::model::validation::require_text;
use crate::model::{Collection, CollectionId};
use crate::repo::{ensure_schema, is_unique_violation, Entity, RepoError, RepoResult};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior};

const COLLECTION_SELECT_SQL: &str = "SELECT
    id,
    name,
    created_at,
    updated_at,
    deleted_at
FROM collections";

/// Repository interface for collection operations.
pub trait CollectionRepository {
    /// Creates a collection and returns the stored row.
    fn create_collection(&mut self, name: &str) -> RepoResult<Collection>;
    /// Lists active collections in insertion order.
    fn list_collections(&self) -> RepoResult<Vec<Collection>>;
    /// Gets one active collection by id.
    fn get_collection(&self, id: CollectionId) -> RepoResult<Option<Collection>>;
}

/// SQLite-backed collection repository.
pub struct SqliteCollectionRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteCollectionRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_schema(
            conn,
            &[(
                "collections",
                &["id", "name", "created_at", "updated_at", "deleted_at"],
            )],
        )?;
        Ok(Self { conn })
    }
}

impl CollectionRepository for SqliteCollectionRepository<'_> {
    fn create_collection(&mut self, name: &str) -> RepoResult<Collection> {
        require_text("name", name)?;
        let name = name.trim();

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let inserted = tx.execute(
            &format!(
                "INSERT INTO collections (name, created_at, updated_at)
                 VALUES (?1, {NOW_MS_SQL}, {NOW_MS_SQL});"
            ),
            [name],
        );
        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(RepoError::Conflict {
                    entity: Entity::Collection,
                    name: name.to_string(),
                });
            }
            Err(err) => return Err(err.into()),
        }

        let id = tx.last_insert_rowid();
        let created = load_collection(&tx, id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("collection {id} missing after insert"))
        })?;
        tx.commit()?;
        Ok(created)
    }

    fn list_collections(&self) -> RepoResult<Vec<Collection>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COLLECTION_SELECT_SQL}
             WHERE deleted_at IS NULL
             ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut collections = Vec::new();
        while let Some(row) = rows.next()? {
            collections.push(parse_collection_row(row)?);
        }
        Ok(collections)
    }

    fn get_collection(&self, id: CollectionId) -> RepoResult<Option<Collection>> {
        load_collection(self.conn, id)
    }
}

fn load_collection(conn: &Connection, id: CollectionId) -> RepoResult<Option<Collection>> {
    let collection = conn
        .query_row(
            &format!(
                "{COLLECTION_SELECT_SQL}
                 WHERE id = ?1
                   AND deleted_at IS NULL;"
            ),
            [id],
            |row| Ok(parse_collection_row(row)),
        )
        .optional()?;
    collection.transpose()
}

/// Returns whether an active collection with `id` exists.
pub(crate) fn collection_is_active(conn: &Connection, id: CollectionId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM collections
            WHERE id = ?1
              AND deleted_at IS NULL
        );",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn parse_collection_row(row: &Row<'_>) -> RepoResult<Collection> {
    let collection = Collection {
        id: row.get("id")?,
        name: row.get("name")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
    };
    if collection.name.trim().is_empty() {
        return Err(RepoError::InvalidData(format!(
            "empty name in collections row {}",
            collection.id
        )));
    }
    Ok(collection)
}
