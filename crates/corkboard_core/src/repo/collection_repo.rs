//! Collection repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over `collections` rows.
//! - Implement the composable published scope and the public-key lookup.
//!
//! # Invariants
//! - Published state is computed from `publications` row existence at query
//!   time; nothing here caches it.
//! - Listing order is deterministic: `updated_at DESC, uuid ASC`.
//! - Deleting a collection cascades to its publication.

use crate::model::collection::{BubbleId, Collection, CollectionId};
use crate::model::publication::PublicationKey;
use crate::repo::{ensure_schema_current, ensure_table, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use uuid::Uuid;

const COLLECTION_SELECT_SQL: &str = "SELECT
    uuid,
    bubble_uuid,
    name
FROM collections";

/// Query options for listing collections.
///
/// `published` composes with the access scoping (`bubble_uuid`); richer
/// viewer predicates are owned by the outer application and layered on the
/// same pattern.
#[derive(Debug, Clone, Default)]
pub struct CollectionListQuery {
    /// Restrict to one bubble.
    pub bubble_uuid: Option<BubbleId>,
    /// `Some(true)` = published only, `Some(false)` = unpublished only.
    pub published: Option<bool>,
    /// Maximum rows to return.
    pub limit: Option<u32>,
    /// Number of rows to skip.
    pub offset: u32,
}

/// Repository interface for collection persistence.
pub trait CollectionRepository {
    /// Creates one collection row and returns its stable id.
    fn create_collection(&self, collection: &Collection) -> RepoResult<CollectionId>;
    /// Gets one collection by id.
    fn get_collection(&self, id: CollectionId) -> RepoResult<Option<Collection>>;
    /// Lists collections using scope and pagination options.
    fn list_collections(&self, query: &CollectionListQuery) -> RepoResult<Vec<Collection>>;
    /// Hard-deletes a collection; its publication goes with it.
    fn delete_collection(&self, id: CollectionId) -> RepoResult<()>;
    /// Resolves a public lookup key to the collection it publishes.
    ///
    /// Joins through live publication rows, so keys of since-unpublished
    /// collections resolve to `None`.
    fn find_by_published_key(&self, key: &PublicationKey) -> RepoResult<Option<Collection>>;
}

/// SQLite-backed collection repository.
pub struct SqliteCollectionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCollectionRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_current(conn)?;
        ensure_table(conn, "collections", &["uuid", "bubble_uuid", "name"])?;
        ensure_table(conn, "publications", &["collection_uuid", "key"])?;
        Ok(Self { conn })
    }
}

impl CollectionRepository for SqliteCollectionRepository<'_> {
    fn create_collection(&self, collection: &Collection) -> RepoResult<CollectionId> {
        self.conn.execute(
            "INSERT INTO collections (uuid, bubble_uuid, name) VALUES (?1, ?2, ?3);",
            params![
                collection.uuid.to_string(),
                collection.bubble_uuid.to_string(),
                collection.name.as_str(),
            ],
        )?;
        Ok(collection.uuid)
    }

    fn get_collection(&self, id: CollectionId) -> RepoResult<Option<Collection>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{COLLECTION_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_collection_row(row)?));
        }
        Ok(None)
    }

    fn list_collections(&self, query: &CollectionListQuery) -> RepoResult<Vec<Collection>> {
        let mut sql = format!("{COLLECTION_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(bubble_uuid) = query.bubble_uuid {
            sql.push_str(" AND bubble_uuid = ?");
            bind_values.push(Value::Text(bubble_uuid.to_string()));
        }

        match query.published {
            Some(true) => sql.push_str(
                " AND EXISTS (
                    SELECT 1
                    FROM publications
                    WHERE publications.collection_uuid = collections.uuid
                )",
            ),
            Some(false) => sql.push_str(
                " AND NOT EXISTS (
                    SELECT 1
                    FROM publications
                    WHERE publications.collection_uuid = collections.uuid
                )",
            ),
            None => {}
        }

        sql.push_str(" ORDER BY updated_at DESC, uuid ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut collections = Vec::new();
        while let Some(row) = rows.next()? {
            collections.push(parse_collection_row(row)?);
        }
        Ok(collections)
    }

    fn delete_collection(&self, id: CollectionId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM collections WHERE uuid = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn find_by_published_key(&self, key: &PublicationKey) -> RepoResult<Option<Collection>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                collections.uuid,
                collections.bubble_uuid,
                collections.name
             FROM collections
             INNER JOIN publications
                ON publications.collection_uuid = collections.uuid
             WHERE publications.key = ?1;",
        )?;
        let mut rows = stmt.query([key.as_str()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_collection_row(row)?));
        }
        Ok(None)
    }
}

fn parse_collection_row(row: &Row<'_>) -> RepoResult<Collection> {
    let uuid = parse_uuid_column(row, "uuid", "collections.uuid")?;
    let bubble_uuid = parse_uuid_column(row, "bubble_uuid", "collections.bubble_uuid")?;
    Ok(Collection {
        uuid,
        bubble_uuid,
        name: row.get("name")?,
    })
}

fn parse_uuid_column(row: &Row<'_>, column: &str, qualified: &str) -> RepoResult<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{text}` in {qualified}")))
}
