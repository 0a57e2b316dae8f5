//! Publication repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist publication rows keyed by owning collection.
//! - Translate the storage uniqueness constraint into a typed
//!   created/already-published outcome.
//!
//! # Invariants
//! - At most one publication per collection; enforced by the primary key on
//!   `publications.collection_uuid`, not by application pre-checks alone.
//! - A losing concurrent insert never surfaces as an error; the winner's row
//!   is returned instead.
//! - Keys are written once and never updated.

use crate::model::collection::CollectionId;
use crate::model::publication::{Publication, PublicationKey};
use crate::repo::{
    ensure_schema_current, ensure_table, is_foreign_key_violation, is_unique_violation, RepoError,
    RepoResult,
};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

/// Fresh-key attempts before a persistent unique violation is surfaced.
///
/// Key collisions are ~2^-140 per attempt, so reaching the bound means the
/// storage layer is reporting something other than bad luck.
const KEY_RETRY_ATTEMPTS: usize = 3;

/// Outcome of an idempotent publication insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertPublication {
    /// A new row was written with a freshly generated key.
    Created(Publication),
    /// The collection already had a publication; its key is untouched.
    AlreadyPublished(Publication),
}

impl InsertPublication {
    /// The surviving publication, whichever way the insert went.
    pub fn publication(&self) -> &Publication {
        match self {
            Self::Created(publication) | Self::AlreadyPublished(publication) => publication,
        }
    }
}

/// Repository interface for publication persistence.
pub trait PublicationRepository {
    /// Ensures a publication row exists for `collection_uuid`.
    ///
    /// Races on the storage constraint: the losing side of a concurrent
    /// insert receives `AlreadyPublished` with the winner's row.
    fn insert_publication(&self, collection_uuid: CollectionId) -> RepoResult<InsertPublication>;
    /// Gets the publication owned by `collection_uuid`, if any.
    fn find_by_collection(&self, collection_uuid: CollectionId) -> RepoResult<Option<Publication>>;
    /// Deletes the publication owned by `collection_uuid`.
    ///
    /// Returns whether a row was removed; absence is not an error.
    fn delete_by_collection(&self, collection_uuid: CollectionId) -> RepoResult<bool>;
}

/// SQLite-backed publication repository.
pub struct SqlitePublicationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePublicationRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_current(conn)?;
        ensure_table(conn, "publications", &["collection_uuid", "key"])?;
        Ok(Self { conn })
    }
}

impl PublicationRepository for SqlitePublicationRepository<'_> {
    fn insert_publication(&self, collection_uuid: CollectionId) -> RepoResult<InsertPublication> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let publication = Publication::new(collection_uuid);
            let inserted = self.conn.execute(
                "INSERT INTO publications (collection_uuid, key) VALUES (?1, ?2);",
                params![collection_uuid.to_string(), publication.key().as_str()],
            );
            match inserted {
                Ok(_) => return Ok(InsertPublication::Created(publication)),
                Err(err) if is_unique_violation(&err) => {
                    // Either the collection gained a publication concurrently
                    // or the fresh key collided. Re-reading distinguishes.
                    if let Some(existing) = self.find_by_collection(collection_uuid)? {
                        return Ok(InsertPublication::AlreadyPublished(existing));
                    }
                    if attempts >= KEY_RETRY_ATTEMPTS {
                        return Err(err.into());
                    }
                }
                Err(err) if is_foreign_key_violation(&err) => {
                    return Err(RepoError::NotFound(collection_uuid));
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn find_by_collection(&self, collection_uuid: CollectionId) -> RepoResult<Option<Publication>> {
        let mut stmt = self.conn.prepare(
            "SELECT collection_uuid, key FROM publications WHERE collection_uuid = ?1;",
        )?;
        let mut rows = stmt.query([collection_uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_publication_row(row)?));
        }
        Ok(None)
    }

    fn delete_by_collection(&self, collection_uuid: CollectionId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM publications WHERE collection_uuid = ?1;",
            [collection_uuid.to_string()],
        )?;
        Ok(changed > 0)
    }
}

fn parse_publication_row(row: &Row<'_>) -> RepoResult<Publication> {
    let uuid_text: String = row.get("collection_uuid")?;
    let collection_uuid = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid value `{uuid_text}` in publications.collection_uuid"
        ))
    })?;

    let key_text: String = row.get("key")?;
    let key = PublicationKey::parse(&key_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "malformed lookup key `{key_text}` in publications.key"
        ))
    })?;

    Ok(Publication::from_parts(collection_uuid, key))
}
