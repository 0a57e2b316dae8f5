//! Filter repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist saved filters with their parameter bags as JSON.
//! - Apply the sanitize trigger points: before every write, after every
//!   load.
//!
//! # Invariants
//! - Only canonical (sanitized) parameter bags reach disk.
//! - Loaded filters are sanitized before callers see them, so a bag written
//!   by an older build still reads back canonical.
//! - Listing order is deterministic: `updated_at DESC, uuid ASC`.

use crate::model::filter::{Filter, FilterId, ParamBag};
use crate::model::user::UserId;
use crate::repo::{ensure_schema_current, ensure_table, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const FILTER_SELECT_SQL: &str = "SELECT
    uuid,
    creator_uuid,
    params
FROM filters";

/// Repository interface for saved-filter persistence.
pub trait FilterRepository {
    /// Persists an unsaved filter; returns the persisted, canonical copy.
    fn create_filter(&self, filter: &Filter) -> RepoResult<Filter>;
    /// Rewrites a persisted filter's bag; returns the canonical copy.
    fn update_filter(&self, filter: &Filter) -> RepoResult<Filter>;
    /// Gets one filter by id.
    fn get_filter(&self, id: FilterId) -> RepoResult<Option<Filter>>;
    /// Lists one creator's saved filters.
    fn list_filters_by_creator(&self, creator_uuid: UserId) -> RepoResult<Vec<Filter>>;
    /// Hard-deletes a saved filter.
    fn delete_filter(&self, id: FilterId) -> RepoResult<()>;
}

/// SQLite-backed filter repository.
pub struct SqliteFilterRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteFilterRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_current(conn)?;
        ensure_table(conn, "filters", &["uuid", "creator_uuid", "params"])?;
        Ok(Self { conn })
    }
}

impl FilterRepository for SqliteFilterRepository<'_> {
    fn create_filter(&self, filter: &Filter) -> RepoResult<Filter> {
        let id = Uuid::new_v4();
        let mut persisted = filter.clone();
        persisted.sanitize();
        persisted.mark_persisted(id);

        self.conn.execute(
            "INSERT INTO filters (uuid, creator_uuid, params) VALUES (?1, ?2, ?3);",
            params![
                id.to_string(),
                persisted.creator_uuid.map(|uuid| uuid.to_string()),
                serialize_params(persisted.params())?,
            ],
        )?;
        Ok(persisted)
    }

    fn update_filter(&self, filter: &Filter) -> RepoResult<Filter> {
        let id = filter.id().ok_or(RepoError::NotPersisted)?;
        let mut persisted = filter.clone();
        persisted.sanitize();

        let changed = self.conn.execute(
            "UPDATE filters
             SET
                creator_uuid = ?2,
                params = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                id.to_string(),
                persisted.creator_uuid.map(|uuid| uuid.to_string()),
                serialize_params(persisted.params())?,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(persisted)
    }

    fn get_filter(&self, id: FilterId) -> RepoResult<Option<Filter>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{FILTER_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_filter_row(row)?));
        }
        Ok(None)
    }

    fn list_filters_by_creator(&self, creator_uuid: UserId) -> RepoResult<Vec<Filter>> {
        let mut stmt = self.conn.prepare(&format!(
            "{FILTER_SELECT_SQL}
             WHERE creator_uuid = ?1
             ORDER BY updated_at DESC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([creator_uuid.to_string()])?;
        let mut filters = Vec::new();
        while let Some(row) = rows.next()? {
            filters.push(parse_filter_row(row)?);
        }
        Ok(filters)
    }

    fn delete_filter(&self, id: FilterId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM filters WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

fn serialize_params(params: &ParamBag) -> RepoResult<String> {
    serde_json::to_string(params)
        .map_err(|err| RepoError::InvalidData(format!("unserializable filter params: {err}")))
}

fn parse_filter_row(row: &Row<'_>) -> RepoResult<Filter> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in filters.uuid"))
    })?;

    let creator_uuid = match row.get::<_, Option<String>>("creator_uuid")? {
        Some(text) => Some(Uuid::parse_str(&text).map_err(|_| {
            RepoError::InvalidData(format!(
                "invalid uuid value `{text}` in filters.creator_uuid"
            ))
        })?),
        None => None,
    };

    let params_text: String = row.get("params")?;
    let params: ParamBag = serde_json::from_str(&params_text).map_err(|err| {
        RepoError::InvalidData(format!("invalid params JSON in filters.params: {err}"))
    })?;

    Ok(Filter::from_storage(id, creator_uuid, params))
}
