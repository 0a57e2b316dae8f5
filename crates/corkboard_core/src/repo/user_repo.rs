//! User repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist directory users with role assignments.
//! - Provide the member/active scopes and the system-user find-or-create.
//!
//! # Invariants
//! - `list_active` never returns the system user, active flag regardless.
//! - `system_user` creates at most one row; the partial unique index on
//!   `users.role` decides concurrent races.
//! - Listing order is deterministic: `name COLLATE NOCASE ASC, uuid ASC`.

use crate::model::user::{Role, User, UserId, SYSTEM_USER_NAME};
use crate::repo::{ensure_schema_current, ensure_table, is_unique_violation, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const USER_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    role,
    active
FROM users";

/// Repository interface for directory users.
pub trait UserRepository {
    /// Creates one user row and returns its stable id.
    fn create_user(&self, user: &User) -> RepoResult<UserId>;
    /// Gets one user by id.
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Lists regular members (role = member), inactive ones included.
    fn list_members(&self) -> RepoResult<Vec<User>>;
    /// Lists active users, excluding the system user.
    fn list_active(&self) -> RepoResult<Vec<User>>;
    /// Returns the singular system user, creating it on first use.
    fn system_user(&self) -> RepoResult<User>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_current(conn)?;
        ensure_table(conn, "users", &["uuid", "name", "role", "active"])?;
        Ok(Self { conn })
    }

    fn find_system_row(&self) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE role = 'system';"))?;
        let mut rows = stmt.query([])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn list_where(&self, predicate: &str) -> RepoResult<Vec<User>> {
        let mut stmt = self.conn.prepare(&format!(
            "{USER_SELECT_SQL}
             WHERE {predicate}
             ORDER BY name COLLATE NOCASE ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &User) -> RepoResult<UserId> {
        self.conn.execute(
            "INSERT INTO users (uuid, name, role, active) VALUES (?1, ?2, ?3, ?4);",
            params![
                user.uuid.to_string(),
                user.name.as_str(),
                user.role.as_str(),
                i64::from(user.active),
            ],
        )?;
        Ok(user.uuid)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn list_members(&self) -> RepoResult<Vec<User>> {
        self.list_where("role = 'member'")
    }

    fn list_active(&self) -> RepoResult<Vec<User>> {
        self.list_where("active = 1 AND role <> 'system'")
    }

    fn system_user(&self) -> RepoResult<User> {
        if let Some(existing) = self.find_system_row()? {
            return Ok(existing);
        }

        let user = User::new(SYSTEM_USER_NAME, Role::System);
        let inserted = self.conn.execute(
            "INSERT INTO users (uuid, name, role, active) VALUES (?1, ?2, 'system', 1);",
            params![user.uuid.to_string(), user.name.as_str()],
        );
        match inserted {
            Ok(_) => Ok(user),
            Err(err) if is_unique_violation(&err) => {
                // Lost the find-or-create race; the winner's row is the one.
                self.find_system_row()?.ok_or_else(|| {
                    RepoError::InvalidData(
                        "system user missing after unique violation".to_string(),
                    )
                })
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in users.uuid"))
    })?;

    let role_text: String = row.get("role")?;
    let role = Role::parse(&role_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid role value `{role_text}` in users.role"))
    })?;

    let active = match row.get::<_, i64>("active")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid active value `{other}` in users.active"
            )));
        }
    };

    Ok(User {
        uuid,
        name: row.get("name")?,
        role,
        active,
    })
}
