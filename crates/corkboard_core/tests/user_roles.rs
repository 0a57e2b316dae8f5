use corkboard_core::db::migrations::latest_version;
use corkboard_core::db::open_db_in_memory;
use corkboard_core::{RepoError, Role, SqliteUserRepository, User, UserRepository};
use rusqlite::Connection;
use std::collections::HashSet;
use uuid::Uuid;

#[test]
fn create_and_get_round_trip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let mut user = User::new("Ada", Role::Admin);
    user.active = false;
    let id = repo.create_user(&user).unwrap();

    let loaded = repo.get_user(id).unwrap().unwrap();
    assert_eq!(loaded, user);

    assert!(repo.get_user(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn member_and_active_scopes_exclude_the_right_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let admin = User::new("Noor", Role::Admin);
    let member = User::new("Sam", Role::Member);
    let mut retired = User::new("Kim", Role::Member);
    retired.active = false;
    for user in [&admin, &member, &retired] {
        repo.create_user(user).unwrap();
    }
    let system = repo.system_user().unwrap();

    let members: HashSet<_> = repo
        .list_members()
        .unwrap()
        .into_iter()
        .map(|user| user.uuid)
        .collect();
    assert_eq!(members, HashSet::from([member.uuid, retired.uuid]));

    let active: HashSet<_> = repo
        .list_active()
        .unwrap()
        .into_iter()
        .map(|user| user.uuid)
        .collect();
    assert_eq!(active, HashSet::from([admin.uuid, member.uuid]));
    assert!(!active.contains(&system.uuid));
}

#[test]
fn listings_order_by_name_case_insensitively() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    for name in ["cara", "Ada", "bo"] {
        repo.create_user(&User::new(name, Role::Member)).unwrap();
    }

    let names: Vec<String> = repo
        .list_members()
        .unwrap()
        .into_iter()
        .map(|user| user.name)
        .collect();
    assert_eq!(names, vec!["Ada", "bo", "cara"]);
}

#[test]
fn system_user_is_created_once_and_reused() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let first = repo.system_user().unwrap();
    let second = repo.system_user().unwrap();

    assert_eq!(first.uuid, second.uuid);
    assert_eq!(first.name, "System");
    assert_eq!(first.role, Role::System);

    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM users WHERE role = 'system';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn system_user_adopts_an_existing_row() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let existing = Uuid::new_v4();
    conn.execute(
        "INSERT INTO users (uuid, name, role, active) VALUES (?1, 'System', 'system', 1);",
        [existing.to_string()],
    )
    .unwrap();

    let resolved = repo.system_user().unwrap();
    assert_eq!(resolved.uuid, existing);
}

#[test]
fn storage_refuses_a_second_system_row() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    repo.system_user().unwrap();
    let err = repo
        .create_user(&User::new("Backup", Role::System))
        .unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
}

#[test]
fn repository_rejects_connection_without_users_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteUserRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("users"))
    ));
}

#[test]
fn repository_rejects_connection_missing_the_role_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE users (
            uuid TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 1
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteUserRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "users",
            column: "role"
        })
    ));
}
