use corkboard_core::db::migrations::latest_version;
use corkboard_core::db::open_db_in_memory;
use corkboard_core::{
    AssignmentMode, Filter, FilterRepository, FilterService, ParamBag, RepoError, SortIndex,
    SqliteFilterRepository,
};
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashSet;
use uuid::Uuid;

#[test]
fn sanitize_is_idempotent() {
    let mut bag = ParamBag::new();
    bag.set("indexed_by", json!("newest"));
    bag.set("bucket_ids", json!(["7", 3, 3, "junk", null]));
    bag.set("assignments", json!(""));
    bag.set("notes", json!("  "));

    let filter = Filter::from_params(bag);
    let once = filter.params().clone();

    let mut again = filter.clone();
    again.sanitize();
    assert_eq!(again.params(), &once);
}

#[test]
fn default_index_is_stripped_but_still_reads_back() {
    let mut filter = Filter::new();
    filter.set_indexed_by("most_active");
    filter.sanitize();

    assert!(filter.params().get("indexed_by").is_none());
    assert_eq!(filter.indexed_by(), Some(SortIndex::MostActive));
    assert!(filter.is_indexed_by(SortIndex::MostActive));
}

#[test]
fn sanitize_canonicalizes_id_lists_and_keeps_the_chosen_index() {
    let mut filter = Filter::new();
    filter.set_indexed_by("newest");
    filter.set_param("bucket_ids", json!([1, 2, 2, ""]));
    filter.sanitize();

    assert_eq!(filter.bucket_ids(), vec![1, 2]);
    assert_eq!(filter.params().get("bucket_ids"), Some(&json!([1, 2])));
    assert_eq!(filter.indexed_by(), Some(SortIndex::Newest));
}

#[test]
fn blank_values_are_stripped() {
    let mut bag = ParamBag::new();
    bag.set("assignments", json!(""));
    bag.set("tag_ids", json!([]));
    bag.set("memo", json!(null));
    bag.set("flag", json!(false));

    let filter = Filter::from_params(bag);
    assert!(filter.params().is_empty());
}

#[test]
fn malformed_id_lists_degrade_to_empty() {
    let mut filter = Filter::new();
    filter.set_param("assignee_ids", json!("12"));
    filter.sanitize();

    assert!(filter.params().get("assignee_ids").is_none());
    assert!(filter.assignee_ids().is_empty());
}

#[test]
fn assignments_reads_only_recognized_values() {
    let mut filter = Filter::new();
    assert_eq!(filter.assignments(), None);

    filter.set_assignments("true");
    assert_eq!(filter.assignments(), Some(AssignmentMode::Enabled));

    filter.set_assignments("false");
    assert_eq!(filter.assignments(), Some(AssignmentMode::Disabled));

    filter.set_assignments("maybe");
    assert_eq!(filter.assignments(), None);
}

#[test]
fn to_params_drops_unrecognized_keys() {
    let mut bag = ParamBag::new();
    bag.set("indexed_by", json!("oldest"));
    bag.set("page", json!(3));
    bag.set("utm_source", json!("mail"));

    let filter = Filter::from_params(bag);
    let projected = filter.to_params();

    assert_eq!(projected.get("indexed_by"), Some(&json!("oldest")));
    // Nothing beyond the whitelist survives, unsaved identity included.
    assert_eq!(projected.keys().collect::<Vec<_>>(), ["indexed_by"]);
}

#[test]
fn to_params_carries_filter_id_only_once_persisted() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteFilterRepository::try_new(&conn).unwrap();

    let mut bag = ParamBag::new();
    bag.set("indexed_by", json!("newest"));
    let unsaved = Filter::from_params(bag);
    assert!(unsaved.to_params().get("filter_id").is_none());

    let saved = repo.create_filter(&unsaved).unwrap();
    let id = saved.id().unwrap();
    assert_eq!(
        saved.to_params().get("filter_id"),
        Some(&json!(id.to_string()))
    );
}

#[test]
fn create_persists_the_canonical_form() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteFilterRepository::try_new(&conn).unwrap();

    // Raw mutations stay un-sanitized until a write.
    let mut filter = Filter::new();
    filter.set_indexed_by("most_active");
    filter.set_param("tag_ids", json!(["5", "3", 5]));
    filter.set_param("q", json!("   "));

    let saved = repo.create_filter(&filter).unwrap();
    assert!(saved.params().get("indexed_by").is_none());
    assert_eq!(saved.params().get("tag_ids"), Some(&json!([3, 5])));
    assert!(saved.params().get("q").is_none());

    let stored: String = conn
        .query_row(
            "SELECT params FROM filters WHERE uuid = ?1;",
            [saved.id().unwrap().to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(stored, r#"{"tag_ids":[3,5]}"#);

    let loaded = repo.get_filter(saved.id().unwrap()).unwrap().unwrap();
    assert_eq!(loaded.params(), saved.params());
}

#[test]
fn creating_a_prebuilt_filter_sanitizes_on_write() {
    let conn = open_db_in_memory().unwrap();
    let service = FilterService::new(SqliteFilterRepository::try_new(&conn).unwrap());

    let mut filter = Filter::new();
    filter.set_indexed_by("oldest");
    filter.set_param("tag_ids", json!(["7", 7, "junk"]));
    filter.set_param("draft", json!("  "));

    let saved = service.create_filter(&filter).unwrap();

    assert!(saved.is_persisted());
    assert!(!filter.is_persisted());
    assert_eq!(saved.indexed_by(), Some(SortIndex::Oldest));
    assert_eq!(saved.tag_ids(), vec![7]);
    assert!(saved.params().get("draft").is_none());

    let reloaded = service.get_filter(saved.id().unwrap()).unwrap().unwrap();
    assert_eq!(reloaded.params(), saved.params());
}

#[test]
fn loading_sanitizes_bags_written_by_older_builds() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteFilterRepository::try_new(&conn).unwrap();

    let id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO filters (uuid, creator_uuid, params) VALUES (?1, NULL, ?2);",
        params![
            id.to_string(),
            r#"{"indexed_by":"most_active","bucket_ids":["2","1",false]}"#
        ],
    )
    .unwrap();

    let loaded = repo.get_filter(id).unwrap().unwrap();
    assert!(loaded.params().get("indexed_by").is_none());
    assert_eq!(loaded.bucket_ids(), vec![1, 2]);
}

#[test]
fn service_updates_replace_the_bag_wholesale() {
    let conn = open_db_in_memory().unwrap();
    let service = FilterService::new(SqliteFilterRepository::try_new(&conn).unwrap());
    let creator = Uuid::new_v4();

    let mut bag = ParamBag::new();
    bag.set("bucket_ids", json!([4, 2]));
    let saved = service.create_from_params(creator, bag).unwrap();
    let id = saved.id().unwrap();
    assert_eq!(saved.creator_uuid, Some(creator));

    let mut replacement = ParamBag::new();
    replacement.set("indexed_by", json!("popped"));
    let updated = service.update_params(id, replacement).unwrap();

    assert_eq!(updated.indexed_by(), Some(SortIndex::Popped));
    assert!(updated.bucket_ids().is_empty());
    assert_eq!(updated.creator_uuid, Some(creator));

    let reloaded = service.get_filter(id).unwrap().unwrap();
    assert_eq!(reloaded.params(), updated.params());
}

#[test]
fn updating_a_missing_filter_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = FilterService::new(SqliteFilterRepository::try_new(&conn).unwrap());

    let ghost = Uuid::new_v4();
    let err = service.update_params(ghost, ParamBag::new()).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == ghost));
}

#[test]
fn updating_an_unsaved_filter_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteFilterRepository::try_new(&conn).unwrap();

    let err = repo.update_filter(&Filter::new()).unwrap_err();
    assert!(matches!(err, RepoError::NotPersisted));
}

#[test]
fn list_scopes_to_one_creator() {
    let conn = open_db_in_memory().unwrap();
    let service = FilterService::new(SqliteFilterRepository::try_new(&conn).unwrap());
    let creator_a = Uuid::new_v4();
    let creator_b = Uuid::new_v4();

    let mut bag_one = ParamBag::new();
    bag_one.set("indexed_by", json!("newest"));
    let mut bag_two = ParamBag::new();
    bag_two.set("tag_ids", json!([9]));
    let mut bag_other = ParamBag::new();
    bag_other.set("indexed_by", json!("oldest"));

    let first = service.create_from_params(creator_a, bag_one).unwrap();
    let second = service.create_from_params(creator_a, bag_two).unwrap();
    service.create_from_params(creator_b, bag_other).unwrap();

    let listed: HashSet<_> = service
        .list_filters_by_creator(creator_a)
        .unwrap()
        .into_iter()
        .map(|filter| filter.id().unwrap())
        .collect();
    assert_eq!(
        listed,
        HashSet::from([first.id().unwrap(), second.id().unwrap()])
    );
}

#[test]
fn share_params_projects_the_saved_filter() {
    let conn = open_db_in_memory().unwrap();
    let service = FilterService::new(SqliteFilterRepository::try_new(&conn).unwrap());
    let creator = Uuid::new_v4();

    let mut bag = ParamBag::new();
    bag.set("indexed_by", json!("newest"));
    bag.set("internal_note", json!("do not leak"));
    let saved = service.create_from_params(creator, bag).unwrap();
    let id = saved.id().unwrap();

    let shared = service.share_params(id).unwrap().unwrap();
    assert_eq!(shared.get("indexed_by"), Some(&json!("newest")));
    assert_eq!(shared.get("filter_id"), Some(&json!(id.to_string())));
    assert!(shared.get("internal_note").is_none());

    assert!(service.share_params(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn deleting_a_filter_removes_it() {
    let conn = open_db_in_memory().unwrap();
    let service = FilterService::new(SqliteFilterRepository::try_new(&conn).unwrap());

    let saved = service
        .create_from_params(Uuid::new_v4(), ParamBag::new())
        .unwrap();
    let id = saved.id().unwrap();

    service.delete_filter(id).unwrap();
    assert!(service.get_filter(id).unwrap().is_none());

    let err = service.delete_filter(id).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(missing) if missing == id));
}

#[test]
fn repository_rejects_connection_without_filters_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteFilterRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("filters"))
    ));
}
