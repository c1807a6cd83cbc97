use rosterdb_core::db::open_db_in_memory;
use rosterdb_core::{Filter, SqliteUserStore, StoreError, User, UserStore};
use rusqlite::Connection;

#[test]
fn insert_assigns_unique_strictly_increasing_ids() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteUserStore::try_new(&conn).unwrap();

    let a = store.insert(&User::new("ichiro", 20, true)).unwrap();
    let b = store.insert(&User::new("jiro", 19, false)).unwrap();
    let c = store.insert(&User::new("hanako", 18, true)).unwrap();

    let (id_a, id_b, id_c) = (a.id.unwrap(), b.id.unwrap(), c.id.unwrap());
    assert!(id_a < id_b);
    assert!(id_b < id_c);
}

#[test]
fn insert_sets_both_timestamps_and_clears_tombstone() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteUserStore::try_new(&conn).unwrap();

    let stored = store.insert(&User::new("ichiro", 20, true)).unwrap();
    assert!(stored.created_at > 0);
    assert!(stored.updated_at >= stored.created_at);
    assert_eq!(stored.deleted_at, None);
    assert_eq!(stored.name, "ichiro");
    assert_eq!(stored.age, 20);
    assert!(stored.is_active);
}

#[test]
fn insert_ignores_caller_supplied_id() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteUserStore::try_new(&conn).unwrap();

    let mut user = User::new("ichiro", 20, true);
    user.id = Some(9999);
    let stored = store.insert(&user).unwrap();

    assert_ne!(stored.id, Some(9999));
}

#[test]
fn duplicate_name_is_a_constraint_violation() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteUserStore::try_new(&conn).unwrap();

    store.insert(&User::new("ichiro", 20, true)).unwrap();
    let err = store.insert(&User::new("ichiro", 33, false)).unwrap_err();
    assert!(matches!(err, StoreError::ConstraintViolation(_)));
}

#[test]
fn find_first_and_last_follow_insertion_order() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteUserStore::try_new(&conn).unwrap();

    let a = store.insert(&User::new("a", 20, true)).unwrap();
    store.insert(&User::new("b", 19, false)).unwrap();
    let c = store.insert(&User::new("c", 18, true)).unwrap();

    assert_eq!(store.find_first(&Filter::all()).unwrap().id, a.id);
    assert_eq!(store.find_last(&Filter::all()).unwrap().id, c.id);
}

#[test]
fn find_any_returns_some_match_and_not_found_on_empty_store() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteUserStore::try_new(&conn).unwrap();

    let err = store.find_any(&Filter::all()).unwrap_err();
    assert!(matches!(err, StoreError::NotFound));

    store.insert(&User::new("solo", 42, true)).unwrap();
    assert_eq!(store.find_any(&Filter::all()).unwrap().name, "solo");
}

#[test]
fn single_record_fetches_honor_filters() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteUserStore::try_new(&conn).unwrap();

    store.insert(&User::new("ichiro", 20, true)).unwrap();
    store.insert(&User::new("jiro", 19, false)).unwrap();
    store.insert(&User::new("hanako", 18, true)).unwrap();

    let adult = store
        .find_first(&Filter::all().ge("age", 19_i64).eq("is_active", true))
        .unwrap();
    assert_eq!(adult.name, "ichiro");

    let err = store
        .find_first(&Filter::all().gt("age", 99_i64))
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound));
}

#[test]
fn find_all_returns_matches_in_ascending_id_order() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteUserStore::try_new(&conn).unwrap();

    store.insert(&User::new("c-name", 30, true)).unwrap();
    store.insert(&User::new("a-name", 31, true)).unwrap();
    store.insert(&User::new("b-name", 32, true)).unwrap();

    let all = store.find_all(&Filter::all()).unwrap();
    let ids: Vec<_> = all.iter().map(|user| user.id.unwrap()).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted);
    assert_eq!(all.len(), 3);
}

#[test]
fn soft_deleted_rows_are_hidden_from_default_reads() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteUserStore::try_new(&conn).unwrap();

    let keep = store.insert(&User::new("keep", 20, true)).unwrap();
    let doomed = store.insert(&User::new("doomed", 21, true)).unwrap();

    let affected = store
        .soft_delete(&Filter::by_id(doomed.id.unwrap()))
        .unwrap();
    assert_eq!(affected, 1);

    let visible = store.find_all(&Filter::all()).unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, keep.id);

    let err = store
        .find_first(&Filter::by_id(doomed.id.unwrap()))
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound));

    let everything = store.find_all(&Filter::all().include_deleted()).unwrap();
    assert_eq!(everything.len(), 2);

    let tombstoned = store
        .find_first(&Filter::by_id(doomed.id.unwrap()).include_deleted())
        .unwrap();
    assert!(tombstoned.is_deleted());
    assert!(tombstoned.deleted_at.unwrap() > 0);
}

#[test]
fn soft_delete_refreshes_updated_at_on_tombstoned_rows() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteUserStore::try_new(&conn).unwrap();

    let user = store.insert(&User::new("taro", 25, true)).unwrap();
    let id = user.id.unwrap();
    conn.execute("UPDATE users SET updated_at = 1000;", [])
        .unwrap();

    assert_eq!(store.soft_delete(&Filter::by_id(id)).unwrap(), 1);

    let tombstoned = store
        .find_first(&Filter::by_id(id).include_deleted())
        .unwrap();
    assert!(tombstoned.updated_at > 1000);
    assert!(tombstoned.deleted_at.unwrap() > 0);
}

#[test]
fn soft_delete_is_idempotent_and_preserves_the_tombstone() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteUserStore::try_new(&conn).unwrap();

    let user = store.insert(&User::new("taro", 25, true)).unwrap();
    let id = user.id.unwrap();

    assert_eq!(store.soft_delete(&Filter::by_id(id)).unwrap(), 1);
    let first_tombstone = store
        .find_first(&Filter::by_id(id).include_deleted())
        .unwrap()
        .deleted_at;

    // Second pass matches nothing, even when the filter can see deleted rows.
    assert_eq!(store.soft_delete(&Filter::by_id(id)).unwrap(), 0);
    assert_eq!(
        store
            .soft_delete(&Filter::by_id(id).include_deleted())
            .unwrap(),
        0
    );

    let second_tombstone = store
        .find_first(&Filter::by_id(id).include_deleted())
        .unwrap()
        .deleted_at;
    assert_eq!(first_tombstone, second_tombstone);
}

#[test]
fn hard_delete_removes_rows_regardless_of_soft_delete_state() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteUserStore::try_new(&conn).unwrap();

    let user = store.insert(&User::new("taro", 25, true)).unwrap();
    let id = user.id.unwrap();
    store.soft_delete(&Filter::by_id(id)).unwrap();

    assert_eq!(store.hard_delete(&Filter::by_id(id)).unwrap(), 1);
    let err = store
        .find_first(&Filter::by_id(id).include_deleted())
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound));
}

#[test]
fn hard_delete_with_no_match_is_not_an_error() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteUserStore::try_new(&conn).unwrap();

    assert_eq!(store.hard_delete(&Filter::by_id(12345)).unwrap(), 0);
}

#[test]
fn save_without_id_inserts_a_fresh_record() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteUserStore::try_new(&conn).unwrap();

    let (stored, affected) = store.save(&User::new("hanako", 18, true)).unwrap();
    assert_eq!(affected, 1);
    assert!(stored.id.is_some());
    assert!(stored.created_at > 0);
}

#[test]
fn save_with_id_updates_every_domain_column() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteUserStore::try_new(&conn).unwrap();

    let mut user = store.insert(&User::new("hanako", 18, true)).unwrap();
    user.name = "taro".to_string();
    user.age = 40;
    user.is_active = false;

    let (stored, affected) = store.save(&user).unwrap();
    assert_eq!(affected, 1);
    assert_eq!(stored.name, "taro");
    assert_eq!(stored.age, 40);
    assert!(!stored.is_active);
    assert_eq!(stored.created_at, user.created_at);
}

#[test]
fn save_with_unknown_id_returns_zero_affected_without_error() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteUserStore::try_new(&conn).unwrap();

    let mut ghost = User::new("ghost", 1, false);
    ghost.id = Some(424242);

    let (returned, affected) = store.save(&ghost).unwrap();
    assert_eq!(affected, 0);
    assert_eq!(returned.id, Some(424242));
}

#[test]
fn unknown_filter_column_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteUserStore::try_new(&conn).unwrap();

    let err = store
        .find_all(&Filter::all().eq("nickname", "x"))
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidFilter(_)));
}

#[test]
fn store_rejects_connection_without_users_table() {
    let conn = Connection::open_in_memory().unwrap();

    let result = SqliteUserStore::try_new(&conn);
    assert!(matches!(result, Err(StoreError::MissingTable("users"))));
}

#[test]
fn store_rejects_connection_missing_a_required_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            age INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            deleted_at INTEGER
        );",
    )
    .unwrap();

    let result = SqliteUserStore::try_new(&conn);
    match result {
        Err(StoreError::MissingColumn { table, column }) => {
            assert_eq!(table, "users");
            assert_eq!(column, "is_active");
        }
        other => panic!("expected missing column error, got {other:?}"),
    }
}
