//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable that sequences the store operations
//!   against an in-memory database.
//! - Keep output deterministic for quick local sanity checks.

use rosterdb_core::db::open_db_in_memory;
use rosterdb_core::{FieldValue, Filter, SqliteUserStore, User, UserPatch, UserStore};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    println!("rosterdb_core version={}", rosterdb_core::core_version());

    let conn = open_db_in_memory()?;
    let store = SqliteUserStore::try_new(&conn)?;

    let ichiro = store.insert(&User::new("ichiro", 20, true))?;
    let batch = store.insert_many(&[
        User::new("jiro", 19, false),
        User::new("hanako", 18, true),
        User::new("tama", 3, true),
    ])?;
    println!("inserted=1 batch={batch}");

    let first = store.find_first(&Filter::all())?;
    let last = store.find_last(&Filter::all())?;
    println!("first={} last={}", first.name, last.name);

    let renamed = store.update_column(
        &Filter::by_id(last.id.expect("persisted record carries an id")),
        "name",
        FieldValue::from("saburo"),
    )?;
    println!("renamed={renamed}");

    // Writing `false` needs the explicit column list; the zero-value policy
    // would otherwise skip it.
    let deactivated = store.update_columns(
        &Filter::by_id(ichiro.id.expect("persisted record carries an id")),
        &UserPatch {
            is_active: false,
            ..UserPatch::default()
        },
        &["is_active"],
    )?;
    println!("deactivated={deactivated}");

    let tombstoned = store.soft_delete(&Filter::all().eq("name", "jiro"))?;
    let visible = store.find_all(&Filter::all())?.len();
    println!("soft_deleted={tombstoned} visible={visible}");

    let purged = store.hard_delete(&Filter::all().eq("name", "jiro"))?;
    println!("hard_deleted={purged}");

    Ok(())
}
