//! User store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD/soft-delete APIs over canonical `users` storage.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - The store exclusively owns id assignment; caller-supplied ids on insert
//!   are never honored.
//! - Every successful mutation refreshes `updated_at`.
//! - `deleted_at` is written once by `soft_delete` and never overwritten.

use crate::db::schema::{declared_column_types, table_exists};
use crate::model::user::{User, UserPatch, USER_SCHEMA};
use crate::store::filter::{FieldValue, Filter};
use crate::store::{StoreError, StoreResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const USER_SELECT_SQL: &str = "SELECT
    id,
    name,
    age,
    is_active,
    created_at,
    updated_at,
    deleted_at
FROM users";

/// Current wall-clock time in epoch milliseconds, evaluated inside SQLite so
/// that every row touched by one statement shares one timestamp.
const NOW_MS_SQL: &str = "(strftime('%s', 'now') * 1000)";

/// Store interface for user CRUD and soft-delete operations.
///
/// Zero-row matches on update/delete methods return `Ok(0)`; only the
/// single-record fetch methods report [`StoreError::NotFound`].
pub trait UserStore {
    /// Persists one record, assigning a fresh id and both timestamps.
    ///
    /// Any id already present on `user` is ignored; identity belongs to the
    /// store. Returns the stored copy re-read from the row.
    fn insert(&self, user: &User) -> StoreResult<User>;

    /// Persists a batch in a single transaction, all-or-nothing.
    ///
    /// Any per-record failure (including a uniqueness violation) rolls back
    /// the entire batch. Returns the number of records persisted.
    fn insert_many(&self, users: &[User]) -> StoreResult<usize>;

    /// Returns the matching record with the smallest id.
    fn find_first(&self, filter: &Filter) -> StoreResult<User>;

    /// Returns the matching record with the largest id.
    fn find_last(&self, filter: &Filter) -> StoreResult<User>;

    /// Returns any one matching record, with no ordering guarantee.
    fn find_any(&self, filter: &Filter) -> StoreResult<User>;

    /// Returns all matching records in ascending id order.
    fn find_all(&self, filter: &Filter) -> StoreResult<Vec<User>>;

    /// Upserts by id presence.
    ///
    /// - `id = None`: behaves as [`UserStore::insert`], affected count 1.
    /// - `id = Some`: full-column update of the domain attributes on the
    ///   matching live row. A missing row yields affected count 0 and no
    ///   error; callers must check the count.
    fn save(&self, user: &User) -> StoreResult<(User, usize)>;

    /// Sets one named domain column on all matching non-deleted rows.
    fn update_column(
        &self,
        filter: &Filter,
        column: &str,
        value: FieldValue,
    ) -> StoreResult<usize>;

    /// Sets the columns carried by `patch` on all matching non-deleted rows.
    ///
    /// Zero-valued patch fields (`""`, `0`, `false`) are skipped unless named
    /// in `explicit_columns`: a zero value is indistinguishable from "not
    /// set" in the patch representation. A non-empty `explicit_columns` list
    /// selects exactly those columns, zero-valued or not. Writing `false` or
    /// `0` therefore requires the explicit list.
    fn update_columns(
        &self,
        filter: &Filter,
        patch: &UserPatch,
        explicit_columns: &[&str],
    ) -> StoreResult<usize>;

    /// Tombstones all matching non-deleted rows.
    ///
    /// Idempotent: already-deleted rows never match, even when the filter
    /// requests deleted visibility, so `deleted_at` stays monotonic.
    fn soft_delete(&self, filter: &Filter) -> StoreResult<usize>;

    /// Permanently removes all matching rows regardless of soft-delete
    /// state. Irreversible.
    fn hard_delete(&self, filter: &Filter) -> StoreResult<usize>;
}

/// SQLite-backed user store.
///
/// Holds a shared borrow of one connection; batch writes use an unchecked
/// transaction, which is sound because the store never hands the connection
/// to another in-process transaction while a batch is open.
#[derive(Debug)]
pub struct SqliteUserStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserStore<'conn> {
    /// Constructs a store from a bootstrapped connection.
    ///
    /// Verifies the expected table and column set before any operation is
    /// allowed, so later failures are semantic rather than schema drift.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn fetch_by_id(&self, id: i64) -> StoreResult<User> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query(params![id])?;
        match rows.next()? {
            Some(row) => parse_user_row(row),
            None => Err(StoreError::NotFound),
        }
    }

    /// Builds `SELECT ... WHERE 1 = 1 [AND deleted_at IS NULL] [conditions]`.
    fn select_sql(&self, filter: &Filter) -> StoreResult<(String, Vec<Value>)> {
        let mut sql = format!("{USER_SELECT_SQL} WHERE 1 = 1");
        let mut binds = Vec::new();
        if !filter.includes_deleted() {
            sql.push_str(" AND deleted_at IS NULL");
        }
        filter.append_conditions(&USER_SCHEMA, &mut sql, &mut binds)?;
        Ok((sql, binds))
    }

    fn find_one(&self, filter: &Filter, order: Option<&str>) -> StoreResult<User> {
        let (mut sql, binds) = self.select_sql(filter)?;
        if let Some(order) = order {
            sql.push_str(order);
        }
        sql.push_str(" LIMIT 1;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        match rows.next()? {
            Some(row) => parse_user_row(row),
            None => Err(StoreError::NotFound),
        }
    }
}

impl UserStore for SqliteUserStore<'_> {
    fn insert(&self, user: &User) -> StoreResult<User> {
        self.conn.execute(
            &format!(
                "INSERT INTO users (name, age, is_active, created_at, updated_at, deleted_at)
                 VALUES (?1, ?2, ?3, {NOW_MS_SQL}, {NOW_MS_SQL}, NULL);"
            ),
            params![user.name, user.age, i64::from(user.is_active)],
        )?;

        self.fetch_by_id(self.conn.last_insert_rowid())
    }

    fn insert_many(&self, users: &[User]) -> StoreResult<usize> {
        if users.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO users (name, age, is_active, created_at, updated_at, deleted_at)
                 VALUES (?1, ?2, ?3, {NOW_MS_SQL}, {NOW_MS_SQL}, NULL);"
            ))?;
            for user in users {
                // An error drops the transaction, rolling back every row
                // inserted so far.
                stmt.execute(params![user.name, user.age, i64::from(user.is_active)])?;
            }
        }
        tx.commit()?;

        Ok(users.len())
    }

    fn find_first(&self, filter: &Filter) -> StoreResult<User> {
        self.find_one(filter, Some(" ORDER BY id ASC"))
    }

    fn find_last(&self, filter: &Filter) -> StoreResult<User> {
        self.find_one(filter, Some(" ORDER BY id DESC"))
    }

    fn find_any(&self, filter: &Filter) -> StoreResult<User> {
        self.find_one(filter, None)
    }

    fn find_all(&self, filter: &Filter) -> StoreResult<Vec<User>> {
        let (mut sql, binds) = self.select_sql(filter)?;
        sql.push_str(" ORDER BY id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }

        Ok(users)
    }

    fn save(&self, user: &User) -> StoreResult<(User, usize)> {
        let Some(id) = user.id else {
            let stored = self.insert(user)?;
            return Ok((stored, 1));
        };

        let changed = self.conn.execute(
            &format!(
                "UPDATE users
                 SET
                    name = ?1,
                    age = ?2,
                    is_active = ?3,
                    updated_at = {NOW_MS_SQL}
                 WHERE id = ?4
                   AND deleted_at IS NULL;"
            ),
            params![user.name, user.age, i64::from(user.is_active), id],
        )?;

        if changed == 0 {
            return Ok((user.clone(), 0));
        }
        Ok((self.fetch_by_id(id)?, changed))
    }

    fn update_column(
        &self,
        filter: &Filter,
        column: &str,
        value: FieldValue,
    ) -> StoreResult<usize> {
        let column = writable_column(column)?;

        let mut sql = format!(
            "UPDATE users SET {column} = ?, updated_at = {NOW_MS_SQL}
             WHERE 1 = 1 AND deleted_at IS NULL"
        );
        let mut binds = vec![value.to_sql_value()];
        filter.append_conditions(&USER_SCHEMA, &mut sql, &mut binds)?;
        sql.push(';');

        Ok(self.conn.execute(&sql, params_from_iter(binds))?)
    }

    fn update_columns(
        &self,
        filter: &Filter,
        patch: &UserPatch,
        explicit_columns: &[&str],
    ) -> StoreResult<usize> {
        let assignments = patch_assignments(patch, explicit_columns)?;
        if assignments.is_empty() {
            // Nothing survived the zero-value policy; match the zero-row
            // update contract instead of erroring.
            return Ok(0);
        }

        let mut sql = String::from("UPDATE users SET ");
        let mut binds = Vec::new();
        for (column, value) in &assignments {
            sql.push_str(column);
            sql.push_str(" = ?, ");
            binds.push(value.to_sql_value());
        }
        sql.push_str(&format!(
            "updated_at = {NOW_MS_SQL} WHERE 1 = 1 AND deleted_at IS NULL"
        ));
        filter.append_conditions(&USER_SCHEMA, &mut sql, &mut binds)?;
        sql.push(';');

        Ok(self.conn.execute(&sql, params_from_iter(binds))?)
    }

    fn soft_delete(&self, filter: &Filter) -> StoreResult<usize> {
        let mut sql = format!(
            "UPDATE users
             SET deleted_at = {NOW_MS_SQL}, updated_at = {NOW_MS_SQL}
             WHERE 1 = 1 AND deleted_at IS NULL"
        );
        let mut binds = Vec::new();
        filter.append_conditions(&USER_SCHEMA, &mut sql, &mut binds)?;
        sql.push(';');

        Ok(self.conn.execute(&sql, params_from_iter(binds))?)
    }

    fn hard_delete(&self, filter: &Filter) -> StoreResult<usize> {
        let mut sql = String::from("DELETE FROM users WHERE 1 = 1");
        let mut binds = Vec::new();
        filter.append_conditions(&USER_SCHEMA, &mut sql, &mut binds)?;
        sql.push(';');

        Ok(self.conn.execute(&sql, params_from_iter(binds))?)
    }
}

fn ensure_connection_ready(conn: &Connection) -> StoreResult<()> {
    let table = USER_SCHEMA.table;
    if !table_exists(conn, table)? {
        return Err(StoreError::MissingTable(table));
    }

    let existing = declared_column_types(conn, table)?;
    for expected in USER_SCHEMA.expected_columns() {
        if !existing.iter().any(|(name, _)| name == expected) {
            return Err(StoreError::MissingColumn {
                table,
                column: expected.to_string(),
            });
        }
    }

    Ok(())
}

/// Resolves `column` to a writable domain attribute.
///
/// System columns (`id`, timestamps, the tombstone) are managed by the store
/// and rejected here.
fn writable_column(column: &str) -> StoreResult<&'static str> {
    match USER_SCHEMA.domain_column(column) {
        Some(def) => Ok(def.name),
        None => Err(StoreError::InvalidFilter(format!(
            "column `{column}` is not a writable attribute"
        ))),
    }
}

/// Applies the zero-value exclusion policy to a patch.
///
/// Empty `explicit_columns`: keep only non-zero fields. Non-empty: take
/// exactly the named columns from the patch, rejecting unknown names.
fn patch_assignments(
    patch: &UserPatch,
    explicit_columns: &[&str],
) -> StoreResult<Vec<(&'static str, FieldValue)>> {
    if explicit_columns.is_empty() {
        let mut assignments = Vec::new();
        if !patch.name.is_empty() {
            assignments.push(("name", FieldValue::Text(patch.name.clone())));
        }
        if patch.age != 0 {
            assignments.push(("age", FieldValue::Integer(patch.age)));
        }
        if patch.is_active {
            assignments.push(("is_active", FieldValue::Bool(patch.is_active)));
        }
        return Ok(assignments);
    }

    explicit_columns
        .iter()
        .map(|column| match *column {
            "name" => Ok(("name", FieldValue::Text(patch.name.clone()))),
            "age" => Ok(("age", FieldValue::Integer(patch.age))),
            "is_active" => Ok(("is_active", FieldValue::Bool(patch.is_active))),
            other => Err(StoreError::InvalidFilter(format!(
                "unknown column `{other}` in explicit column list"
            ))),
        })
        .collect()
}

fn parse_user_row(row: &Row<'_>) -> StoreResult<User> {
    let is_active = match row.get::<_, i64>("is_active")? {
        0 => false,
        1 => true,
        other => {
            return Err(StoreError::InvalidData(format!(
                "invalid is_active value `{other}` in users.is_active"
            )));
        }
    };

    Ok(User {
        id: Some(row.get("id")?),
        name: row.get("name")?,
        age: row.get("age")?,
        is_active,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::{patch_assignments, writable_column};
    use crate::model::user::UserPatch;
    use crate::store::filter::FieldValue;
    use crate::store::StoreError;

    #[test]
    fn writable_column_rejects_system_columns() {
        assert_eq!(writable_column("name").unwrap(), "name");
        assert!(matches!(
            writable_column("id"),
            Err(StoreError::InvalidFilter(_))
        ));
        assert!(matches!(
            writable_column("deleted_at"),
            Err(StoreError::InvalidFilter(_))
        ));
    }

    #[test]
    fn default_policy_drops_zero_valued_fields() {
        let patch = UserPatch {
            name: "masao".to_string(),
            age: 0,
            is_active: false,
        };
        let assignments = patch_assignments(&patch, &[]).unwrap();
        assert_eq!(
            assignments,
            vec![("name", FieldValue::Text("masao".to_string()))]
        );
    }

    #[test]
    fn explicit_columns_force_zero_values_through() {
        let patch = UserPatch {
            name: "masao".to_string(),
            age: 0,
            is_active: false,
        };
        let assignments = patch_assignments(&patch, &["name", "is_active"]).unwrap();
        assert_eq!(
            assignments,
            vec![
                ("name", FieldValue::Text("masao".to_string())),
                ("is_active", FieldValue::Bool(false)),
            ]
        );
    }

    #[test]
    fn unknown_explicit_column_is_rejected() {
        let err = patch_assignments(&UserPatch::default(), &["nickname"]).unwrap_err();
        assert!(matches!(err, StoreError::InvalidFilter(_)));
    }

    #[test]
    fn all_zero_patch_without_explicit_columns_is_a_no_op() {
        let assignments = patch_assignments(&UserPatch::default(), &[]).unwrap();
        assert!(assignments.is_empty());
    }
}
