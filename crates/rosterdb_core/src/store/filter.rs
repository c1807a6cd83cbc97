//! Typed filter predicates for record selection.
//!
//! # Responsibility
//! - Build equality/comparison predicates on named columns through a typed
//!   builder.
//! - Render validated predicates as parameterized SQL fragments.
//!
//! # Invariants
//! - Column names are validated against the schema descriptor before any SQL
//!   is built; unknown columns are `InvalidFilter`, never interpolated.
//! - Conditions combine with AND only.

use crate::db::schema::TableSchema;
use crate::model::user::RecordId;
use crate::store::{StoreError, StoreResult};
use rusqlite::types::Value;

/// A single typed column value usable in filters and updates.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Bool(bool),
}

impl FieldValue {
    /// Converts to the SQLite bind representation. Booleans map to 0/1.
    pub(crate) fn to_sql_value(&self) -> Value {
        match self {
            Self::Text(text) => Value::Text(text.clone()),
            Self::Integer(number) => Value::Integer(*number),
            Self::Bool(flag) => Value::Integer(i64::from(*flag)),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Comparison operator for one filter condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Op {
    fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone)]
struct Condition {
    column: String,
    op: Op,
    value: FieldValue,
}

/// Predicate selecting zero or more records by column conditions.
///
/// Soft-deleted rows are excluded from reads by default; request them with
/// [`Filter::include_deleted`]. The flag has no effect on write paths, which
/// define their own visibility rules.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conditions: Vec<Condition>,
    with_deleted: bool,
}

impl Filter {
    /// Matches every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// Matches one record by store-assigned id.
    pub fn by_id(id: RecordId) -> Self {
        Self::all().eq("id", id)
    }

    pub fn eq(self, column: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.push(column, Op::Eq, value)
    }

    pub fn ne(self, column: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.push(column, Op::Ne, value)
    }

    pub fn lt(self, column: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.push(column, Op::Lt, value)
    }

    pub fn le(self, column: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.push(column, Op::Le, value)
    }

    pub fn gt(self, column: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.push(column, Op::Gt, value)
    }

    pub fn ge(self, column: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.push(column, Op::Ge, value)
    }

    /// Widens reads to include soft-deleted records.
    pub fn include_deleted(mut self) -> Self {
        self.with_deleted = true;
        self
    }

    /// Returns whether reads should see soft-deleted records.
    pub fn includes_deleted(&self) -> bool {
        self.with_deleted
    }

    /// Returns whether the filter carries no conditions (matches all).
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    fn push(mut self, column: impl Into<String>, op: Op, value: impl Into<FieldValue>) -> Self {
        self.conditions.push(Condition {
            column: column.into(),
            op,
            value: value.into(),
        });
        self
    }

    /// Appends ` AND <column> <op> ?` fragments and their bind values.
    ///
    /// Callers are expected to have seeded `sql` with a `WHERE` clause that
    /// the fragments can extend (teacher pattern: `WHERE 1 = 1`).
    pub(crate) fn append_conditions(
        &self,
        schema: &TableSchema,
        sql: &mut String,
        binds: &mut Vec<Value>,
    ) -> StoreResult<()> {
        for condition in &self.conditions {
            if !schema.is_filterable(&condition.column) {
                return Err(StoreError::InvalidFilter(format!(
                    "unknown column `{}` in filter",
                    condition.column
                )));
            }
            sql.push_str(" AND ");
            sql.push_str(&condition.column);
            sql.push(' ');
            sql.push_str(condition.op.sql());
            sql.push_str(" ?");
            binds.push(condition.value.to_sql_value());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldValue, Filter};
    use crate::model::user::USER_SCHEMA;
    use crate::store::StoreError;
    use rusqlite::types::Value;

    fn render(filter: &Filter) -> Result<(String, Vec<Value>), StoreError> {
        let mut sql = String::from("WHERE 1 = 1");
        let mut binds = Vec::new();
        filter.append_conditions(&USER_SCHEMA, &mut sql, &mut binds)?;
        Ok((sql, binds))
    }

    #[test]
    fn empty_filter_renders_no_conditions() {
        let (sql, binds) = render(&Filter::all()).unwrap();
        assert_eq!(sql, "WHERE 1 = 1");
        assert!(binds.is_empty());
    }

    #[test]
    fn conditions_render_in_order_with_binds() {
        let filter = Filter::all().eq("name", "hanako").gt("age", 17_i64);
        let (sql, binds) = render(&filter).unwrap();
        assert_eq!(sql, "WHERE 1 = 1 AND name = ? AND age > ?");
        assert_eq!(
            binds,
            vec![Value::Text("hanako".to_string()), Value::Integer(17)]
        );
    }

    #[test]
    fn bool_values_bind_as_integers() {
        let filter = Filter::all().eq("is_active", true);
        let (_, binds) = render(&filter).unwrap();
        assert_eq!(binds, vec![Value::Integer(1)]);
    }

    #[test]
    fn unknown_column_is_rejected_before_sql_is_built() {
        let filter = Filter::all().eq("nickname", "x");
        let err = render(&filter).unwrap_err();
        assert!(matches!(err, StoreError::InvalidFilter(_)));
    }

    #[test]
    fn by_id_targets_the_id_column() {
        let (sql, binds) = render(&Filter::by_id(7)).unwrap();
        assert_eq!(sql, "WHERE 1 = 1 AND id = ?");
        assert_eq!(binds, vec![Value::Integer(7)]);
    }

    #[test]
    fn field_value_conversions_cover_domain_types() {
        assert_eq!(FieldValue::from("a"), FieldValue::Text("a".to_string()));
        assert_eq!(FieldValue::from(3_i64), FieldValue::Integer(3));
        assert_eq!(FieldValue::from(false), FieldValue::Bool(false));
    }
}
