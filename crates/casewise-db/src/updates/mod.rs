//! Update builder types for entity mutations.
//!
//! Each builder produces an update struct with `Option` fields. Only `Some` fields
//! generate SET clauses in the dynamic UPDATE SQL; `Some(None)` writes NULL. The
//! update is also serialized (changed fields only) as the audit `detail`.

pub mod case;
pub mod interaction;
pub mod participant;
pub mod report;
pub mod task;

use chrono::{DateTime, NaiveDate, Utc};

use crate::helpers::format_date;

/// Trim a replacement for a required text column, matching how creates
/// normalize the same field.
pub(crate) fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

/// Accumulates `column = ?N` fragments and their positional parameters.
#[derive(Debug, Default)]
pub(crate) struct SetClause {
    sets: Vec<String>,
    params: Vec<libsql::Value>,
}

impl SetClause {
    pub(crate) fn text(&mut self, column: &str, value: Option<&String>) {
        if let Some(value) = value {
            self.push(column, libsql::Value::Text(value.clone()));
        }
    }

    pub(crate) fn nullable_text(&mut self, column: &str, value: Option<&Option<String>>) {
        if let Some(value) = value {
            self.push(
                column,
                value
                    .clone()
                    .map_or(libsql::Value::Null, libsql::Value::Text),
            );
        }
    }

    pub(crate) fn nullable_date(&mut self, column: &str, value: Option<&Option<NaiveDate>>) {
        if let Some(value) = value {
            self.push(
                column,
                value.map_or(libsql::Value::Null, |d| libsql::Value::Text(format_date(d))),
            );
        }
    }

    pub(crate) fn nullable_u32(&mut self, column: &str, value: Option<&Option<u32>>) {
        if let Some(value) = value {
            self.push(
                column,
                value.map_or(libsql::Value::Null, |v| libsql::Value::Integer(i64::from(v))),
            );
        }
    }

    pub(crate) fn enum_str(&mut self, column: &str, value: Option<&'static str>) {
        if let Some(value) = value {
            self.push(column, libsql::Value::Text(value.to_string()));
        }
    }

    pub(crate) fn datetime(&mut self, column: &str, value: Option<DateTime<Utc>>) {
        if let Some(value) = value {
            self.push(column, libsql::Value::Text(value.to_rfc3339()));
        }
    }

    fn push(&mut self, column: &str, value: libsql::Value) {
        self.params.push(value);
        self.sets.push(format!("{column} = ?{}", self.params.len()));
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Finish as `UPDATE {table} SET ..., updated_at = ? WHERE id = ?`.
    pub(crate) fn into_update(
        mut self,
        table: &str,
        id: &str,
        now: DateTime<Utc>,
    ) -> (String, Vec<libsql::Value>) {
        self.push("updated_at", libsql::Value::Text(now.to_rfc3339()));
        self.params.push(libsql::Value::Text(id.to_string()));
        let sql = format!(
            "UPDATE {table} SET {} WHERE id = ?{}",
            self.sets.join(", "),
            self.params.len()
        );
        (sql, self.params)
    }
}
