//! Helpers shared by the query modules: timestamps, error mapping,
//! transactions, field validation and partial-update statements.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Transaction, TransactionBehavior};
use reg_core::{Error, Result};

/// Current time as an RFC 3339 string.
pub(crate) fn now() -> String {
    Utc::now().to_rfc3339()
}

pub(crate) fn db_err(e: rusqlite::Error) -> Error {
    Error::database(e.to_string())
}

/// True when `e` is a UNIQUE or PRIMARY KEY constraint failure.
pub(crate) fn is_unique_violation(e: &rusqlite::Error) -> bool {
    match e {
        rusqlite::Error::SqliteFailure(f, _) => matches!(
            f.extended_code,
            rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        ),
        _ => false,
    }
}

/// Map a write failure, turning uniqueness violations into validation errors.
pub(crate) fn unique_or_db(e: rusqlite::Error, message: impl FnOnce() -> String) -> Error {
    if is_unique_violation(&e) {
        Error::Validation(message())
    } else {
        db_err(e)
    }
}

/// Run `f` inside an IMMEDIATE transaction, committing only on success.
///
/// IMMEDIATE takes the write lock up front, so concurrent writers queue on
/// the busy timeout instead of failing mid-transaction.
pub(crate) fn immediate<T>(conn: &Connection, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate).map_err(db_err)?;
    let out = f(&tx)?;
    tx.commit().map_err(db_err)?;
    Ok(out)
}

// ---------------------------------------------------------------------------
// field validation
// ---------------------------------------------------------------------------

/// Column limits for text fields.
pub(crate) const SHORT_TEXT: usize = 100;
pub(crate) const STREET_TEXT: usize = 255;
pub(crate) const PHONE_TEXT: usize = 15;
pub(crate) const USERNAME_TEXT: usize = 150;
pub(crate) const EMAIL_TEXT: usize = 254;

pub(crate) fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{field} is required")));
    }
    Ok(())
}

/// Reject `value` when it is longer than `max` characters.
pub(crate) fn check_len(field: &str, value: &str, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len > max {
        return Err(Error::Validation(format!(
            "{field} must be at most {max} characters, got {len}"
        )));
    }
    Ok(())
}

/// Non-blank and no longer than `max`.
pub(crate) fn check_required(field: &str, value: &str, max: usize) -> Result<()> {
    require_text(field, value)?;
    check_len(field, value, max)
}

/// Accept a `YYYY-MM-DD` calendar date.
pub(crate) fn check_date(field: &str, value: &str) -> Result<()> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| Error::Validation(format!("{field} must be a YYYY-MM-DD date, got '{value}'")))
}

pub(crate) fn check_opt_date(field: &str, value: Option<&str>) -> Result<()> {
    value.map_or(Ok(()), |v| check_date(field, v))
}

/// Accept an RFC 3339 timestamp or a naive `YYYY-MM-DD HH:MM:SS`.
pub(crate) fn check_timestamp(field: &str, value: &str) -> Result<()> {
    let ok = DateTime::parse_from_rfc3339(value).is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").is_ok();
    if ok {
        Ok(())
    } else {
        Err(Error::Validation(format!("{field} must be an RFC 3339 timestamp, got '{value}'")))
    }
}

pub(crate) fn check_opt_timestamp(field: &str, value: Option<&str>) -> Result<()> {
    value.map_or(Ok(()), |v| check_timestamp(field, v))
}

// ---------------------------------------------------------------------------
// partial updates
// ---------------------------------------------------------------------------

/// Column assignments for an `UPDATE` built from a partial changes struct.
#[derive(Debug, Default)]
pub(crate) struct ChangeSet {
    columns: Vec<&'static str>,
    values: Vec<Value>,
}

impl ChangeSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Assign `column` when a new value was supplied.
    pub(crate) fn set<T: Into<Value>>(&mut self, column: &'static str, value: Option<T>) {
        if let Some(v) = value {
            self.columns.push(column);
            self.values.push(v.into());
        }
    }

    /// Assign a nullable column: `Some(None)` writes NULL.
    pub(crate) fn set_nullable<T: Into<Value>>(
        &mut self,
        column: &'static str,
        value: Option<Option<T>>,
    ) {
        if let Some(v) = value {
            self.columns.push(column);
            self.values.push(v.map_or(Value::Null, Into::into));
        }
    }

    /// Execute the update, always refreshing `modified_at`.
    ///
    /// Returns the number of rows matched by `key_column = key`.
    pub(crate) fn apply(
        mut self,
        conn: &Connection,
        table: &str,
        key_column: &str,
        key: i64,
    ) -> rusqlite::Result<usize> {
        self.columns.push("modified_at");
        self.values.push(Value::Text(now()));

        let assignments = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{c} = ?{}", i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {table} SET {assignments} WHERE {key_column} = ?{}",
            self.values.len() + 1
        );
        self.values.push(Value::Integer(key));
        conn.execute(&sql, params_from_iter(self.values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates() {
        assert!(check_date("start_date", "2024-09-01").is_ok());
        assert!(check_date("start_date", "2024-13-01").is_err());
        assert!(check_date("start_date", "01/09/2024").is_err());
    }

    #[test]
    fn timestamps() {
        assert!(check_timestamp("given_at", "2024-09-01T08:30:00Z").is_ok());
        assert!(check_timestamp("given_at", "2024-09-01 08:30:00").is_ok());
        assert!(check_timestamp("given_at", "yesterday").is_err());
    }

    #[test]
    fn required_text() {
        assert!(require_text("name", "Physics").is_ok());
        assert!(require_text("name", "   ").is_err());
    }

    #[test]
    fn change_set_writes_only_supplied_columns() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (id INTEGER PRIMARY KEY, a TEXT, b TEXT, modified_at TEXT);
             INSERT INTO t VALUES (1, 'a0', 'b0', 'never');",
        )
        .unwrap();

        let mut set = ChangeSet::new();
        set.set("a", Some("a1".to_string()));
        set.set::<String>("b", None);
        assert_eq!(set.apply(&conn, "t", "id", 1).unwrap(), 1);

        let (a, b, m): (String, String, String) = conn
            .query_row("SELECT a, b, modified_at FROM t", [], |r| {
                Ok((r.get(0)?, r.get(1)?, r.get(2)?))
            })
            .unwrap();
        assert_eq!(a, "a1");
        assert_eq!(b, "b0");
        assert_ne!(m, "never");

        let mut set = ChangeSet::new();
        set.set_nullable::<String>("b", Some(None));
        set.apply(&conn, "t", "id", 1).unwrap();
        let b: Option<String> = conn.query_row("SELECT b FROM t", [], |r| r.get(0)).unwrap();
        assert_eq!(b, None);

        assert_eq!(ChangeSet::new().apply(&conn, "t", "id", 99).unwrap(), 0);
    }
}
