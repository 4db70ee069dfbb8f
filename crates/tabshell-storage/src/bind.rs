//! Positional parameter binding
//!
//! A [`Bindable`] value knows how to attach itself to one `?` slot of a
//! prepared statement. New storable types only need an impl here; the
//! executor takes a slice of `&dyn Bindable` and never matches on types.

use chrono::{DateTime, Utc};
use rusqlite::types::Null;
use rusqlite::Statement;
use url::Url;
use uuid::Uuid;

pub trait Bindable {
    /// Bind `self` into the 1-based parameter slot `column` of `statement`.
    fn bind(&self, statement: &mut Statement<'_>, column: usize) -> rusqlite::Result<()>;
}

// rusqlite binds text and blobs with SQLITE_TRANSIENT, so SQLite keeps its
// own copy and the borrowed value may go away right after binding.
impl Bindable for str {
    fn bind(&self, statement: &mut Statement<'_>, column: usize) -> rusqlite::Result<()> {
        statement.raw_bind_parameter(column, self)
    }
}

impl Bindable for String {
    fn bind(&self, statement: &mut Statement<'_>, column: usize) -> rusqlite::Result<()> {
        self.as_str().bind(statement, column)
    }
}

impl Bindable for i64 {
    fn bind(&self, statement: &mut Statement<'_>, column: usize) -> rusqlite::Result<()> {
        statement.raw_bind_parameter(column, *self)
    }
}

impl Bindable for [u8] {
    fn bind(&self, statement: &mut Statement<'_>, column: usize) -> rusqlite::Result<()> {
        statement.raw_bind_parameter(column, self)
    }
}

impl Bindable for Vec<u8> {
    fn bind(&self, statement: &mut Statement<'_>, column: usize) -> rusqlite::Result<()> {
        self.as_slice().bind(statement, column)
    }
}

impl Bindable for Url {
    fn bind(&self, statement: &mut Statement<'_>, column: usize) -> rusqlite::Result<()> {
        self.as_str().bind(statement, column)
    }
}

/// Whole seconds since the Unix epoch; sub-second precision is dropped.
impl Bindable for DateTime<Utc> {
    fn bind(&self, statement: &mut Statement<'_>, column: usize) -> rusqlite::Result<()> {
        self.timestamp().bind(statement, column)
    }
}

impl Bindable for Uuid {
    fn bind(&self, statement: &mut Statement<'_>, column: usize) -> rusqlite::Result<()> {
        let mut buf = Uuid::encode_buffer();
        self.hyphenated().encode_lower(&mut buf).bind(statement, column)
    }
}

impl<T: Bindable> Bindable for Option<T> {
    fn bind(&self, statement: &mut Statement<'_>, column: usize) -> rusqlite::Result<()> {
        match self {
            Some(value) => value.bind(statement, column),
            None => statement.raw_bind_parameter(column, Null),
        }
    }
}

impl<T: Bindable + ?Sized> Bindable for &T {
    fn bind(&self, statement: &mut Statement<'_>, column: usize) -> rusqlite::Result<()> {
        (**self).bind(statement, column)
    }
}
