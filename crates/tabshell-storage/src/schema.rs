//! Page table layout
//!
//! Every statement touching the page table is generated from [`Column`], so
//! the column list in the SQL text and the order of bound values cannot
//! drift apart.

use chrono::DateTime;
use rusqlite::types::Type;
use rusqlite::Row;
use url::Url;
use uuid::Uuid;

use crate::page::Page;

pub const TABLE: &str = "PageData";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Id,
    LastUpdated,
    Url,
    Title,
    FullText,
    Snapshot,
}

impl Column {
    /// On-disk column order.
    pub const TABLE_ORDER: [Column; 6] = [
        Column::Id,
        Column::LastUpdated,
        Column::Url,
        Column::Title,
        Column::FullText,
        Column::Snapshot,
    ];

    /// Order in which an insert binds its values.
    pub const INSERT_ORDER: [Column; 6] = [
        Column::Id,
        Column::Title,
        Column::Url,
        Column::LastUpdated,
        Column::FullText,
        Column::Snapshot,
    ];

    /// Columns an update may rewrite; identity is immutable.
    pub const MUTABLE: [Column; 5] = [
        Column::Title,
        Column::Url,
        Column::LastUpdated,
        Column::FullText,
        Column::Snapshot,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::LastUpdated => "lastUpdated",
            Column::Url => "url",
            Column::Title => "title",
            Column::FullText => "fullText",
            Column::Snapshot => "snapshot",
        }
    }

    fn definition(&self) -> &'static str {
        match self {
            Column::Id => "TEXT PRIMARY KEY NOT NULL",
            Column::LastUpdated => "INTEGER NOT NULL",
            Column::Url => "TEXT NOT NULL",
            Column::Title => "TEXT NOT NULL",
            Column::FullText => "TEXT",
            Column::Snapshot => "BLOB",
        }
    }
}

fn column_list(columns: &[Column]) -> String {
    columns
        .iter()
        .map(Column::name)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn create_table_sql() -> String {
    let columns = Column::TABLE_ORDER
        .iter()
        .map(|c| format!("    {} {}", c.name(), c.definition()))
        .collect::<Vec<_>>()
        .join(",\n");
    format!("CREATE TABLE {TABLE} (\n{columns}\n)")
}

pub fn insert_sql() -> String {
    let placeholders = vec!["?"; Column::INSERT_ORDER.len()].join(", ");
    format!(
        "INSERT INTO {TABLE} ({}) VALUES ({placeholders})",
        column_list(&Column::INSERT_ORDER)
    )
}

/// Update of every mutable column; the id is bound last.
pub fn update_sql() -> String {
    let assignments = Column::MUTABLE
        .iter()
        .map(|c| format!("{} = ?", c.name()))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "UPDATE {TABLE} SET {assignments} WHERE {} = ?",
        Column::Id.name()
    )
}

/// Select of all columns in [`Column::TABLE_ORDER`], with an optional tail
/// such as a `WHERE` or `ORDER BY` clause.
pub fn select_sql(tail: &str) -> String {
    let sql = format!(
        "SELECT {} FROM {TABLE}",
        column_list(&Column::TABLE_ORDER)
    );
    if tail.is_empty() {
        sql
    } else {
        format!("{sql} {tail}")
    }
}

pub fn table_exists_sql() -> &'static str {
    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?"
}

fn index_of(column: Column) -> usize {
    Column::TABLE_ORDER
        .iter()
        .position(|&c| c == column)
        .unwrap_or_default()
}

fn conversion_error(
    column: Column,
    ty: Type,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index_of(column), ty, Box::new(err))
}

/// Decode a row produced by [`select_sql`].
pub fn page_from_row(row: &Row<'_>) -> rusqlite::Result<Page> {
    let id: String = row.get(index_of(Column::Id))?;
    let id = Uuid::parse_str(&id).map_err(|e| conversion_error(Column::Id, Type::Text, e))?;

    let url: String = row.get(index_of(Column::Url))?;
    let url = Url::parse(&url).map_err(|e| conversion_error(Column::Url, Type::Text, e))?;

    let seconds: i64 = row.get(index_of(Column::LastUpdated))?;
    let last_updated = DateTime::from_timestamp(seconds, 0).ok_or(
        rusqlite::Error::IntegralValueOutOfRange(index_of(Column::LastUpdated), seconds),
    )?;

    Ok(Page {
        id,
        url,
        title: row.get(index_of(Column::Title))?,
        full_text: row.get(index_of(Column::FullText))?,
        last_updated,
        snapshot: row.get(index_of(Column::Snapshot))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_table_sql() {
        let sql = create_table_sql();
        assert_eq!(
            sql,
            "CREATE TABLE PageData (\n    id TEXT PRIMARY KEY NOT NULL,\n    lastUpdated INTEGER NOT NULL,\n    url TEXT NOT NULL,\n    title TEXT NOT NULL,\n    fullText TEXT,\n    snapshot BLOB\n)"
        );
    }

    #[test]
    fn test_insert_sql_follows_insert_order() {
        assert_eq!(
            insert_sql(),
            "INSERT INTO PageData (id, title, url, lastUpdated, fullText, snapshot) VALUES (?, ?, ?, ?, ?, ?)"
        );
    }

    #[test]
    fn test_update_sql_binds_id_last() {
        assert_eq!(
            update_sql(),
            "UPDATE PageData SET title = ?, url = ?, lastUpdated = ?, fullText = ?, snapshot = ? WHERE id = ?"
        );
    }

    #[test]
    fn test_select_sql() {
        assert_eq!(
            select_sql("WHERE id = ?"),
            "SELECT id, lastUpdated, url, title, fullText, snapshot FROM PageData WHERE id = ?"
        );
        assert!(select_sql("").ends_with("FROM PageData"));
    }

    #[test]
    fn test_every_column_has_one_slot() {
        for column in Column::TABLE_ORDER {
            assert!(Column::INSERT_ORDER.contains(&column));
            assert_eq!(Column::TABLE_ORDER[index_of(column)], column);
        }
        assert!(!Column::MUTABLE.contains(&Column::Id));
    }
}
