//! Page store connection
//!
//! Owns the single SQLite handle. Not `Sync`: shared access goes through
//! [`crate::Database`], which keeps the connection on one worker thread.

use std::panic::Location;
use std::path::Path;

use uuid::Uuid;

use crate::bind::Bindable;
use crate::error::{DatabaseError, Stage};
use crate::page::Page;
use crate::schema::{self, Column};
use crate::statement;

type Result<T> = std::result::Result<T, DatabaseError>;

pub struct Connection {
    conn: rusqlite::Connection,
}

impl Connection {
    #[track_caller]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let location = Location::caller();
        let path = path.as_ref();

        let conn = rusqlite::Connection::open(path)
            .map_err(|e| DatabaseError::from_sqlite(Stage::Open, location, e))?;

        tracing::info!(path = %path.display(), "Opened page store");

        Ok(Self { conn })
    }

    #[track_caller]
    pub fn open_in_memory() -> Result<Self> {
        let location = Location::caller();
        let conn = rusqlite::Connection::open_in_memory()
            .map_err(|e| DatabaseError::from_sqlite(Stage::Open, location, e))?;

        Ok(Self { conn })
    }

    /// Create the page table.
    ///
    /// Fails with SQLite's "already exists" error when the table is present;
    /// use [`Connection::has_schema`] to make it conditional.
    #[track_caller]
    pub fn setup(&self) -> Result<()> {
        self.execute(&schema::create_table_sql(), &[])?;
        tracing::info!(table = schema::TABLE, "Created page table");
        Ok(())
    }

    #[track_caller]
    pub fn has_schema(&self) -> Result<bool> {
        let counts = statement::query(
            &self.conn,
            schema::table_exists_sql(),
            &[&schema::TABLE],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(counts.first().copied().unwrap_or_default() > 0)
    }

    #[track_caller]
    pub fn insert(&self, page: &Page) -> Result<()> {
        self.execute(&schema::insert_sql(), &page.values(&Column::INSERT_ORDER))?;
        tracing::info!(page_id = %page.id, url = %page.url, "Inserted page");
        Ok(())
    }

    /// Rewrite an existing page. Returns `false` when no row has its id.
    #[track_caller]
    pub fn update(&self, page: &Page) -> Result<bool> {
        let mut params = page.values(&Column::MUTABLE);
        params.push(page.value(Column::Id));

        let changed = self.execute(&schema::update_sql(), &params)?;
        Ok(changed > 0)
    }

    #[track_caller]
    pub fn page(&self, id: Uuid) -> Result<Option<Page>> {
        let sql = schema::select_sql(&format!("WHERE {} = ?", Column::Id.name()));
        let mut pages = statement::query(&self.conn, &sql, &[&id], schema::page_from_row)?;
        Ok(pages.pop())
    }

    /// All pages, oldest first.
    #[track_caller]
    pub fn pages(&self) -> Result<Vec<Page>> {
        let sql = schema::select_sql(&format!(
            "ORDER BY {}, {}",
            Column::LastUpdated.name(),
            Column::Id.name()
        ));
        statement::query(&self.conn, &sql, &[], schema::page_from_row)
    }

    #[track_caller]
    pub fn execute(&self, sql: &str, params: &[&dyn Bindable]) -> Result<usize> {
        statement::execute(&self.conn, sql, params)
    }

    /// Close the handle, reporting SQLite's failure if it refuses.
    #[track_caller]
    pub fn close(self) -> Result<()> {
        let location = Location::caller();
        self.conn
            .close()
            .map_err(|(_, e)| DatabaseError::from_sqlite(Stage::Close, location, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use rusqlite::types::Value;
    use rusqlite::ErrorCode;
    use url::Url;

    use crate::page::NO_TITLE;

    fn store() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.setup().unwrap();
        conn
    }

    /// Read a row straight from the table, bypassing the page decoder.
    fn raw_row(conn: &Connection, id: &str) -> Vec<Value> {
        conn.conn
            .query_row(
                "SELECT id, lastUpdated, url, title, fullText, snapshot FROM PageData WHERE id = ?1",
                [id],
                |row| (0..6).map(|i| row.get::<_, Value>(i)).collect(),
            )
            .unwrap()
    }

    #[test]
    fn test_insert_scenario() {
        let conn = store();
        let id = Uuid::new_v4();
        let t0 = DateTime::from_timestamp(1_729_000_000, 750_000_000).unwrap();
        let page = Page::with_identity(id, Url::parse("https://example.com").unwrap(), t0);

        conn.insert(&page).unwrap();

        let row = raw_row(&conn, &id.to_string());
        assert_eq!(row[0], Value::Text(id.to_string()));
        assert_eq!(row[1], Value::Integer(1_729_000_000));
        assert_eq!(row[2], Value::Text("https://example.com/".to_string()));
        assert_eq!(row[3], Value::Text(NO_TITLE.to_string()));
        assert_eq!(row[4], Value::Null);
        assert_eq!(row[5], Value::Null);
    }

    #[test]
    fn test_insert_round_trips_all_fields() {
        let conn = store();
        let mut page = Page::new(Url::parse("https://www.objc.io/books?x=1#top").unwrap());
        page.title = "objc.io".to_string();
        page.full_text = Some("Books about Swift".to_string());
        page.snapshot = Some((0..=255u8).collect());

        conn.insert(&page).unwrap();

        let loaded = conn.page(page.id).unwrap().unwrap();
        assert_eq!(loaded.id, page.id);
        assert_eq!(loaded.url, page.url);
        assert_eq!(loaded.title, page.title);
        assert_eq!(loaded.full_text, page.full_text);
        assert_eq!(loaded.snapshot, page.snapshot);
        assert_eq!(loaded.last_updated.timestamp(), page.last_updated.timestamp());
        assert_eq!(loaded.last_updated.timestamp_subsec_nanos(), 0);
    }

    #[test]
    fn test_snapshot_bytes_round_trip() {
        let conn = store();
        let bytes: Vec<u8> = (0..4096u32).map(|i| (i * 31 % 251) as u8).collect();
        let mut page = Page::new(Url::parse("https://example.com").unwrap());
        page.snapshot = Some(bytes.clone());
        conn.insert(&page).unwrap();

        let row = raw_row(&conn, &page.id.to_string());
        assert_eq!(row[5], Value::Blob(bytes));
    }

    #[test]
    fn test_duplicate_identity_is_step_failure() {
        let conn = store();
        let page = Page::new(Url::parse("https://example.com").unwrap());
        conn.insert(&page).unwrap();

        let err = conn.insert(&page).unwrap_err();
        assert_eq!(err.stage(), Stage::Step);
        assert_eq!(err.error_code(), ErrorCode::ConstraintViolation);
        assert_eq!(conn.pages().unwrap().len(), 1);
    }

    #[test]
    fn test_setup_twice_fails_without_damage() {
        let conn = store();
        let page = Page::new(Url::parse("https://example.com").unwrap());
        conn.insert(&page).unwrap();

        let err = conn.setup().unwrap_err();
        assert!(matches!(err.stage(), Stage::Prepare | Stage::Step));
        assert!(err.message().contains("already exists"));

        assert!(conn.has_schema().unwrap());
        let ids: Vec<Uuid> = conn.pages().unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![page.id]);
    }

    #[test]
    fn test_insert_without_setup_is_prepare_failure() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(!conn.has_schema().unwrap());

        let page = Page::new(Url::parse("https://example.com").unwrap());
        let err = conn.insert(&page).unwrap_err();
        assert_eq!(err.stage(), Stage::Prepare);
        assert!(err.message().contains("no such table"));
    }

    #[test]
    fn test_update_rewrites_mutable_columns() {
        let conn = store();
        let mut page = Page::new(Url::parse("https://example.com").unwrap());
        conn.insert(&page).unwrap();

        page.set_title("Example Domain".to_string());
        page.set_full_text(Some("This domain is for use in examples.".to_string()));
        assert!(conn.update(&page).unwrap());

        let loaded = conn.page(page.id).unwrap().unwrap();
        assert_eq!(loaded.title, "Example Domain");
        assert_eq!(loaded.full_text, page.full_text);

        let unknown = Page::new(Url::parse("https://example.org").unwrap());
        assert!(!conn.update(&unknown).unwrap());
    }

    #[test]
    fn test_missing_page_is_none() {
        let conn = store();
        assert!(conn.page(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_pages_ordered_by_last_updated() {
        let conn = store();
        let url = Url::parse("https://example.com").unwrap();
        let newer = Page::with_identity(
            Uuid::new_v4(),
            url.clone(),
            DateTime::from_timestamp(2_000, 0).unwrap(),
        );
        let older = Page::with_identity(
            Uuid::new_v4(),
            url,
            DateTime::from_timestamp(1_000, 0).unwrap(),
        );
        conn.insert(&newer).unwrap();
        conn.insert(&older).unwrap();

        let ids: Vec<Uuid> = conn.pages().unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![older.id, newer.id]);
    }

    #[test]
    fn test_corrupt_row_is_decode_failure() {
        let conn = store();
        conn.conn
            .execute(
                "INSERT INTO PageData (id, lastUpdated, url, title) VALUES ('not-a-uuid', 0, 'https://example.com', 't')",
                [],
            )
            .unwrap();

        let err = conn.pages().unwrap_err();
        assert_eq!(err.stage(), Stage::Decode);
    }

    #[test]
    fn test_open_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("pages.sqlite");

        let err = Connection::open(&path).err().unwrap();
        assert_eq!(err.stage(), Stage::Open);
        assert_eq!(err.error_code(), ErrorCode::CannotOpen);
    }

    #[test]
    fn test_file_store_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pages.sqlite");
        let page = Page::new(Url::parse("https://example.com").unwrap());

        let conn = Connection::open(&path).unwrap();
        conn.setup().unwrap();
        conn.insert(&page).unwrap();
        conn.close().unwrap();

        let reopened = Connection::open(&path).unwrap();
        assert!(reopened.has_schema().unwrap());
        assert_eq!(reopened.page(page.id).unwrap().map(|p| p.url), Some(page.url));
    }
}
