//! Page record
//!
//! One browser tab's metadata and cached content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::bind::Bindable;
use crate::schema::Column;

/// Title shown until the page reports its own.
pub const NO_TITLE: &str = "No title";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Page {
    /// Unique identifier, generated on creation and never reused
    pub id: Uuid,
    /// Absolute URL of the page
    pub url: Url,
    pub title: String,
    /// Extracted text content, once available
    pub full_text: Option<String>,
    /// Creation time, then the time of the last content change
    pub last_updated: DateTime<Utc>,
    /// Encoded snapshot image, once captured
    pub snapshot: Option<Vec<u8>>,
}

impl Page {
    pub fn new(url: Url) -> Self {
        Self::with_identity(Uuid::new_v4(), url, Utc::now())
    }

    pub fn with_identity(id: Uuid, url: Url, now: DateTime<Utc>) -> Self {
        Self {
            id,
            url,
            title: NO_TITLE.to_string(),
            full_text: None,
            last_updated: now,
            snapshot: None,
        }
    }

    pub fn set_title(&mut self, title: String) {
        self.title = title;
        self.touch();
    }

    pub fn set_full_text(&mut self, full_text: Option<String>) {
        self.full_text = full_text;
        self.touch();
    }

    pub fn set_snapshot(&mut self, snapshot: Option<Vec<u8>>) {
        self.snapshot = snapshot;
        self.touch();
    }

    /// Point the page at a new URL. Cached content belongs to the old one.
    pub fn navigate(&mut self, url: Url) {
        self.url = url;
        self.title = NO_TITLE.to_string();
        self.full_text = None;
        self.snapshot = None;
        self.touch();
    }

    /// The value stored in `column` for this page.
    pub fn value(&self, column: Column) -> &dyn Bindable {
        match column {
            Column::Id => &self.id,
            Column::LastUpdated => &self.last_updated,
            Column::Url => &self.url,
            Column::Title => &self.title,
            Column::FullText => &self.full_text,
            Column::Snapshot => &self.snapshot,
        }
    }

    /// The values for `columns`, in the same order.
    pub fn values<'a>(&'a self, columns: &[Column]) -> Vec<&'a dyn Bindable> {
        columns.iter().map(|&column| self.value(column)).collect()
    }

    fn touch(&mut self) {
        self.last_updated = Utc::now();
    }
}
