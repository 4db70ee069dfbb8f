//! Main browser state container
//!
//! Holds the ordered page list shown in the sidebar and writes every change
//! through to the page store.

use parking_lot::RwLock;
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

use tabshell_storage::{Database, Page};

use crate::address::parse_address;
use crate::config::Config;
use crate::content::extract_content;
use crate::error::CoreError;
use crate::Result;

pub struct Browser {
    config: Config,
    db: Database,
    /// Pages in sidebar order
    pages: Arc<RwLock<Vec<Page>>>,
}

impl Browser {
    /// Open the page store named by `config` and load its pages.
    pub async fn open(config: Config) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let db = Database::open(&config.database_path)?;
        Self::with_database(config, db).await
    }

    /// Use an already opened store, creating its table on first use.
    pub async fn with_database(config: Config, db: Database) -> Result<Self> {
        let fresh = !db.has_schema().await?;
        if fresh {
            db.setup().await?;
        }

        let browser = Self {
            config,
            db,
            pages: Arc::new(RwLock::new(Vec::new())),
        };

        if fresh {
            browser.seed_initial_pages().await?;
        } else {
            let pages = browser.db.pages().await?;
            tracing::info!(count = pages.len(), "Loaded pages");
            *browser.pages.write() = pages;
        }

        Ok(browser)
    }

    async fn seed_initial_pages(&self) -> Result<()> {
        for raw in &self.config.initial_urls {
            match Url::parse(raw) {
                Ok(url) => {
                    self.add(url).await?;
                }
                Err(e) => {
                    tracing::warn!(url = %raw, error = %e, "Skipping invalid initial URL");
                }
            }
        }
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Handle address bar submission: open the typed address as a new page.
    pub async fn submit(&self, input: &str) -> Result<Page> {
        let url = parse_address(input)?;
        self.add(url).await
    }

    async fn add(&self, url: Url) -> Result<Page> {
        let page = Page::new(url);
        let pages = Arc::clone(&self.pages);
        let inserted = page.clone();
        self.db
            .call(move |conn| {
                conn.insert(&inserted)?;
                pages.write().push(inserted);
                Ok(())
            })
            .await?;

        tracing::info!(page_id = %page.id, url = %page.url, "Added page");

        Ok(page)
    }

    pub fn pages(&self) -> Vec<Page> {
        self.pages.read().clone()
    }

    pub fn page(&self, id: Uuid) -> Result<Page> {
        self.pages
            .read()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(CoreError::PageNotFound(id))
    }

    /// Store a captured snapshot image for a page.
    pub async fn record_snapshot(&self, id: Uuid, image: Vec<u8>) -> Result<Page> {
        let len = image.len();
        let page = self
            .modify(id, |page| page.set_snapshot(Some(image)))
            .await?;

        tracing::debug!(page_id = %id, bytes = len, "Recorded snapshot");

        Ok(page)
    }

    /// Store the title and text of a page's loaded document.
    pub async fn record_content(&self, id: Uuid, html: &str) -> Result<Page> {
        let content = extract_content(html);
        self.modify(id, move |page| {
            if let Some(title) = content.title {
                page.set_title(title);
            }
            page.set_full_text(content.full_text);
        })
        .await
    }

    pub async fn set_title(&self, id: Uuid, title: String) -> Result<Page> {
        self.modify(id, |page| page.set_title(title)).await
    }

    /// Point an existing page at a new address.
    pub async fn navigate(&self, id: Uuid, input: &str) -> Result<Page> {
        let url = parse_address(input)?;
        self.modify(id, |page| page.navigate(url)).await
    }

    /// Read, change and write back a page as one job on the store's worker.
    ///
    /// The cache is updated from the same job, so it sees edits in the order
    /// the store applied them.
    async fn modify<F>(&self, id: Uuid, change: F) -> Result<Page>
    where
        F: FnOnce(&mut Page) + Send + 'static,
    {
        let pages = Arc::clone(&self.pages);
        let updated = self
            .db
            .call(move |conn| {
                let Some(mut page) = conn.page(id)? else {
                    return Ok(None);
                };
                change(&mut page);
                if !conn.update(&page)? {
                    return Ok(None);
                }

                if let Some(slot) = pages.write().iter_mut().find(|p| p.id == id) {
                    *slot = page.clone();
                }
                Ok(Some(page))
            })
            .await?;

        updated.ok_or(CoreError::PageNotFound(id))
    }
}

impl Clone for Browser {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            db: self.db.clone(),
            pages: Arc::clone(&self.pages),
        }
    }
}
