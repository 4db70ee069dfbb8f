//! Serialized access to the page store
//!
//! The SQLite handle is not safe for concurrent use, so one worker thread
//! owns the [`Connection`] and drains a queue of jobs in submission order.
//! Callers hold a cheap [`Database`] handle and await each job's result.

use std::path::Path;
use std::thread;

use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::connection::Connection;
use crate::page::Page;
use crate::{Result, StorageError};

type Job = Box<dyn FnOnce(&mut Connection) + Send>;

#[derive(Clone)]
pub struct Database {
    jobs: mpsc::UnboundedSender<Job>,
}

impl Database {
    /// Open the store at `path` and start its worker.
    #[track_caller]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::spawn(conn)
    }

    #[track_caller]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::spawn(conn)
    }

    /// Move `conn` onto a dedicated worker thread.
    ///
    /// The worker exits, closing the connection, once every handle is dropped.
    pub fn spawn(conn: Connection) -> Result<Self> {
        let (jobs, mut queue) = mpsc::unbounded_channel::<Job>();

        thread::Builder::new()
            .name("page-store".to_string())
            .spawn(move || {
                let mut conn = conn;
                tracing::debug!("Page store worker started");

                while let Some(job) = queue.blocking_recv() {
                    job(&mut conn);
                }

                if let Err(e) = conn.close() {
                    tracing::warn!(error = %e, "Failed to close page store");
                }
                tracing::debug!("Page store worker shutting down");
            })?;

        Ok(Self { jobs })
    }

    /// Run `f` against the connection once every earlier job has finished.
    ///
    /// A job whose caller stopped waiting before the worker reached it is
    /// skipped. Once started, a job always runs to completion.
    pub async fn call<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply, response) = oneshot::channel();

        let job: Job = Box::new(move |conn| {
            if reply.is_closed() {
                tracing::warn!("Skipping abandoned page store request");
                return;
            }
            // Receiver dropped mid-job: the work is done, only the reply is lost.
            let _ = reply.send(f(conn));
        });

        self.jobs
            .send(job)
            .map_err(|_| StorageError::WorkerClosed)?;

        response.await.map_err(|_| StorageError::WorkerClosed)?
    }

    pub async fn setup(&self) -> Result<()> {
        self.call(|conn| Ok(conn.setup()?)).await
    }

    pub async fn has_schema(&self) -> Result<bool> {
        self.call(|conn| Ok(conn.has_schema()?)).await
    }

    pub async fn insert(&self, page: Page) -> Result<()> {
        self.call(move |conn| Ok(conn.insert(&page)?)).await
    }

    pub async fn update(&self, page: Page) -> Result<bool> {
        self.call(move |conn| Ok(conn.update(&page)?)).await
    }

    pub async fn page(&self, id: Uuid) -> Result<Option<Page>> {
        self.call(move |conn| Ok(conn.page(id)?)).await
    }

    pub async fn pages(&self) -> Result<Vec<Page>> {
        self.call(|conn| Ok(conn.pages()?)).await
    }
}
