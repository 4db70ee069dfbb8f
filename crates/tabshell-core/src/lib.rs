//! Tabshell Core
//!
//! The page list behind the browser shell: address bar input, page content
//! and snapshots, all persisted through `tabshell-storage`.

mod address;
mod browser;
mod config;
mod content;
mod error;

pub use address::parse_address;
pub use browser::Browser;
pub use config::Config;
pub use content::{extract_content, PageContent};
pub use error::CoreError;

pub use tabshell_storage::{Database, DatabaseError, Page, Stage, StorageError, NO_TITLE};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
///
/// `RUST_LOG` wins over `default_filter`.
pub fn init_logging(default_filter: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt().with_env_filter(filter).with_target(true).init();
}
