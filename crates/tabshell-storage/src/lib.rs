//! Tabshell Storage Layer
//!
//! SQLite persistence for page records. One connection per store, driven by
//! a single worker so operations never interleave on the native handle.

mod bind;
mod connection;
mod database;
mod error;
mod page;
pub mod schema;
mod statement;

pub use bind::Bindable;
pub use connection::Connection;
pub use database::Database;
pub use error::{DatabaseError, Stage, StorageError};
pub use page::{Page, NO_TITLE};

pub type Result<T> = std::result::Result<T, StorageError>;
