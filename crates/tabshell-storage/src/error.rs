//! Storage error types

use std::fmt;
use std::panic::Location;

use rusqlite::ffi;
use rusqlite::ErrorCode;
use thiserror::Error;

/// The phase of a statement's lifecycle in which a store failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Open,
    Prepare,
    Bind,
    Step,
    Finalize,
    /// A row came back but a column could not be turned into its Rust type.
    Decode,
    Close,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Open => "open",
            Stage::Prepare => "prepare",
            Stage::Bind => "bind",
            Stage::Step => "step",
            Stage::Finalize => "finalize",
            Stage::Decode => "decode",
            Stage::Close => "close",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure reported by SQLite, tagged with where it was requested from.
#[derive(Error, Debug, Clone)]
#[error("{stage} failed at {location}: {message} (code {code})")]
pub struct DatabaseError {
    stage: Stage,
    location: &'static Location<'static>,
    code: i32,
    message: String,
}

impl DatabaseError {
    pub fn new(
        stage: Stage,
        location: &'static Location<'static>,
        code: i32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            stage,
            location,
            code,
            message: message.into(),
        }
    }

    /// Translate a rusqlite failure into a structured error.
    ///
    /// Failures that never reached SQLite (wrong column type, statement that
    /// unexpectedly returns rows) are mapped onto the closest SQLite code so
    /// that every store error carries a native status.
    pub fn from_sqlite(
        stage: Stage,
        location: &'static Location<'static>,
        err: rusqlite::Error,
    ) -> Self {
        let (code, message) = match err {
            rusqlite::Error::SqliteFailure(native, message) => {
                let message = message.unwrap_or_else(|| native.to_string());
                (native.extended_code, message)
            }
            other => {
                let code = match &other {
                    rusqlite::Error::FromSqlConversionFailure(..)
                    | rusqlite::Error::InvalidColumnType(..)
                    | rusqlite::Error::IntegralValueOutOfRange(..) => ffi::SQLITE_MISMATCH,
                    rusqlite::Error::InvalidParameterCount(..) => ffi::SQLITE_RANGE,
                    _ => ffi::SQLITE_MISUSE,
                };
                (code, other.to_string())
            }
        };

        Self::new(stage, location, code, message)
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Call site that issued the failing operation.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// SQLite extended result code.
    pub fn code(&self) -> i32 {
        self.code
    }

    /// Primary result code, e.g. `ConstraintViolation` for a duplicate key.
    pub fn error_code(&self) -> ErrorCode {
        ffi::Error::new(self.code).code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Database worker is no longer running")]
    WorkerClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// The structured store error, if this failure came from SQLite.
    pub fn as_database(&self) -> Option<&DatabaseError> {
        match self {
            StorageError::Database(err) => Some(err),
            _ => None,
        }
    }
}
