//! Statement execution
//!
//! prepare -> bind -> step -> finalize, with every failure translated into a
//! [`DatabaseError`] tagged with the stage it happened in. A statement that
//! leaves through an error path is dropped, and dropping a rusqlite
//! `Statement` finalizes it, so no exit path leaks the native handle.

use std::panic::Location;

use rusqlite::{Row, Statement};

use crate::bind::Bindable;
use crate::error::{DatabaseError, Stage};

type Result<T> = std::result::Result<T, DatabaseError>;

fn prepare<'c>(
    conn: &'c rusqlite::Connection,
    sql: &str,
    location: &'static Location<'static>,
) -> Result<Statement<'c>> {
    conn.prepare(sql)
        .map_err(|e| DatabaseError::from_sqlite(Stage::Prepare, location, e))
}

/// Bind `params` to slots 1, 2, 3, ... stopping at the first failure.
fn bind_all(
    statement: &mut Statement<'_>,
    params: &[&dyn Bindable],
    location: &'static Location<'static>,
) -> Result<()> {
    for (index, param) in params.iter().enumerate() {
        param
            .bind(statement, index + 1)
            .map_err(|e| DatabaseError::from_sqlite(Stage::Bind, location, e))?;
    }
    Ok(())
}

fn finalize(statement: Statement<'_>, location: &'static Location<'static>) -> Result<()> {
    statement
        .finalize()
        .map_err(|e| DatabaseError::from_sqlite(Stage::Finalize, location, e))
}

/// Run a statement that returns no rows and report how many rows changed.
#[track_caller]
pub fn execute(
    conn: &rusqlite::Connection,
    sql: &str,
    params: &[&dyn Bindable],
) -> Result<usize> {
    let location = Location::caller();

    let mut statement = prepare(conn, sql, location)?;
    bind_all(&mut statement, params, location)?;

    let changed = statement
        .raw_execute()
        .map_err(|e| DatabaseError::from_sqlite(Stage::Step, location, e))?;

    finalize(statement, location)?;

    tracing::debug!(
        sql = %sql,
        params = params.len(),
        changed,
        "Executed statement"
    );

    Ok(changed)
}

/// Run a query and decode each returned row with `map`.
#[track_caller]
pub fn query<T, F>(
    conn: &rusqlite::Connection,
    sql: &str,
    params: &[&dyn Bindable],
    mut map: F,
) -> Result<Vec<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let location = Location::caller();

    let mut statement = prepare(conn, sql, location)?;
    bind_all(&mut statement, params, location)?;

    let mut out = Vec::new();
    {
        let mut rows = statement.raw_query();
        while let Some(row) = rows
            .next()
            .map_err(|e| DatabaseError::from_sqlite(Stage::Step, location, e))?
        {
            let value = map(row).map_err(|e| DatabaseError::from_sqlite(Stage::Decode, location, e))?;
            out.push(value);
        }
    }

    finalize(statement, location)?;

    Ok(out)
}
