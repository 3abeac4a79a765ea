//! SQLite backend. The blob column is stored as JSON text and projected with
//! SQLite's `->>` operator, so the file format stays readable by the stock CLI.
use crate::schema::Dialect;
use crate::{connect_error, StoreError};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqliteConnection};
use sqlx::{Connection, Sqlite};
use std::path::Path;

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

#[derive(Clone)]
pub struct SqliteStore {
    opts: SqliteConnectOptions,
}

impl SqliteStore {
    /// Store backed by the database file at `path`, created on first connect.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let opts = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true);
        Self { opts }
    }

    async fn connect(&self) -> Result<SqliteConnection, StoreError> {
        SqliteConnection::connect_with(&self.opts)
            .await
            .map_err(connect_error)
    }
}

crate::backend::sql_store! {
    store: SqliteStore,
    connection: SqliteConnection,
    query: SqliteQuery,
    dialect: Dialect::Sqlite,
}
