//! Relational persistence for toots, profiles, and sentiment rows.
//!
//! [`Store`] is the seam the pipeline writes through. [`PgStore`] targets
//! PostgreSQL (`JSONB` blob column); [`SqliteStore`] runs the same statements
//! against a local file and backs the test suites.
//!
//! Every call opens its own connection and closes it before returning. Writes
//! for one call share a single transaction: all rows commit together or the
//! whole batch is rolled back and the error is returned. `Ok` with an empty
//! [`Table`] therefore always means "zero rows", never "the read failed".
use async_trait::async_trait;
use murmur_common::{Profile, SentimentRow, Toot};
use thiserror::Error;

mod backend;
pub mod postgres;
mod records;
pub mod schema;
pub mod sqlite;
pub mod table;

pub use postgres::PgStore;
pub use schema::{ConflictPolicy, TableKind};
pub use sqlite::SqliteStore;
pub use table::Table;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("connect failed: {0}")]
    Connect(#[source] sqlx::Error),
    #[error("{op} on {table} failed: {source}")]
    Sql {
        op: &'static str,
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },
    #[error("projection of {field:?} is not available on {table}")]
    Projection { table: &'static str, field: String },
}

/// Lift one top-level field of the `other_data` blob into a named output column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub field: String,
    pub alias: String,
}

impl Projection {
    pub fn new(field: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            alias: alias.into(),
        }
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Create `table` if absent. With `reset`, drop it first: existing rows are lost.
    async fn ensure_schema(&self, table: TableKind, reset: bool) -> Result<(), StoreError>;

    /// Insert toots; ids already present are left untouched.
    async fn upsert_toots(&self, rows: &[Toot]) -> Result<u64, StoreError>;

    /// Insert profiles stamped with the write time; ids already present are left untouched.
    async fn upsert_profiles(&self, rows: &[Profile]) -> Result<u64, StoreError>;

    /// Insert sentiment rows, overwriting `clean_content`, `sentiment` and
    /// `dw_refresh_time` of ids already present.
    async fn upsert_sentiment(&self, rows: &[SentimentRow]) -> Result<u64, StoreError>;

    /// Every row of `table` ordered by id.
    async fn read_all(
        &self,
        table: TableKind,
        projection: Option<&Projection>,
    ) -> Result<Table, StoreError>;
}

pub(crate) fn check_projection(
    table: TableKind,
    projection: Option<&Projection>,
) -> Result<(), StoreError> {
    match projection {
        Some(p) if !table.has_blob() => Err(StoreError::Projection {
            table: table.name(),
            field: p.field.clone(),
        }),
        _ => Ok(()),
    }
}

/// Log at the boundary and wrap into a [`StoreError::Sql`].
pub(crate) fn sql_error(op: &'static str, table: TableKind) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |source| {
        tracing::error!(op, table = table.name(), error = %source, "store.sql_failed");
        StoreError::Sql {
            op,
            table: table.name(),
            source,
        }
    }
}

pub(crate) fn connect_error(source: sqlx::Error) -> StoreError {
    tracing::error!(error = %source, "store.connect_failed");
    StoreError::Connect(source)
}
