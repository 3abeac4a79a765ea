//! PostgreSQL backend. The profile blob column is `JSONB`, so projections use
//! the native `->>` operator.
use crate::schema::Dialect;
use crate::{connect_error, StoreError};
use sqlx::postgres::{PgArguments, PgConnectOptions, PgConnection};
use sqlx::query::Query;
use sqlx::{Connection, Postgres};

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

#[derive(Clone)]
pub struct PgStore {
    opts: PgConnectOptions,
}

impl PgStore {
    pub fn new(opts: PgConnectOptions) -> Self {
        Self { opts }
    }

    pub fn from_params(host: &str, port: u16, dbname: &str, user: &str, password: &str) -> Self {
        Self::new(
            PgConnectOptions::new()
                .host(host)
                .port(port)
                .database(dbname)
                .username(user)
                .password(password),
        )
    }

    async fn connect(&self) -> Result<PgConnection, StoreError> {
        PgConnection::connect_with(&self.opts)
            .await
            .map_err(connect_error)
    }
}

crate::backend::sql_store! {
    store: PgStore,
    connection: PgConnection,
    query: PgQuery,
    dialect: Dialect::Postgres,
}
