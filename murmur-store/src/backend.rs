//! Shared [`Store`](crate::Store) implementation for the sqlx backends.
//!
//! Both backends run the same statements (see [`crate::schema`]) over a single
//! connection per call; only the connection type, the query alias and the DDL
//! dialect differ, so the impl is stamped out once per backend.

/// Implement `close`, `write_batch` and [`Store`](crate::Store) for a store
/// type with a private `connect()` returning `$conn`.
macro_rules! sql_store {
    (
        store: $store:ident,
        connection: $conn:ty,
        query: $query:ident,
        dialect: $dialect:expr $(,)?
    ) => {
        async fn close(conn: $conn) {
            if let Err(err) = ::sqlx::Connection::close(conn).await {
                ::tracing::warn!(error = %err, "store.close_failed");
            }
        }

        /// Run one statement per row inside a single transaction.
        async fn write_batch<'q, T, F>(
            conn: &mut $conn,
            table: $crate::schema::TableKind,
            sql: &'q str,
            rows: &'q [T],
            bind: F,
        ) -> Result<u64, $crate::StoreError>
        where
            T: Sync,
            F: Fn($query<'q>, &'q T) -> $query<'q> + Send,
        {
            let mut tx = ::sqlx::Connection::begin(conn)
                .await
                .map_err($crate::sql_error("begin", table))?;
            let mut written = 0u64;
            for row in rows {
                match bind(::sqlx::query(sql), row).execute(&mut *tx).await {
                    Ok(done) => written += done.rows_affected(),
                    Err(err) => {
                        if let Err(rb) = tx.rollback().await {
                            ::tracing::warn!(table = table.name(), error = %rb, "store.rollback_failed");
                        }
                        return Err($crate::sql_error("insert", table)(err));
                    }
                }
            }
            tx.commit()
                .await
                .map_err($crate::sql_error("commit", table))?;
            ::tracing::info!(
                table = table.name(),
                rows = rows.len(),
                written,
                "store.upsert.commit"
            );
            Ok(written)
        }

        #[::async_trait::async_trait]
        impl $crate::Store for $store {
            async fn ensure_schema(
                &self,
                table: $crate::schema::TableKind,
                reset: bool,
            ) -> Result<(), $crate::StoreError> {
                let mut conn = self.connect().await?;
                if reset {
                    ::tracing::warn!(table = table.name(), "store.schema.reset");
                    ::sqlx::query(&$crate::schema::drop_sql(table))
                        .execute(&mut conn)
                        .await
                        .map_err($crate::sql_error("drop", table))?;
                }
                ::sqlx::query(&$crate::schema::create_sql(table, $dialect))
                    .execute(&mut conn)
                    .await
                    .map_err($crate::sql_error("create", table))?;
                close(conn).await;
                Ok(())
            }

            async fn upsert_toots(
                &self,
                rows: &[::murmur_common::Toot],
            ) -> Result<u64, $crate::StoreError> {
                let table = $crate::schema::TableKind::Toots;
                let sql = $crate::schema::insert_sql(table);
                let mut conn = self.connect().await?;
                let written = write_batch(&mut conn, table, &sql, rows, |q, t| {
                    q.bind(t.id).bind(t.content.as_str())
                })
                .await?;
                close(conn).await;
                Ok(written)
            }

            async fn upsert_profiles(
                &self,
                rows: &[::murmur_common::Profile],
            ) -> Result<u64, $crate::StoreError> {
                let table = $crate::schema::TableKind::Profiles;
                let sql = $crate::schema::insert_sql(table);
                let stamp = ::chrono::Utc::now().naive_utc();
                let mut conn = self.connect().await?;
                let written = write_batch(&mut conn, table, &sql, rows, move |q, p| {
                    q.bind(p.id)
                        .bind(p.username.as_deref())
                        .bind(p.display_name.as_deref())
                        .bind(p.locked)
                        .bind(p.created_at)
                        .bind(p.followers_count)
                        .bind(p.following_count)
                        .bind(p.statuses_count)
                        .bind(p.last_status_at)
                        .bind(::sqlx::types::Json(p.other_data.clone()))
                        .bind(stamp)
                })
                .await?;
                close(conn).await;
                Ok(written)
            }

            async fn upsert_sentiment(
                &self,
                rows: &[::murmur_common::SentimentRow],
            ) -> Result<u64, $crate::StoreError> {
                let table = $crate::schema::TableKind::Sentiment;
                let sql = $crate::schema::insert_sql(table);
                let stamp = ::chrono::Utc::now().naive_utc();
                let mut conn = self.connect().await?;
                let written = write_batch(&mut conn, table, &sql, rows, move |q, r| {
                    q.bind(r.id)
                        .bind(r.username.as_deref())
                        .bind(r.clean_content.as_deref())
                        .bind(r.sentiment.map(|s| s.as_str()))
                        .bind(stamp)
                })
                .await?;
                close(conn).await;
                Ok(written)
            }

            async fn read_all(
                &self,
                table: $crate::schema::TableKind,
                projection: Option<&$crate::Projection>,
            ) -> Result<$crate::Table, $crate::StoreError> {
                use $crate::records::{
                    profile_table, sentiment_table, toot_table, ProfileRecord, SentimentRecord,
                    TootRecord,
                };
                use $crate::schema::TableKind;

                $crate::check_projection(table, projection)?;
                let sql = $crate::schema::select_sql(table, projection.is_some());
                let mut conn = self.connect().await?;
                let out = match table {
                    TableKind::Toots => ::sqlx::query_as::<_, TootRecord>(&sql)
                        .fetch_all(&mut conn)
                        .await
                        .map(toot_table),
                    TableKind::Profiles => {
                        let mut q = ::sqlx::query_as::<_, ProfileRecord>(&sql);
                        if let Some(p) = projection {
                            q = q.bind(p.field.as_str());
                        }
                        q.fetch_all(&mut conn)
                            .await
                            .map(|records| profile_table(records, projection))
                    }
                    TableKind::Sentiment => ::sqlx::query_as::<_, SentimentRecord>(&sql)
                        .fetch_all(&mut conn)
                        .await
                        .map(sentiment_table),
                }
                .map_err($crate::sql_error("select", table))?;
                close(conn).await;
                ::tracing::info!(table = table.name(), rows = out.len(), "store.read_all");
                Ok(out)
            }
        }
    };
}

pub(crate) use sql_store;
