//! Row shapes decoded from `SELECT`s and their conversion into [`Table`]s.
use crate::schema::TableKind;
use crate::table::Table;
use crate::Projection;
use chrono::NaiveDateTime;
use serde_json::{json, Value};
use sqlx::types::Json;
use sqlx::FromRow;

#[derive(Debug, FromRow)]
pub(crate) struct TootRecord {
    id: i64,
    content: Option<String>,
}

#[derive(Debug, FromRow)]
pub(crate) struct ProfileRecord {
    id: i64,
    username: Option<String>,
    display_name: Option<String>,
    locked: Option<bool>,
    created_at: Option<NaiveDateTime>,
    followers_count: Option<i64>,
    following_count: Option<i64>,
    statuses_count: Option<i64>,
    last_status_at: Option<NaiveDateTime>,
    other_data: Option<Json<Value>>,
    dw_refresh_time: Option<NaiveDateTime>,
    projected: Option<String>,
}

#[derive(Debug, FromRow)]
pub(crate) struct SentimentRecord {
    id: i64,
    username: Option<String>,
    clean_content: Option<String>,
    sentiment: Option<String>,
    dw_refresh_time: Option<NaiveDateTime>,
}

pub(crate) fn toot_table(records: Vec<TootRecord>) -> Table {
    let mut table = Table::new(TableKind::Toots.column_names());
    for r in records {
        table.push_row(vec![json!(r.id), json!(r.content)]);
    }
    table
}

pub(crate) fn profile_table(records: Vec<ProfileRecord>, projection: Option<&Projection>) -> Table {
    let mut columns: Vec<String> = TableKind::Profiles
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();
    if let Some(p) = projection {
        columns.push(p.alias.clone());
    }

    let mut table = Table::new(columns);
    for r in records {
        let mut row = vec![
            json!(r.id),
            json!(r.username),
            json!(r.display_name),
            json!(r.locked),
            json!(r.created_at),
            json!(r.followers_count),
            json!(r.following_count),
            json!(r.statuses_count),
            json!(r.last_status_at),
            r.other_data.map(|Json(v)| v).unwrap_or(Value::Null),
            json!(r.dw_refresh_time),
        ];
        if projection.is_some() {
            row.push(json!(r.projected));
        }
        table.push_row(row);
    }
    table
}

pub(crate) fn sentiment_table(records: Vec<SentimentRecord>) -> Table {
    let mut table = Table::new(TableKind::Sentiment.column_names());
    for r in records {
        table.push_row(vec![
            json!(r.id),
            json!(r.username),
            json!(r.clean_content),
            json!(r.sentiment),
            json!(r.dw_refresh_time),
        ]);
    }
    table
}
