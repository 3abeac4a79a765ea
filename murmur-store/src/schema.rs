//! Table definitions and the SQL generated from them.
//!
//! Both backends run the same statement text. Placeholders are `$N` and
//! always appear in ascending order, which Postgres and SQLite both accept.
//! The only dialect difference is the storage type of the JSON blob column.

/// The three persisted record kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Toots,
    Profiles,
    Sentiment,
}

/// What an insert does when the `id` already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// `ON CONFLICT (id) DO NOTHING`
    Ignore,
    /// `ON CONFLICT (id) DO UPDATE SET c = EXCLUDED.c` for each listed column.
    UpdateSet(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SqlType {
    BigInt,
    Text,
    Boolean,
    Timestamp,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dialect {
    Postgres,
    Sqlite,
}

impl Dialect {
    fn type_name(self, ty: SqlType) -> &'static str {
        match (self, ty) {
            (_, SqlType::BigInt) => "BIGINT",
            (_, SqlType::Text) => "TEXT",
            (_, SqlType::Boolean) => "BOOLEAN",
            (_, SqlType::Timestamp) => "TIMESTAMP",
            (Dialect::Postgres, SqlType::Json) => "JSONB",
            (Dialect::Sqlite, SqlType::Json) => "TEXT",
        }
    }
}

const TOOT_COLUMNS: &[(&str, SqlType)] = &[("id", SqlType::BigInt), ("content", SqlType::Text)];

const PROFILE_COLUMNS: &[(&str, SqlType)] = &[
    ("id", SqlType::BigInt),
    ("username", SqlType::Text),
    ("display_name", SqlType::Text),
    ("locked", SqlType::Boolean),
    ("created_at", SqlType::Timestamp),
    ("followers_count", SqlType::BigInt),
    ("following_count", SqlType::BigInt),
    ("statuses_count", SqlType::BigInt),
    ("last_status_at", SqlType::Timestamp),
    ("other_data", SqlType::Json),
    ("dw_refresh_time", SqlType::Timestamp),
];

const SENTIMENT_COLUMNS: &[(&str, SqlType)] = &[
    ("id", SqlType::BigInt),
    ("username", SqlType::Text),
    ("clean_content", SqlType::Text),
    ("sentiment", SqlType::Text),
    ("dw_refresh_time", SqlType::Timestamp),
];

/// Name of the opaque blob column that projections read from.
pub(crate) const BLOB_COLUMN: &str = "other_data";
/// Internal alias of the projected expression; renamed in the returned table.
pub(crate) const PROJECTED_ALIAS: &str = "projected";

impl TableKind {
    pub fn name(&self) -> &'static str {
        match self {
            TableKind::Toots => "toots",
            TableKind::Profiles => "profiles",
            TableKind::Sentiment => "sentiment_data",
        }
    }

    pub fn conflict_policy(&self) -> ConflictPolicy {
        match self {
            TableKind::Toots | TableKind::Profiles => ConflictPolicy::Ignore,
            TableKind::Sentiment => {
                ConflictPolicy::UpdateSet(&["clean_content", "sentiment", "dw_refresh_time"])
            }
        }
    }

    pub(crate) fn columns(&self) -> &'static [(&'static str, SqlType)] {
        match self {
            TableKind::Toots => TOOT_COLUMNS,
            TableKind::Profiles => PROFILE_COLUMNS,
            TableKind::Sentiment => SENTIMENT_COLUMNS,
        }
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns().iter().map(|(name, _)| *name).collect()
    }

    pub(crate) fn has_blob(&self) -> bool {
        self.columns().iter().any(|(name, _)| *name == BLOB_COLUMN)
    }
}

pub(crate) fn create_sql(table: TableKind, dialect: Dialect) -> String {
    let cols = table
        .columns()
        .iter()
        .map(|(name, ty)| {
            let ty = dialect.type_name(*ty);
            if *name == "id" {
                format!("{name} {ty} PRIMARY KEY")
            } else {
                format!("{name} {ty}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE IF NOT EXISTS {} ({cols})", table.name())
}

pub(crate) fn drop_sql(table: TableKind) -> String {
    format!("DROP TABLE IF EXISTS {}", table.name())
}

pub(crate) fn insert_sql(table: TableKind) -> String {
    let names = table.column_names();
    let placeholders = (1..=names.len())
        .map(|i| format!("${i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let on_conflict = match table.conflict_policy() {
        ConflictPolicy::Ignore => "DO NOTHING".to_string(),
        ConflictPolicy::UpdateSet(cols) => {
            let sets = cols
                .iter()
                .map(|c| format!("{c} = EXCLUDED.{c}"))
                .collect::<Vec<_>>()
                .join(", ");
            format!("DO UPDATE SET {sets}")
        }
    };
    format!(
        "INSERT INTO {} ({}) VALUES ({placeholders}) ON CONFLICT (id) {on_conflict}",
        table.name(),
        names.join(", ")
    )
}

/// `SELECT` of every column ordered by id. Tables with a blob column also get
/// a `projected` column: the text of `other_data ->> $1` when `projected` is
/// true, else NULL. The cast keeps numeric fields readable as text on SQLite.
pub(crate) fn select_sql(table: TableKind, projected: bool) -> String {
    let mut cols = table.column_names().join(", ");
    if table.has_blob() {
        let expr = if projected {
            format!("CAST({BLOB_COLUMN} ->> $1 AS TEXT)")
        } else {
            "NULL".to_string()
        };
        cols.push_str(&format!(", {expr} AS {PROJECTED_ALIAS}"));
    }
    format!("SELECT {cols} FROM {} ORDER BY id", table.name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignore_policy_inserts_do_nothing() {
        assert_eq!(
            insert_sql(TableKind::Toots),
            "INSERT INTO toots (id, content) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING"
        );
    }

    #[test]
    fn sentiment_upsert_overwrites_only_derived_columns() {
        let sql = insert_sql(TableKind::Sentiment);
        assert!(sql.ends_with(
            "ON CONFLICT (id) DO UPDATE SET clean_content = EXCLUDED.clean_content, \
             sentiment = EXCLUDED.sentiment, dw_refresh_time = EXCLUDED.dw_refresh_time"
        ));
        assert!(!sql.contains("username = EXCLUDED"));
    }

    #[test]
    fn blob_type_follows_dialect() {
        assert!(create_sql(TableKind::Profiles, Dialect::Postgres).contains("other_data JSONB"));
        assert!(create_sql(TableKind::Profiles, Dialect::Sqlite).contains("other_data TEXT"));
        assert!(create_sql(TableKind::Toots, Dialect::Sqlite)
            .starts_with("CREATE TABLE IF NOT EXISTS toots (id BIGINT PRIMARY KEY"));
    }

    #[test]
    fn only_profiles_select_a_projection() {
        assert!(select_sql(TableKind::Profiles, true).contains("CAST(other_data ->> $1 AS TEXT) AS projected"));
        assert!(select_sql(TableKind::Profiles, false).contains("NULL AS projected"));
        assert_eq!(
            select_sql(TableKind::Toots, false),
            "SELECT id, content FROM toots ORDER BY id"
        );
    }
}
