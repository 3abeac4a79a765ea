use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};

use async_trait::async_trait;
use murmur_common::observability::{LogConfig, LogFormat};
use murmur_common::{MurmurError, Profile, Result, SentimentRow, Toot};
use murmur_pipeline::SocialSource;
use murmur_store::{Projection, Store, StoreError, Table, TableKind};
use serde_json::json;

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "murmur-tests",
            emit_stderr: true,
            format: LogFormat::Text,
            default_filter: "debug".into(),
            ..LogConfig::default()
        };
        murmur_common::observability::init_logging(config).unwrap_or_default()
    });
}

pub fn profile(id: i64, username: &str, note: &str) -> Profile {
    Profile {
        id,
        username: Some(username.into()),
        display_name: Some(username.into()),
        locked: Some(false),
        created_at: None,
        followers_count: Some(1),
        following_count: Some(1),
        statuses_count: Some(1),
        last_status_at: None,
        other_data: json!({ "id": id.to_string(), "username": username, "note": note }),
    }
}

/// In-memory source. `posts: None` simulates an unreachable timeline.
#[derive(Default)]
pub struct FakeSource {
    pub posts: Option<Vec<Toot>>,
    pub timeline_users: Vec<String>,
    pub accounts: HashMap<String, Vec<Profile>>,
    pub failing: HashSet<String>,
    pub searched: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn with_account(mut self, username: &str, profiles: Vec<Profile>) -> Self {
        self.accounts.insert(username.into(), profiles);
        self
    }

    pub fn failing_for(mut self, username: &str) -> Self {
        self.failing.insert(username.into());
        self
    }

    pub fn searched(&self) -> Vec<String> {
        self.searched.lock().unwrap().clone()
    }
}

fn unreachable() -> MurmurError {
    MurmurError::Network("connection refused".into())
}

#[async_trait]
impl SocialSource for FakeSource {
    async fn list_public_posts(&self, limit: u32) -> Result<Vec<Toot>> {
        let posts = self.posts.clone().ok_or_else(unreachable)?;
        Ok(posts.into_iter().take(limit as usize).collect())
    }

    async fn public_usernames(&self, limit: u32) -> Result<Vec<String>> {
        Ok(self.timeline_users.iter().take(limit as usize).cloned().collect())
    }

    async fn search_accounts(&self, query: &str) -> Result<Vec<Profile>> {
        self.searched.lock().unwrap().push(query.into());
        if self.failing.contains(query) {
            return Err(unreachable());
        }
        Ok(self.accounts.get(query).cloned().unwrap_or_default())
    }

    async fn verify_credentials(&self) -> Result<i64> {
        Ok(42)
    }
}

/// Store that only counts calls.
#[derive(Default)]
pub struct CountingStore {
    pub schema_calls: AtomicUsize,
    pub writes: AtomicUsize,
    pub reads: AtomicUsize,
}

impl CountingStore {
    pub fn total_calls(&self) -> usize {
        self.schema_calls.load(Ordering::SeqCst)
            + self.writes.load(Ordering::SeqCst)
            + self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Store for CountingStore {
    async fn ensure_schema(&self, _table: TableKind, _reset: bool) -> std::result::Result<(), StoreError> {
        self.schema_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn upsert_toots(&self, rows: &[Toot]) -> std::result::Result<u64, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(rows.len() as u64)
    }

    async fn upsert_profiles(&self, rows: &[Profile]) -> std::result::Result<u64, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(rows.len() as u64)
    }

    async fn upsert_sentiment(&self, rows: &[SentimentRow]) -> std::result::Result<u64, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(rows.len() as u64)
    }

    async fn read_all(
        &self,
        table: TableKind,
        _projection: Option<&Projection>,
    ) -> std::result::Result<Table, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(Table::new(table.column_names()))
    }
}
