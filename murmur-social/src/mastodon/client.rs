//! Thin wrapper around the Mastodon REST API with murmur defaults.
//!
//! Every call attaches the bearer token and issues exactly one request. A
//! non-success status comes back as
//! [`murmur_common::MurmurError::Remote`]; what to do about
//! it is the caller's decision.
use crate::mastodon::types::{Post, profile_from_value};
use murmur_common::{Profile, Result};
use murmur_http::{Auth, HttpClient, RequestOpts};
use serde::Deserialize;
use serde_json::Value;
use std::borrow::Cow;
use std::time::Duration;

const PUBLIC_TIMELINE: &str = "api/v1/timelines/public";
const ACCOUNT_SEARCH: &str = "api/v1/accounts/search";
const VERIFY_CREDENTIALS: &str = "api/v1/accounts/verify_credentials";

#[derive(Clone)]
pub struct MastodonApi {
    http: HttpClient,
    token: String,
}

impl MastodonApi {
    pub fn new(base_url: &str, access_token: String) -> Result<Self> {
        let http = HttpClient::new(base_url)?;
        Ok(Self {
            http,
            token: access_token,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = self.http.with_timeout(timeout);
        self
    }

    fn opts<'a>(&'a self, query: Vec<(&'a str, Cow<'a, str>)>) -> RequestOpts<'a> {
        RequestOpts {
            auth: Some(Auth::Bearer(&self.token)),
            query: if query.is_empty() { None } else { Some(query) },
            ..Default::default()
        }
    }

    /// One page of the public timeline.
    pub async fn list_public_posts(&self, limit: u32) -> Result<Vec<Post>> {
        let posts: Vec<Post> = self
            .http
            .get_json(
                PUBLIC_TIMELINE,
                self.opts(vec![("limit", limit.to_string().into())]),
            )
            .await
            .inspect_err(|e| tracing::warn!(error=%e, limit, "mastodon.timeline.failed"))?;

        tracing::info!(limit, posts = posts.len(), "mastodon.timeline");
        Ok(posts)
    }

    /// Usernames of the authors on one page of the public timeline, in timeline order.
    pub async fn public_usernames(&self, limit: u32) -> Result<Vec<String>> {
        let posts = self.list_public_posts(limit).await?;
        Ok(posts.into_iter().map(|p| p.account.username).collect())
    }

    /// Accounts matching `query`. Records whose id cannot be decoded are skipped.
    pub async fn search_accounts(&self, query: &str) -> Result<Vec<Profile>> {
        let raw: Vec<Value> = self
            .http
            .get_json(ACCOUNT_SEARCH, self.opts(vec![("q", Cow::Borrowed(query))]))
            .await
            .inspect_err(|e| tracing::warn!(error=%e, query, "mastodon.search.failed"))?;

        let total = raw.len();
        let mut profiles = Vec::with_capacity(total);
        for record in raw {
            match profile_from_value(record) {
                Ok(p) => profiles.push(p),
                Err(err) => tracing::warn!(error=%err, query, "mastodon.search.skip_record"),
            }
        }
        tracing::info!(query, total, kept = profiles.len(), "mastodon.search");
        Ok(profiles)
    }

    /// Id of the account that owns the access token.
    pub async fn verify_credentials(&self) -> Result<i64> {
        #[derive(Deserialize)]
        struct Me {
            #[serde(deserialize_with = "crate::mastodon::types::de_id")]
            id: i64,
        }

        let me: Me = self
            .http
            .get_json(VERIFY_CREDENTIALS, self.opts(Vec::new()))
            .await
            .inspect_err(|e| tracing::warn!(error=%e, "mastodon.verify_credentials.failed"))?;

        tracing::info!(account_id = me.id, "mastodon.verify_credentials");
        Ok(me.id)
    }
}
