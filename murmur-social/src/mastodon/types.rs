use chrono::{DateTime, NaiveDate, NaiveDateTime};
use murmur_common::{MurmurError, Profile, Result, Toot};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A status from the public timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    #[serde(deserialize_with = "de_id")]
    pub id: i64,
    #[serde(default)]
    pub content: String,
    pub account: Account,
}

impl Post {
    pub fn to_toot(&self) -> Toot {
        Toot {
            id: self.id,
            content: self.content.clone(),
        }
    }
}

/// The subset of account fields materialised as `profiles` columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    #[serde(deserialize_with = "de_id")]
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub locked: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub followers_count: Option<i64>,
    #[serde(default)]
    pub following_count: Option<i64>,
    #[serde(default)]
    pub statuses_count: Option<i64>,
    #[serde(default)]
    pub last_status_at: Option<String>,
}

/// Mastodon serialises ids as decimal strings; accept plain numbers too.
pub(crate) fn de_id<'de, D>(d: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(i64),
    }

    match Raw::deserialize(d)? {
        Raw::Num(n) => Ok(n),
        Raw::Str(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid id {s:?}: {e}"))),
    }
}

/// Accepts RFC 3339 instants (`created_at`) and bare dates (`last_status_at`).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Decode an account record into a [`Profile`], keeping the whole record as `other_data`.
pub fn profile_from_value(raw: Value) -> Result<Profile> {
    let account: Account = serde_json::from_value(raw.clone())
        .map_err(|e| MurmurError::Decode(format!("account record: {e}")))?;

    Ok(Profile {
        id: account.id,
        username: Some(account.username),
        display_name: account.display_name,
        locked: account.locked,
        created_at: account.created_at.as_deref().and_then(parse_timestamp),
        followers_count: account.followers_count,
        following_count: account.following_count,
        statuses_count: account.statuses_count,
        last_status_at: account.last_status_at.as_deref().and_then(parse_timestamp),
        other_data: raw,
    })
}
