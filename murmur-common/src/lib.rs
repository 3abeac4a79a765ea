//! Common types and utilities shared across murmur crates.
//!
//! This crate defines the persisted record shapes, the shared error taxonomy,
//! and observability helpers used throughout the workspace. It stays free of
//! I/O dependencies so that every crate can depend on it.
//!
//! # Overview
//!
//! - [`Toot`], [`Profile`], [`SentimentRow`]: rows written by the pipeline
//! - [`Sentiment`]: the three-way polarity label
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`MurmurError`] and [`Result`]: shared error handling
//!
//! # Examples
//!
//! ```rust
//! use murmur_common::Sentiment;
//!
//! assert_eq!(Sentiment::from_polarity(0.4), Sentiment::Positive);
//! assert_eq!(Sentiment::from_polarity(0.0).as_str(), "neutral");
//! assert_eq!("negative".parse::<Sentiment>().ok(), Some(Sentiment::Negative));
//! ```
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod observability;

/// A public post as persisted in the `toots` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Toot {
    pub id: i64,
    pub content: String,
}

/// A structured account profile as persisted in the `profiles` table.
///
/// `other_data` carries the complete source record so fields that are not
/// materialised as columns stay reachable through a read-time projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub locked: Option<bool>,
    pub created_at: Option<NaiveDateTime>,
    pub followers_count: Option<i64>,
    pub following_count: Option<i64>,
    pub statuses_count: Option<i64>,
    pub last_status_at: Option<NaiveDateTime>,
    pub other_data: serde_json::Value,
}

/// A derived sentiment record as persisted in the `sentiment_data` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentRow {
    pub id: i64,
    pub username: Option<String>,
    pub clean_content: Option<String>,
    pub sentiment: Option<Sentiment>,
}

/// Polarity label produced by the sentiment labeler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    /// Map a polarity score onto a label: `>0` positive, `==0` neutral, `<0` negative.
    pub fn from_polarity(score: f64) -> Self {
        if score > 0.0 {
            Sentiment::Positive
        } else if score < 0.0 {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = MurmurError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "neutral" => Ok(Sentiment::Neutral),
            "negative" => Ok(Sentiment::Negative),
            other => Err(MurmurError::Decode(format!("unknown sentiment label: {other}"))),
        }
    }
}

/// Error types used across the murmur workspace.
#[derive(thiserror::Error, Debug)]
pub enum MurmurError {
    /// The remote API answered with a non-success status.
    #[error("remote returned status {status}: {message}")]
    Remote { status: u16, message: String },

    /// The request never produced a response (connect, timeout, body read).
    #[error("network error: {0}")]
    Network(String),

    /// A response or stored value could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Configuration was incomplete or invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

impl MurmurError {
    /// HTTP status for [`MurmurError::Remote`], `None` otherwise.
    pub fn status(&self) -> Option<u16> {
        match self {
            MurmurError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Convenient alias for results that use [`MurmurError`].
pub type Result<T> = std::result::Result<T, MurmurError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polarity_threshold_is_strict_around_zero() {
        assert_eq!(Sentiment::from_polarity(1e-9), Sentiment::Positive);
        assert_eq!(Sentiment::from_polarity(-1e-9), Sentiment::Negative);
        assert_eq!(Sentiment::from_polarity(0.0), Sentiment::Neutral);
        assert_eq!(Sentiment::from_polarity(-0.0), Sentiment::Neutral);
    }

    #[test]
    fn labels_parse_case_insensitively() {
        assert_eq!("Positive".parse::<Sentiment>().unwrap(), Sentiment::Positive);
        assert!("meh".parse::<Sentiment>().is_err());
    }

    #[test]
    fn status_is_only_reported_for_remote_failures() {
        let remote = MurmurError::Remote {
            status: 503,
            message: "unavailable".into(),
        };
        assert_eq!(remote.status(), Some(503));
        assert_eq!(MurmurError::Network("reset".into()).status(), None);
    }
}
