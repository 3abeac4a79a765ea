//! Social network clients used by murmur.
//!
//! Only the Mastodon REST API is implemented: the public timeline, account
//! search, and credential verification, one page per call.
pub mod mastodon;

pub use mastodon::{Account, MastodonApi, Post};
