//! Mastodon API integration surface consumed by the pipeline.
//!
//! `client` wraps the shared HTTP client with bearer auth and the three
//! endpoints; `types` holds the response models and the profile decoding that
//! keeps each account's full JSON record.
pub mod client;
pub mod types;

pub use client::MastodonApi;
pub use types::{Account, Post};
