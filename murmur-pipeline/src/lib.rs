//! Fetch → persist → transform → persist orchestration.
//!
//! A [`Pipeline`] owns a [`SocialSource`] and a [`murmur_store::Store`] and runs
//! each flow as a strict sequence of awaited steps:
//!
//! - profiles: `FETCH → STORE_RAW → READ_BACK → NORMALIZE/CLASSIFY → STORE_DERIVED`
//! - toots: `FETCH → STORE_RAW → READ_BACK`, followed by an optional
//!   [`word_count_histogram`] of the stored bodies
//!
//! A failed fetch always stops the run before anything is written. Store
//! failures follow [`StoreFailurePolicy`]. Either way the returned
//! [`RunReport`] says which steps ran and which failed.
mod flow;
pub mod histogram;
mod outcome;
mod source;

pub use flow::{Pipeline, PipelineOptions, StoreFailurePolicy};
pub use histogram::{word_count_histogram, Histogram, DEFAULT_BINS};
pub use outcome::{Flow, RunReport, Step, StepOutcome, StepStatus};
pub use source::SocialSource;
