//! Text cleanup and sentiment labelling for stored profile notes.
//!
//! ```rust
//! use murmur_common::Sentiment;
//! use murmur_text::{strip_markup, Labeler};
//!
//! let clean = strip_markup(Some("<p>I love this</p>"));
//! assert_eq!(clean.as_deref(), Some("I love this"));
//! assert_eq!(Labeler::vader().classify(clean.as_deref()), Some(Sentiment::Positive));
//! ```
pub mod normalize;
pub mod sentiment;

pub use normalize::strip_markup;
pub use sentiment::{Labeler, PolarityScorer, VaderScorer};
