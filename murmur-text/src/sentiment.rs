//! Three-way polarity labels over free text.
//!
//! Scoring is behind [`PolarityScorer`]; only the sign of the score is part of
//! the labelling contract (see [`Sentiment::from_polarity`]).
use murmur_common::Sentiment;

/// Scores text on a `[-1, 1]` polarity scale.
pub trait PolarityScorer: Send + Sync {
    fn polarity(&self, text: &str) -> f64;
}

/// Lexicon scorer backed by VADER's compound score.
#[derive(Debug, Clone, Copy, Default)]
pub struct VaderScorer;

impl PolarityScorer for VaderScorer {
    fn polarity(&self, text: &str) -> f64 {
        if text.trim().is_empty() {
            return 0.0;
        }
        let analyzer = vader_sentiment::SentimentIntensityAnalyzer::new();
        let compound = analyzer
            .polarity_scores(text)
            .get("compound")
            .copied()
            .unwrap_or(0.0);
        if compound.is_finite() { compound } else { 0.0 }
    }
}

impl<F> PolarityScorer for F
where
    F: Fn(&str) -> f64 + Send + Sync,
{
    fn polarity(&self, text: &str) -> f64 {
        self(text)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Labeler<S = VaderScorer> {
    scorer: S,
}

impl Labeler<VaderScorer> {
    pub fn vader() -> Self {
        Self {
            scorer: VaderScorer,
        }
    }
}

impl<S: PolarityScorer> Labeler<S> {
    pub fn new(scorer: S) -> Self {
        Self { scorer }
    }

    /// `None` in, `None` out; otherwise the label for the scorer's polarity.
    pub fn classify(&self, text: Option<&str>) -> Option<Sentiment> {
        let text = text?;
        let score = self.scorer.polarity(text);
        tracing::trace!(score, len = text.len(), "text.sentiment.scored");
        Some(Sentiment::from_polarity(score))
    }
}
