//! Word-count distribution of stored toot bodies, rendered as a text chart.
use std::fmt;

pub const DEFAULT_BINS: usize = 20;
const BAR_WIDTH: u64 = 40;

/// Number of words in `text` when split on single spaces.
///
/// Empty input counts as one word, and runs of spaces produce empty words.
pub fn word_count(text: &str) -> usize {
    text.split(' ').count()
}

/// Equal-width histogram: `edges` has one more entry than `counts`.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<u64>,
}

impl Histogram {
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Bucket the word counts of `texts` into `bins` equal-width bins spanning the
/// observed range. A degenerate range is widened by half a word on each side.
pub fn word_count_histogram<'a, I>(texts: I, bins: usize) -> Histogram
where
    I: IntoIterator<Item = &'a str>,
{
    let values: Vec<f64> = texts.into_iter().map(|t| word_count(t) as f64).collect();
    let bins = bins.max(1);
    let (Some(min), Some(max)) = (
        values.iter().copied().reduce(f64::min),
        values.iter().copied().reduce(f64::max),
    ) else {
        return Histogram {
            edges: Vec::new(),
            counts: Vec::new(),
        };
    };

    let (lo, hi) = if min == max {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    };
    let width = (hi - lo) / bins as f64;
    let edges = (0..=bins).map(|i| lo + width * i as f64).collect();

    let mut counts = vec![0u64; bins];
    for v in values {
        // The right edge of the last bin is inclusive.
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }
    Histogram { edges, counts }
}

impl fmt::Display for Histogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Word Count Distribution in Toots")?;
        if self.is_empty() {
            return writeln!(f, "  (no toots)");
        }
        let peak = self.counts.iter().copied().max().unwrap_or(0).max(1);
        for (i, count) in self.counts.iter().enumerate() {
            let bar = (count * BAR_WIDTH).div_ceil(peak) as usize;
            writeln!(
                f,
                "{:>7.1} - {:<7.1} | {:<width$} {count}",
                self.edges[i],
                self.edges[i + 1],
                "#".repeat(bar),
                width = BAR_WIDTH as usize,
            )?;
        }
        Ok(())
    }
}
