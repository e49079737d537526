//! Fuzzy matching of show previews against a free-text query.

use rayon::prelude::*;

use crate::catalog::ShowPreview;

/// Scores how well `pattern` occurs somewhere in `text`.
///
/// Lower is better: `0.0` is an exact match at the very start of the text.
/// `None` means the pattern does not occur closely enough to count.
pub trait Similarity: Send + Sync {
    fn score(&self, pattern: &str, text: &str) -> Option<f64>;
}

/// Approximate substring matching with a location penalty.
///
/// The score of a match is `errors / pattern_len + start / distance`, where
/// `errors` is the edit distance between the pattern and the best-matching
/// substring of the text and `start` is where that substring begins.
#[derive(Debug, Clone, Copy)]
pub struct ApproximateMatcher {
    pub threshold: f64,
    pub distance: f64,
}

impl Default for ApproximateMatcher {
    fn default() -> Self {
        Self {
            threshold: 0.4,
            distance: 100.0,
        }
    }
}

impl ApproximateMatcher {
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }
}

impl Similarity for ApproximateMatcher {
    fn score(&self, pattern: &str, text: &str) -> Option<f64> {
        let pattern: Vec<char> = pattern.to_lowercase().chars().collect();
        let text: Vec<char> = text.to_lowercase().chars().collect();
        let m = pattern.len();
        if m == 0 {
            return Some(0.0);
        }

        // Sellers' algorithm: column j holds, for every pattern prefix, the
        // cheapest alignment ending at text[j - 1], with a free start anywhere.
        // `starts` tracks where that alignment began.
        let mut cost: Vec<usize> = (0..=m).collect();
        let mut starts: Vec<usize> = vec![0; m + 1];
        let mut best: Option<f64> = None;

        for (j, &tc) in text.iter().enumerate() {
            let mut prev_cost = cost[0];
            let mut prev_start = starts[0];
            cost[0] = 0;
            starts[0] = j + 1;

            for i in 1..=m {
                let substitution = prev_cost + usize::from(pattern[i - 1] != tc);
                let deletion = cost[i] + 1;
                let insertion = cost[i - 1] + 1;

                let (next_cost, next_start) =
                    if substitution <= deletion && substitution <= insertion {
                        (substitution, prev_start)
                    } else if insertion <= deletion {
                        (insertion, starts[i - 1])
                    } else {
                        (deletion, starts[i])
                    };

                prev_cost = cost[i];
                prev_start = starts[i];
                cost[i] = next_cost;
                starts[i] = next_start;
            }

            let accuracy = cost[m] as f64 / m as f64;
            let proximity = starts[m] as f64 / self.distance;
            let score = accuracy + proximity;
            if score <= self.threshold && best.is_none_or(|b| score < b) {
                best = Some(score);
            }
        }

        best
    }
}

/// Searches previews by title and description, best matches first.
///
/// A show's score is the better of its title and description scores; ties keep
/// catalog order.
pub fn search_shows<'a, M: Similarity>(
    shows: &'a [ShowPreview],
    query: &str,
    matcher: &M,
) -> Vec<&'a ShowPreview> {
    let query = query.trim();
    if query.is_empty() {
        return shows.iter().collect();
    }

    let mut scored: Vec<(f64, &ShowPreview)> = shows
        .par_iter()
        .filter_map(|show| {
            let title = matcher.score(query, &show.title);
            let description = matcher.score(query, &show.description);
            let score = match (title, description) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
            score.map(|score| (score, show))
        })
        .collect();

    scored.sort_by(|a, b| a.0.total_cmp(&b.0));
    scored.into_iter().map(|(_, show)| show).collect()
}
