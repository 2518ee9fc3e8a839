use serde::Serialize;

use super::types::TestResult;

/// Percentage sent to the LMS for one batch of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreReport {
    pub percentage: u8,
}

impl ScoreReport {
    /// `floor(successes / total * 100)`. `None` for an empty batch.
    pub fn from_counts(successes: usize, total: usize) -> Option<Self> {
        if total == 0 {
            return None;
        }
        let successes = successes.min(total);
        // Bounded by 100 since successes <= total.
        let percentage = (successes * 100 / total) as u8;
        Some(Self { percentage })
    }

    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a TestResult>) -> Option<Self> {
        let (successes, total) = results.into_iter().fold((0, 0), |(s, n), r| {
            (s + usize::from(r.is_success()), n + 1)
        });
        Self::from_counts(successes, total)
    }
}
