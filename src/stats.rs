//! Accuracy accumulators.

use indexmap::IndexMap;
use serde::Serialize;

use crate::category::AmbiguityCategory;
use crate::types::DecisionOutcome;

/// Attempt counter for one bucket. `correct <= total` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub total: u64,
    pub correct: u64,
}

impl Tally {
    pub fn record(&mut self, is_correct: bool) {
        self.total += 1;
        if is_correct {
            self.correct += 1;
        }
    }

    /// Percentage of correct attempts; 0 for an empty bucket.
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 / self.total as f64 * 100.0
    }
}

/// Overall, per-expected-function and per-category tallies for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    overall: Tally,
    by_function: IndexMap<String, Tally>,
    by_category: IndexMap<AmbiguityCategory, Tally>,
}

impl Default for Statistics {
    fn default() -> Self {
        Self::new()
    }
}

impl Statistics {
    /// Empty statistics with every named category pre-seeded at zero.
    pub fn new() -> Self {
        Self {
            overall: Tally::default(),
            by_function: IndexMap::new(),
            by_category: AmbiguityCategory::NAMED
                .into_iter()
                .map(|category| (category, Tally::default()))
                .collect(),
        }
    }

    /// Fold one outcome into all three accumulators.
    ///
    /// The function bucket is keyed by the expected function, so a wrong
    /// guess counts against the function that should have been chosen.
    pub fn record(&mut self, outcome: &DecisionOutcome) {
        self.overall.record(outcome.is_correct);
        self.by_function
            .entry(outcome.expected_function.clone())
            .or_default()
            .record(outcome.is_correct);
        self.by_category
            .entry(outcome.category)
            .or_default()
            .record(outcome.is_correct);
    }

    pub fn overall(&self) -> Tally {
        self.overall
    }

    /// Function buckets in first-seen order.
    pub fn by_function(&self) -> &IndexMap<String, Tally> {
        &self.by_function
    }

    /// Category buckets: the eleven named categories in dataset order,
    /// followed by `Unknown` once it has been touched.
    pub fn by_category(&self) -> &IndexMap<AmbiguityCategory, Tally> {
        &self.by_category
    }

    pub fn function(&self, name: &str) -> Option<Tally> {
        self.by_function.get(name).copied()
    }

    pub fn category(&self, category: AmbiguityCategory) -> Option<Tally> {
        self.by_category.get(&category).copied()
    }
}
