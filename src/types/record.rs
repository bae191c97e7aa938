//! Labeled dataset records

use serde::Serialize;

use crate::category::AmbiguityCategory;

/// One row of the labeled dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptRecord {
    /// Zero-based position in the dataset.
    pub position: usize,
    pub text: String,
    pub expected_function: String,
    /// Derived from `position` at load time.
    pub category: AmbiguityCategory,
}

impl PromptRecord {
    pub fn new(
        position: usize,
        text: impl Into<String>,
        expected_function: impl Into<String>,
        category: AmbiguityCategory,
    ) -> Self {
        Self {
            position,
            text: text.into(),
            expected_function: expected_function.into(),
            category,
        }
    }
}
