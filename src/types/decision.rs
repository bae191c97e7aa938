//! Model decisions and scored outcomes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::AmbiguityCategory;

/// What the model answered for one prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Decision {
    /// The reply had the expected shape.
    Decoded {
        selected_function: String,
        parameters: serde_json::Map<String, serde_json::Value>,
        reasoning: String,
    },
    /// The reply could not be decoded, or the call itself failed.
    DecodeFailed { raw_text: String, error: String },
}

impl Decision {
    pub fn failed(raw_text: impl Into<String>, error: impl ToString) -> Self {
        Decision::DecodeFailed {
            raw_text: raw_text.into(),
            error: error.to_string(),
        }
    }

    /// The chosen function name; `None` marks an unparseable reply.
    pub fn selected_function(&self) -> Option<&str> {
        match self {
            Decision::Decoded {
                selected_function, ..
            } => Some(selected_function),
            Decision::DecodeFailed { .. } => None,
        }
    }

    pub fn reasoning(&self) -> Option<&str> {
        match self {
            Decision::Decoded { reasoning, .. } => Some(reasoning),
            Decision::DecodeFailed { .. } => None,
        }
    }

    pub fn is_decoded(&self) -> bool {
        matches!(self, Decision::Decoded { .. })
    }
}

/// A scored decision for one prompt. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionOutcome {
    pub position: usize,
    pub prompt: String,
    pub expected_function: String,
    pub category: AmbiguityCategory,
    pub selected_function: Option<String>,
    pub decision: Decision,
    pub is_correct: bool,
    pub timestamp: DateTime<Utc>,
}
