//! Ambiguity categories and position-based classification.
//!
//! The labeled dataset is laid out in fixed blocks of twenty prompts, one
//! block per linguistic phenomenon. A record's category is therefore a pure
//! function of its position, never of its content. Reordering or filtering
//! the dataset silently relabels every later row, so the mapping sits behind
//! [`CategoryClassifier`] where it can be swapped for explicit labels.

use std::fmt;

use serde::{Serialize, Serializer};

/// Linguistic phenomenon a prompt is designed to probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AmbiguityCategory {
    Lexical,
    Syntactic,
    Scopal,
    Elliptical,
    CollectiveDistributive,
    Implicative,
    Presuppositional,
    Idiomatic,
    Coreferential,
    GenericNonGeneric,
    TypeToken,
    Unknown,
}

/// Inclusive 1-based position ranges, in scan order.
const RANGES: [(usize, usize, AmbiguityCategory); 11] = [
    (2, 21, AmbiguityCategory::Lexical),
    (22, 41, AmbiguityCategory::Syntactic),
    (42, 61, AmbiguityCategory::Scopal),
    (62, 81, AmbiguityCategory::Elliptical),
    (82, 101, AmbiguityCategory::CollectiveDistributive),
    (102, 121, AmbiguityCategory::Implicative),
    (122, 141, AmbiguityCategory::Presuppositional),
    (142, 161, AmbiguityCategory::Idiomatic),
    (162, 181, AmbiguityCategory::Coreferential),
    (182, 201, AmbiguityCategory::GenericNonGeneric),
    (202, 221, AmbiguityCategory::TypeToken),
];

impl AmbiguityCategory {
    /// The eleven named categories in dataset order (excludes `Unknown`).
    pub const NAMED: [AmbiguityCategory; 11] = [
        AmbiguityCategory::Lexical,
        AmbiguityCategory::Syntactic,
        AmbiguityCategory::Scopal,
        AmbiguityCategory::Elliptical,
        AmbiguityCategory::CollectiveDistributive,
        AmbiguityCategory::Implicative,
        AmbiguityCategory::Presuppositional,
        AmbiguityCategory::Idiomatic,
        AmbiguityCategory::Coreferential,
        AmbiguityCategory::GenericNonGeneric,
        AmbiguityCategory::TypeToken,
    ];

    /// Human-readable label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            AmbiguityCategory::Lexical => "Lexical Ambiguity",
            AmbiguityCategory::Syntactic => "Syntactic Ambiguity",
            AmbiguityCategory::Scopal => "Scopal Ambiguity",
            AmbiguityCategory::Elliptical => "Elliptical Ambiguity",
            AmbiguityCategory::CollectiveDistributive => "Collective/Distributive Ambiguity",
            AmbiguityCategory::Implicative => "Implicative Ambiguity",
            AmbiguityCategory::Presuppositional => "Presuppositional Ambiguity",
            AmbiguityCategory::Idiomatic => "Idiomatic Ambiguity",
            AmbiguityCategory::Coreferential => "Coreferential Ambiguity",
            AmbiguityCategory::GenericNonGeneric => "Generic/Non-generic Ambiguity",
            AmbiguityCategory::TypeToken => "Type/Token Ambiguity",
            AmbiguityCategory::Unknown => "Unknown",
        }
    }

    /// Category for a zero-based dataset position.
    pub fn from_position(position: usize) -> Self {
        let effective = position.saturating_add(1);
        RANGES
            .iter()
            .find(|(start, end, _)| *start <= effective && effective <= *end)
            .map(|(_, _, category)| *category)
            .unwrap_or(AmbiguityCategory::Unknown)
    }
}

impl fmt::Display for AmbiguityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for AmbiguityCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Assigns an ambiguity category to a dataset record.
pub trait CategoryClassifier: Send + Sync {
    /// Classify the record at the given zero-based position.
    fn classify(&self, position: usize) -> AmbiguityCategory;
}

/// Classifier that derives the category from the record's position alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionalClassifier;

impl CategoryClassifier for PositionalClassifier {
    fn classify(&self, position: usize) -> AmbiguityCategory {
        AmbiguityCategory::from_position(position)
    }
}

/// Shorthand for [`AmbiguityCategory::from_position`].
pub fn classify(position: usize) -> AmbiguityCategory {
    AmbiguityCategory::from_position(position)
}
