//! Vedrfolnir - function-selection accuracy under ambiguous prompts
//!
//! Measures how reliably a language model picks the right action from a
//! fixed menu of ten when the user's request is deliberately ambiguous.
//! Prompts come from a labeled CSV dataset; each one is classified into an
//! ambiguity category by its position, sent to the model, and scored by
//! comparing the selected function name with the label.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vedrfolnir::{Evaluator, OpenAiClient, SelectionClient, PromptRecord, classify};
//!
//! #[tokio::main]
//! async fn main() -> vedrfolnir::Result<()> {
//!     let provider = Arc::new(OpenAiClient::new("sk-your-key")?);
//!     let evaluator = Evaluator::new(SelectionClient::new(provider));
//!
//!     let record = PromptRecord::new(1, "Book me something for tomorrow", "scheduleAppointment", classify(1));
//!     let outcome = evaluator.evaluate_one(&record).await?;
//!     println!("correct: {}", outcome.is_correct);
//!
//!     let report = evaluator.report();
//!     println!("{:.2}%", report.overall_accuracy);
//!     Ok(())
//! }
//! ```

pub mod actions;
pub mod category;
#[cfg(feature = "cli")]
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod providers;
pub mod report;
pub mod selection;
pub mod stats;
pub mod telemetry;
pub mod types;

// Re-export main types at crate root
pub use category::{AmbiguityCategory, CategoryClassifier, PositionalClassifier, classify};
pub use engine::{EvaluationSettings, Evaluator};
pub use error::{Result, VedrError};
pub use providers::{ChatProvider, OpenAiClient, RetryConfig, RetryingChatProvider};
pub use report::{Breakdown, EvaluationReport, InterestingExamples};
pub use selection::SelectionClient;
pub use stats::{Statistics, Tally};
pub use types::{
    ChatOptions, ChatResponse, Decision, DecisionOutcome, FinishReason, Message, PromptRecord,
    Role, Usage,
};
