//! Public types for the Vedrfolnir API.

mod decision;
mod message;
mod options;
mod record;
mod response;

pub use decision::{Decision, DecisionOutcome};
pub use message::{Message, Role};
pub use options::ChatOptions;
pub use record::PromptRecord;
pub use response::{ChatResponse, FinishReason, Usage};
