//! Chat providers for the decision-making service.
//!
//! The selection client depends only on [`ChatProvider`]; the OpenAI-compatible
//! HTTP client and the retry decorator are interchangeable implementations.

pub mod openai;
pub mod retry;
pub mod traits;

pub use openai::OpenAiClient;
pub use retry::{RetryConfig, RetryingChatProvider};
pub use traits::ChatProvider;
