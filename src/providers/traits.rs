//! Provider trait for chat completion backends.
//!
//! Decorators such as [`RetryingChatProvider`](super::RetryingChatProvider)
//! wrap an `Arc<dyn ChatProvider>` and implement the same trait, so callers
//! never know whether retries are in play.

use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;
use crate::types::{ChatOptions, ChatResponse, Message};

/// Provider for non-streaming chat completion.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider name for logging/debugging.
    fn name(&self) -> &str;

    /// Send one chat request and return the complete reply.
    async fn chat(&self, messages: &[Message], options: &ChatOptions) -> Result<ChatResponse>;
}

#[async_trait]
impl<T: ChatProvider + ?Sized> ChatProvider for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn chat(&self, messages: &[Message], options: &ChatOptions) -> Result<ChatResponse> {
        (**self).chat(messages, options).await
    }
}
