pub mod openrouter;

pub use openrouter::{OpenRouterConfig, OpenRouterGateway};

use async_trait::async_trait;

use crate::error::InsightsResult;

/// A chat-completion backend that answers one system + user prompt pair.
///
/// Implementations make exactly one upstream call per `complete` and never
/// retry.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> InsightsResult<String>;

    /// Whether the provider has the credentials it needs to make a call
    fn is_configured(&self) -> bool;

    fn provider_name(&self) -> &'static str;
}
