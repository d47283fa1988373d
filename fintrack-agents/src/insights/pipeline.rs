use async_trait::async_trait;
use shared_types::{FinancialSnapshot, InsightsResponse};
use std::sync::Arc;

use super::{build_user_prompt, parse_insights, SYSTEM_PROMPT};
use crate::clock::{Clock, SystemClock};
use crate::error::InsightsResult;
use crate::provider::CompletionProvider;

/// Anything that can turn a snapshot into insights: the in-process
/// pipeline or the HTTP route.
#[async_trait]
pub trait InsightsSource: Send + Sync {
    async fn fetch_insights(&self, snapshot: &FinancialSnapshot) -> InsightsResult<InsightsResponse>;
}

/// Prompt building, one provider call and response parsing, in sequence
pub struct InsightsPipeline {
    provider: Arc<dyn CompletionProvider>,
    clock: Arc<dyn Clock>,
}

impl InsightsPipeline {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self::with_clock(provider, Arc::new(SystemClock))
    }

    pub fn with_clock(provider: Arc<dyn CompletionProvider>, clock: Arc<dyn Clock>) -> Self {
        Self { provider, clock }
    }

    pub fn provider(&self) -> &dyn CompletionProvider {
        self.provider.as_ref()
    }

    pub async fn generate(&self, snapshot: &FinancialSnapshot) -> InsightsResult<InsightsResponse> {
        let user_prompt = build_user_prompt(snapshot);

        tracing::info!(
            provider = self.provider.provider_name(),
            transactions = snapshot.transactions.len(),
            goals = snapshot.goals.len(),
            "Generating AI insights"
        );

        let content = self.provider.complete(SYSTEM_PROMPT, &user_prompt).await?;
        let response = parse_insights(&content, self.clock.now())?;

        tracing::info!(insights = response.insights.len(), "AI insights generated");
        Ok(response)
    }
}

#[async_trait]
impl InsightsSource for InsightsPipeline {
    async fn fetch_insights(&self, snapshot: &FinancialSnapshot) -> InsightsResult<InsightsResponse> {
        self.generate(snapshot).await
    }
}
