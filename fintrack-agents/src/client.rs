use async_trait::async_trait;
use shared_types::{ErrorResponse, FinancialSnapshot, InsightsResponse};

use crate::error::{InsightsError, InsightsResult};
use crate::insights::InsightsSource;

pub const INSIGHTS_ROUTE: &str = "/api/ai-insights";

/// Client for the backend's `POST /api/ai-insights` route
#[derive(Clone)]
pub struct ApiInsightsClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiInsightsClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), INSIGHTS_ROUTE)
    }
}

#[async_trait]
impl InsightsSource for ApiInsightsClient {
    async fn fetch_insights(&self, snapshot: &FinancialSnapshot) -> InsightsResult<InsightsResponse> {
        let response = self.client.post(self.endpoint()).json(snapshot).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(serde_json::from_str::<InsightsResponse>(&body)?);
        }

        Err(error_from_route(status.as_u16(), &body))
    }
}

/// Map a non-2xx reply from the insights route back onto `InsightsError`
pub fn error_from_route(status: u16, body: &str) -> InsightsError {
    let error_body: ErrorResponse = match serde_json::from_str(body) {
        Ok(error_body) => error_body,
        Err(_) => {
            let message = if body.trim().is_empty() {
                format!("Insights request failed with status {}", status)
            } else {
                body.trim().to_string()
            };
            return InsightsError::Remote { status, message };
        }
    };

    if error_body.error.contains("not configured") {
        return InsightsError::NotConfigured;
    }

    if error_body.error == "AI provider error" {
        return InsightsError::Upstream {
            status,
            details: error_body
                .details
                .unwrap_or_else(|| "no details provided".to_string()),
        };
    }

    InsightsError::Remote {
        status,
        message: error_body.error,
    }
}
