use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub mod insight;
pub mod snapshot;

pub use insight::{InsightCategory, InsightItem, InsightType, InsightsResponse};
pub use snapshot::{FinancialSnapshot, Goal, Totals, Transaction, TransactionType};

/// Error response for API endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}
