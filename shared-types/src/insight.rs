use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Tone of an insight card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
pub enum InsightType {
    Tip,
    Warning,
    Success,
    Info,
}

/// Area of the user's finances an insight is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
pub enum InsightCategory {
    Spending,
    Savings,
    Goals,
    General,
}

/// A single AI-generated insight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct InsightItem {
    pub id: String,
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub title: String,
    pub description: String,
    pub category: InsightCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub action_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub action_url: Option<String>,
}

/// Result of one successful insights request.
///
/// Replaced wholesale by the next successful request, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct InsightsResponse {
    pub insights: Vec<InsightItem>,
    pub summary: String,
    /// ISO-8601 time the provider reply was received
    pub timestamp: String,
}
