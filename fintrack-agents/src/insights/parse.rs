use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use shared_types::{InsightCategory, InsightItem, InsightType, InsightsResponse};
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::error::{InsightsError, InsightsResult};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LlmInsight {
    #[serde(default)]
    id: Option<Value>,
    #[serde(rename = "type")]
    insight_type: InsightType,
    title: String,
    description: String,
    category: InsightCategory,
    #[serde(default)]
    action_label: Option<String>,
    #[serde(default)]
    action_url: Option<String>,
}

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").expect("fence regex is valid")
    })
}

/// Parse a completion as JSON: the whole trimmed text when it is valid JSON,
/// otherwise the body of the first markdown code fence.
pub fn extract_json(content: &str) -> Result<Value, serde_json::Error> {
    let trimmed = content.trim();
    match serde_json::from_str(trimmed) {
        Ok(value) => Ok(value),
        Err(whole_err) => match fence_regex().captures(trimmed).and_then(|caps| caps.get(1)) {
            Some(inner) => serde_json::from_str(inner.as_str()),
            None => Err(whole_err),
        },
    }
}

/// Parse a provider completion into an `InsightsResponse` stamped with
/// `received_at`.
///
/// Entries that don't match the insight schema are dropped; missing or
/// duplicate ids are replaced so ids stay unique within the response.
pub fn parse_insights(content: &str, received_at: DateTime<Utc>) -> InsightsResult<InsightsResponse> {
    let value = extract_json(content).map_err(|e| {
        tracing::warn!(error = %e, content = %content, "AI response was not valid JSON");
        InsightsError::Parse
    })?;

    let root = value
        .as_object()
        .ok_or_else(|| InsightsError::InvalidResponse("expected a JSON object".to_string()))?;

    let raw_items = match root.get("insights") {
        Some(Value::Array(items)) => items,
        _ => {
            return Err(InsightsError::InvalidResponse(
                "missing \"insights\" array".to_string(),
            ))
        }
    };

    let summary = root
        .get("summary")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(InsightsResponse {
        insights: validate_insights(raw_items),
        summary,
        timestamp: received_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

fn validate_insights(raw_items: &[Value]) -> Vec<InsightItem> {
    let mut seen_ids = HashSet::new();
    let mut insights = Vec::with_capacity(raw_items.len());

    for (index, raw) in raw_items.iter().enumerate() {
        let item: LlmInsight = match serde_json::from_value(raw.clone()) {
            Ok(item) => item,
            Err(e) => {
                tracing::warn!(index, error = %e, "Dropping insight that does not match schema");
                continue;
            }
        };

        let title = item.title.trim();
        let description = item.description.trim();
        if title.is_empty() || description.is_empty() {
            tracing::warn!(index, "Dropping insight with empty title or description");
            continue;
        }

        let position = insights.len() + 1;
        let id = match id_to_string(item.id.as_ref()) {
            Some(id) if !seen_ids.contains(&id) => id,
            _ => fresh_id(position, &seen_ids),
        };
        seen_ids.insert(id.clone());

        insights.push(InsightItem {
            id,
            insight_type: item.insight_type,
            title: title.to_string(),
            description: description.to_string(),
            category: item.category,
            action_label: non_blank(item.action_label),
            action_url: non_blank(item.action_url),
        });
    }

    insights
}

fn id_to_string(id: Option<&Value>) -> Option<String> {
    let id = match id? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!id.is_empty()).then_some(id)
}

fn fresh_id(position: usize, seen: &HashSet<String>) -> String {
    let base = format!("insight-{}", position);
    if !seen.contains(&base) {
        return base;
    }
    (2..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !seen.contains(candidate))
        .unwrap_or(base)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn received_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap()
    }

    const PAYLOAD: &str = r#"{
  "insights": [
    {
      "id": "1",
      "type": "warning",
      "title": "Spending is high",
      "description": "Expenses are 60% of income.",
      "category": "spending",
      "actionLabel": "Review transactions",
      "actionUrl": "/transactions"
    },
    {
      "id": "2",
      "type": "success",
      "title": "Goal progress",
      "description": "Trip goal is 20% funded.",
      "category": "goals"
    }
  ],
  "summary": "Solid savings rate with room to trim spending."
}"#;

    #[test]
    fn test_fenced_json_round_trip() {
        let content = format!("Here you go:\n```json\n{}\n```\nGood luck!", PAYLOAD);
        let response = parse_insights(&content, received_at()).unwrap();

        let mut expected: Value = serde_json::from_str(PAYLOAD).unwrap();
        expected["timestamp"] = Value::String("2024-06-01T12:30:00.000Z".to_string());
        assert_eq!(serde_json::to_value(&response).unwrap(), expected);
    }

    #[test]
    fn test_bare_json_accepted() {
        let response = parse_insights(PAYLOAD, received_at()).unwrap();
        assert_eq!(response.insights.len(), 2);
        assert_eq!(response.insights[0].action_url.as_deref(), Some("/transactions"));
    }

    #[test]
    fn test_backticks_inside_bare_json_kept() {
        let content = r#"{"insights":[{"id":"1","type":"tip","title":"Weekly check","description":"Run ```budget``` weekly","category":"general"}],"summary":"s"}"#;
        let response = parse_insights(content, received_at()).unwrap();
        assert_eq!(response.insights.len(), 1);
        assert_eq!(response.insights[0].description, "Run ```budget``` weekly");
        assert_eq!(response.summary, "s");
    }

    #[test]
    fn test_bare_fence_without_language() {
        let content = format!("```\n{}\n```", PAYLOAD);
        let response = parse_insights(&content, received_at()).unwrap();
        assert_eq!(response.insights.len(), 2);
    }

    #[test]
    fn test_prose_is_parse_error() {
        let err = parse_insights("I think you should save more money.", received_at()).unwrap_err();
        assert!(matches!(err, InsightsError::Parse));
        assert_eq!(
            err.to_string(),
            "Failed to parse AI response. The model didn't return valid JSON."
        );
    }

    #[test]
    fn test_missing_insights_array_rejected() {
        let err = parse_insights(r#"{"summary": "ok"}"#, received_at()).unwrap_err();
        assert!(matches!(err, InsightsError::InvalidResponse(_)));
    }

    #[test]
    fn test_non_conforming_entries_dropped() {
        let content = r#"{
            "insights": [
                {"id": "a", "type": "tip", "title": "Keep", "description": "Valid", "category": "savings"},
                {"id": "b", "type": "alert", "title": "Bad type", "description": "x", "category": "savings"},
                {"id": "c", "type": "info", "title": "Bad category", "description": "x", "category": "crypto"},
                {"id": "d", "type": "info", "description": "No title", "category": "general"},
                {"id": "e", "type": "info", "title": "  ", "description": "Blank title", "category": "general"}
            ],
            "summary": "mixed"
        }"#;

        let response = parse_insights(content, received_at()).unwrap();
        assert_eq!(response.insights.len(), 1);
        assert_eq!(response.insights[0].id, "a");
    }

    #[test]
    fn test_missing_and_duplicate_ids_repaired() {
        let content = r#"{
            "insights": [
                {"id": "insight-2", "type": "tip", "title": "One", "description": "d", "category": "general"},
                {"type": "tip", "title": "Two", "description": "d", "category": "general"},
                {"id": "insight-2", "type": "tip", "title": "Three", "description": "d", "category": "general"},
                {"id": 7, "type": "tip", "title": "Four", "description": "d", "category": "general"}
            ],
            "summary": "ids"
        }"#;

        let response = parse_insights(content, received_at()).unwrap();
        let ids: Vec<&str> = response.insights.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["insight-2", "insight-2-2", "insight-3", "7"]);
    }

    #[test]
    fn test_missing_summary_defaults_to_empty() {
        let response = parse_insights(r#"{"insights": []}"#, received_at()).unwrap();
        assert!(response.insights.is_empty());
        assert_eq!(response.summary, "");
    }

    #[test]
    fn test_blank_action_fields_removed() {
        let content = r#"{"insights": [{"id": "1", "type": "info", "title": "t", "description": "d", "category": "general", "actionLabel": "", "actionUrl": " "}], "summary": ""}"#;
        let response = parse_insights(content, received_at()).unwrap();
        assert_eq!(response.insights[0].action_label, None);
        assert_eq!(response.insights[0].action_url, None);
    }
}
