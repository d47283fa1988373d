use thiserror::Error;

pub const NOT_CONFIGURED_MESSAGE: &str =
    "OPENROUTER_API_KEY not configured. Please add it to your environment variables.";

pub const PARSE_FAILURE_MESSAGE: &str =
    "Failed to parse AI response. The model didn't return valid JSON.";

pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Please try again in a moment.";

#[derive(Error, Debug)]
pub enum InsightsError {
    #[error("{}", NOT_CONFIGURED_MESSAGE)]
    NotConfigured,

    #[error("AI provider error (status {status}): {details}")]
    Upstream { status: u16, details: String },

    #[error("AI provider returned an empty or invalid response")]
    EmptyCompletion,

    #[error("{}", PARSE_FAILURE_MESSAGE)]
    Parse,

    #[error("Invalid AI response: {0}")]
    InvalidResponse(String),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{message}")]
    Remote { status: u16, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type InsightsResult<T> = Result<T, InsightsError>;

impl InsightsError {
    /// HTTP status the insights route answers with for this error
    pub fn status_code(&self) -> u16 {
        match self {
            InsightsError::Upstream { status, .. } => *status,
            InsightsError::Remote { status, .. } => *status,
            _ => 500,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, InsightsError::Upstream { status: 429, .. })
    }

    /// Message shown in the insights error panel
    pub fn user_message(&self) -> String {
        match self {
            InsightsError::Upstream { status: 429, .. } => RATE_LIMIT_MESSAGE.to_string(),
            InsightsError::Upstream { details, .. } => format!("AI provider error: {}", details),
            InsightsError::Request(e) => format!("Failed to fetch insights: {}", e),
            InsightsError::Remote { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
