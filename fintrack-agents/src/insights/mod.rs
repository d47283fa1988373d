pub mod parse;
pub mod pipeline;
pub mod system_prompt;

pub use parse::parse_insights;
pub use pipeline::{InsightsPipeline, InsightsSource};
pub use system_prompt::{build_user_prompt, SYSTEM_PROMPT};
