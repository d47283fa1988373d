pub mod config;
pub mod handlers;

pub use handlers::insights::InsightsAppState;
