use anyhow::{Context, Result};
use clap::Parser;
use config::{Config, File};
use serde::Deserialize;
use shared_types::{FinancialSnapshot, InsightsResponse};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fintrack_agents::storage::sqlite_storage::default_cache_path;
use fintrack_agents::{
    ApiInsightsClient, InsightsPipeline, InsightsSource, InsightsStore, OpenRouterConfig,
    OpenRouterGateway, SqliteKeyValueStore, StorePhase,
};

#[derive(Parser, Debug)]
#[command(name = "fintrack-insights", about = "Request AI insights for a financial snapshot")]
struct Cli {
    /// Path to a JSON file with transactions, goals and totals
    #[arg(long, value_name = "PATH", required_unless_present = "cached")]
    snapshot: Option<PathBuf>,

    /// Send the snapshot to a running fintrack-api instead of calling the provider directly
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Override the OpenRouter model ID
    #[arg(long)]
    model: Option<String>,

    /// Only show cached insights if they are still fresh
    #[arg(long)]
    cached: bool,

    /// Print the raw JSON response
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
struct ApiConfig {
    openrouter: Option<OpenRouterSection>,
}

#[derive(Debug, Deserialize, Clone, Default)]
struct OpenRouterSection {
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    site_url: Option<String>,
    app_name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = load_api_config()?;
    let source = build_source(&cli, &config);

    let cache_path = default_cache_path()?;
    let cache = Arc::new(
        SqliteKeyValueStore::open(&cache_path)
            .with_context(|| format!("Failed to open insights cache at {:?}", cache_path))?,
    );

    let store = InsightsStore::load(source, cache).await;

    if cli.cached {
        return match store.insights() {
            Some(insights) => print_insights(&insights, cli.json),
            None => {
                println!("No fresh cached insights.");
                Ok(())
            }
        };
    }

    let snapshot_path = cli
        .snapshot
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("--snapshot is required"))?;
    let snapshot = load_snapshot(snapshot_path)?;

    match store.fetch(snapshot).await {
        Ok(insights) => print_insights(&insights, cli.json),
        Err(message) => {
            // a stale result from an earlier run is still worth showing
            if store.phase() == StorePhase::Error {
                if let Some(previous) = store.insights() {
                    eprintln!("Showing previous insights from {}", previous.timestamp);
                    print_insights(&previous, cli.json)?;
                }
            }
            Err(anyhow::anyhow!(message))
        }
    }
}

fn build_source(cli: &Cli, config: &ApiConfig) -> Arc<dyn InsightsSource> {
    if let Some(api_url) = &cli.api_url {
        tracing::info!("Using insights API at {}", api_url);
        return Arc::new(ApiInsightsClient::new(api_url.clone()));
    }

    let section = config.openrouter.clone().unwrap_or_default();
    let defaults = OpenRouterConfig::default();
    let openrouter = OpenRouterConfig {
        api_key: section.api_key,
        model: cli
            .model
            .clone()
            .or(section.model)
            .unwrap_or(defaults.model),
        base_url: section.base_url.unwrap_or(defaults.base_url),
        site_url: section.site_url.unwrap_or(defaults.site_url),
        app_name: section.app_name.unwrap_or(defaults.app_name),
    }
    .with_env_overrides();

    let gateway = Arc::new(OpenRouterGateway::new(openrouter));
    Arc::new(InsightsPipeline::new(gateway))
}

fn print_insights(response: &InsightsResponse, as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(response)?);
        return Ok(());
    }

    println!("{}", response.summary);
    println!();
    for insight in &response.insights {
        println!(
            "[{:?}/{:?}] {}",
            insight.insight_type, insight.category, insight.title
        );
        println!("    {}", insight.description);
        if let (Some(label), Some(url)) = (&insight.action_label, &insight.action_url) {
            println!("    -> {} ({})", label, url);
        }
    }
    println!();
    println!("Generated at {}", response.timestamp);
    Ok(())
}

fn load_snapshot(path: &Path) -> Result<FinancialSnapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot at {:?}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid snapshot JSON in {:?}", path))
}

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

/// The API config is optional here: environment variables are enough
fn load_api_config() -> Result<ApiConfig> {
    let config_path = get_config_path();
    if !config_path.exists() {
        tracing::debug!("No config file at {:?}, using environment only", config_path);
        return Ok(ApiConfig::default());
    }

    let builder = Config::builder()
        .add_source(File::from(config_path.clone()))
        .build()
        .with_context(|| format!("Failed to load config at {:?}", config_path))?;

    let config: ApiConfig = builder.try_deserialize()?;
    Ok(config)
}

fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("fintrack").join("api.toml")
    } else {
        PathBuf::from("api.toml")
    }
}
