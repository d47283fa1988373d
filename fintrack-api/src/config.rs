use config::{Config, ConfigError, File};
use fintrack_agents::provider::openrouter::{
    DEFAULT_APP_NAME, DEFAULT_MODEL, DEFAULT_SITE_URL, OPENROUTER_BASE_URL,
};
use fintrack_agents::OpenRouterConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    pub openrouter: Option<OpenRouterSettings>,
    pub cors: Option<CorsConfig>,
    pub server: Option<ServerConfig>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            openrouter: Some(OpenRouterSettings::default()),
            cors: Some(CorsConfig {
                allowed_origins: vec!["http://localhost:3000".to_string()],
            }),
            server: Some(ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct OpenRouterSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub site_url: String,
    pub app_name: String,
}

impl Default for OpenRouterSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: OPENROUTER_BASE_URL.to_string(),
            site_url: DEFAULT_SITE_URL.to_string(),
            app_name: DEFAULT_APP_NAME.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

const CONFIG_HEADER: &str = r#"# fintrack-api configuration
#
# The OpenRouter key is normally provided through OPENROUTER_API_KEY.
# It can also be set in the [openrouter] table below:
#   api_key = "sk-or-..."

"#;

impl ApiConfig {
    pub fn load() -> Result<(Self, PathBuf), ConfigError> {
        let config_path = get_config_path();

        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Message(format!("Failed to create config directory: {e}"))
            })?;
        }

        // Create default config file if it doesn't exist
        if !config_path.exists() {
            let defaults = toml::to_string_pretty(&ApiConfig::default()).map_err(|e| {
                ConfigError::Message(format!("Failed to serialize default config: {e}"))
            })?;
            std::fs::write(&config_path, format!("{CONFIG_HEADER}{defaults}")).map_err(|e| {
                ConfigError::Message(format!("Failed to write default config: {e}"))
            })?;
        }

        let builder = Config::builder()
            .add_source(File::from(config_path.clone()))
            .build()?;

        let config: ApiConfig = builder.try_deserialize()?;

        Ok((config, config_path))
    }

    /// Gateway settings with `OPENROUTER_API_KEY` / `NEXT_PUBLIC_APP_NAME`
    /// taking precedence over the file
    pub fn openrouter_config(&self) -> OpenRouterConfig {
        let settings = self.openrouter.clone().unwrap_or_default();
        OpenRouterConfig {
            api_key: settings.api_key,
            model: settings.model,
            base_url: settings.base_url,
            site_url: settings.site_url,
            app_name: settings.app_name,
        }
        .with_env_overrides()
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("fintrack").join("api.toml")
    } else {
        PathBuf::from("api.toml")
    }
}
