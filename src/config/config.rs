use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::api::{ApiConfig, AppConfig, FeaturesConfig, non_blank};
use super::gate::GateConfig;
use super::logging::LoggingConfig;

pub const ENV_PREFIX: &str = "STOREFRONT_";

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0.
#[derive(Deserialize, Serialize, Debug, Clone, Default, JsonSchema)]
pub struct ConfigV1 {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub features: FeaturesConfig,
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub edge: EdgeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

/// The edge server that runs the Session Gate in front of page rendering.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct EdgeConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Base address of the page renderer. Gated requests are forwarded here.
    pub render_upstream: Option<String>,
}

fn default_bind_address() -> String {
    "0.0.0.0:3000".to_string()
}

impl Default for EdgeConfig {
    fn default() -> Self {
        EdgeConfig {
            bind_address: default_bind_address(),
            render_upstream: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Error loading configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("'{key}' must be set when running in production")]
    MissingInProduction { key: &'static str },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigV1 {
    /// Checks the settings that cannot be defaulted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.environment == Environment::Production {
            if non_blank(&self.api.base_url).is_none() {
                return Err(ConfigError::MissingInProduction {
                    key: "api.base_url",
                });
            }
            if non_blank(&self.app.url).is_none() {
                return Err(ConfigError::MissingInProduction { key: "app.url" });
            }
        }
        if self.api.timeout_in_ms == 0 {
            return Err(ConfigError::Invalid(
                "api.timeout_in_ms must be greater than zero".to_string(),
            ));
        }
        for (key, path) in [
            ("gate.login_path", &self.gate.login_path),
            ("gate.landing_path", &self.gate.landing_path),
        ] {
            if !path.starts_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "{} must start with '/', got '{}'",
                    key, path
                )));
            }
        }
        Ok(())
    }
}

/// The YAML file at `path`, overridden by `STOREFRONT_` environment variables
/// (`__` separates nested keys, e.g. `STOREFRONT_API__BASE_URL`).
pub fn figment_for(path: &Path) -> Figment {
    Figment::new()
        .merge(Yaml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

pub fn load_config_from(figment: Figment) -> Result<ConfigV1, ConfigError> {
    let config = figment.extract::<Config>().map_err(Box::new)?;
    let config = match config {
        Config::ConfigV1(c) => c,
    };
    config.validate()?;
    Ok(config)
}

/// Load and validate the config, exiting the process when it is unusable.
pub fn load_config(path: &Path) -> ConfigV1 {
    match load_config_from(figment_for(path)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() {
    let schema = schema_for!(Config);
    match serde_json::to_string_pretty(&schema) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to render schema: {}", e),
    }
}
