use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_APP_URL: &str = "http://localhost:3000";
pub const DEFAULT_APP_NAME: &str = "Sport Shop";

/// Where the backend lives and how long a single call may take.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ApiConfig {
    /// Required in production. Falls back to a local backend otherwise.
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_in_ms")]
    pub timeout_in_ms: u64,
}

fn default_timeout_in_ms() -> u64 {
    30_000
}

impl ApiConfig {
    pub fn resolved_base_url(&self) -> &str {
        non_blank(&self.base_url).unwrap_or(DEFAULT_API_BASE_URL)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: None,
            timeout_in_ms: default_timeout_in_ms(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub name: String,
    /// Public site address. Required in production.
    pub url: Option<String>,
}

fn default_app_name() -> String {
    DEFAULT_APP_NAME.to_string()
}

impl AppConfig {
    pub fn resolved_url(&self) -> &str {
        non_blank(&self.url).unwrap_or(DEFAULT_APP_URL)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            name: default_app_name(),
            url: None,
        }
    }
}

/// Feature toggles. Everything is on unless switched off.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct FeaturesConfig {
    /// Read by the page renderer only: the session core has no cart calls.
    #[serde(default = "enabled")]
    pub enable_cart: bool,
    #[serde(default = "enabled")]
    pub enable_checkout: bool,
    #[serde(default = "enabled")]
    pub enable_search: bool,
}

fn enabled() -> bool {
    true
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        FeaturesConfig {
            enable_cart: true,
            enable_checkout: true,
            enable_search: true,
        }
    }
}

pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
