use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Route lists and locations used by the Session Gate.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct GateConfig {
    /// Name of the HTTP-only cookie whose presence marks a session.
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
    #[serde(default = "default_protected_routes")]
    pub protected_routes: Vec<String>,
    #[serde(default = "default_guest_routes")]
    pub guest_routes: Vec<String>,
    #[serde(default = "default_login_path")]
    pub login_path: String,
    /// Where a signed-in visitor lands when opening a guest-only page.
    #[serde(default = "default_landing_path")]
    pub landing_path: String,
    /// Path prefixes (without the leading slash) the gate never inspects.
    #[serde(default = "default_excluded_prefixes")]
    pub excluded_prefixes: Vec<String>,
    #[serde(default = "default_asset_extensions")]
    pub asset_extensions: Vec<String>,
}

fn default_session_cookie() -> String {
    "refreshToken".to_string()
}

fn default_protected_routes() -> Vec<String> {
    vec!["/account".to_string(), "/admin".to_string()]
}

fn default_guest_routes() -> Vec<String> {
    vec!["/login".to_string(), "/register".to_string()]
}

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_landing_path() -> String {
    "/account".to_string()
}

fn default_excluded_prefixes() -> Vec<String> {
    ["api", "_next/static", "_next/image", "favicon.ico"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_asset_extensions() -> Vec<String> {
    ["svg", "png", "jpg", "jpeg", "gif", "webp"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for GateConfig {
    fn default() -> Self {
        GateConfig {
            session_cookie: default_session_cookie(),
            protected_routes: default_protected_routes(),
            guest_routes: default_guest_routes(),
            login_path: default_login_path(),
            landing_path: default_landing_path(),
            excluded_prefixes: default_excluded_prefixes(),
            asset_extensions: default_asset_extensions(),
        }
    }
}
