use crate::config::GateConfig;

/// Selects the paths the gate looks at. API routes, build assets and image
/// files pass straight through.
#[derive(Debug, Clone)]
pub struct RouteMatcher {
    excluded_prefixes: Vec<String>,
    asset_extensions: Vec<String>,
}

impl RouteMatcher {
    pub fn new(excluded_prefixes: Vec<String>, asset_extensions: Vec<String>) -> Self {
        RouteMatcher {
            excluded_prefixes,
            asset_extensions,
        }
    }

    pub fn from_config(config: &GateConfig) -> Self {
        Self::new(
            config.excluded_prefixes.clone(),
            config.asset_extensions.clone(),
        )
    }

    pub fn is_gated(&self, path: &str) -> bool {
        let Some(rest) = path.strip_prefix('/') else {
            return false;
        };
        if self
            .excluded_prefixes
            .iter()
            .any(|prefix| rest.starts_with(prefix.as_str()))
        {
            return false;
        }
        !self.is_asset(rest)
    }

    fn is_asset(&self, path: &str) -> bool {
        match path.rsplit_once('.') {
            Some((_, ext)) => self.asset_extensions.iter().any(|e| e == ext),
            None => false,
        }
    }
}
