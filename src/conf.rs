use std::path::Path;

use twelf::config;
use twelf::reexports::serde::{Deserialize, Serialize};

use crate::error::{MigrateError, Result as MigrateResult};

/// Optional endpoints file (YAML). Lets `--source`/`--dest` refer to a named
/// endpoint carrying basic auth and custom CA roots instead of a bare URL.
#[config]
#[derive(Debug, Default)]
pub struct Config {
    endpoints: Vec<Endpoint>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Endpoint {
    #[serde(default)]
    name: String,
    url: String,
    #[serde(default)]
    basic_auth: Option<BasicAuth>,
    #[serde(default)]
    root_certificates: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BasicAuth {
    username: String,
    #[serde(default)]
    password: Option<String>,
}

impl Config {
    pub fn load(path: &Path) -> MigrateResult<Self> {
        Config::with_layers(&[twelf::Layer::Yaml(path.to_path_buf())])
            .map_err(|e| MigrateError::Config(format!("failed to load {path:?}: {e}")))
    }

    pub fn get_endpoints(&self) -> &Vec<Endpoint> {
        &self.endpoints
    }

    /// Resolve a CLI endpoint argument: a configured endpoint name wins,
    /// anything else is treated as a plain URL.
    pub fn resolve_endpoint(&self, name_or_url: &str) -> Endpoint {
        self.endpoints
            .iter()
            .find(|endpoint| endpoint.name == name_or_url)
            .cloned()
            .unwrap_or_else(|| Endpoint::from_url(name_or_url))
    }
}

impl Endpoint {
    pub fn from_url(url: &str) -> Self {
        Self {
            name: String::default(),
            url: url.trim_end_matches('/').to_string(),
            basic_auth: None,
            root_certificates: Vec::new(),
        }
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    pub fn get_root_certificates(&self) -> &Vec<String> {
        &self.root_certificates
    }

    pub fn has_basic_auth(&self) -> bool {
        self.basic_auth.is_some()
    }

    pub fn get_username(&self) -> String {
        self.basic_auth
            .as_ref()
            .map(|auth| auth.username.clone())
            .unwrap_or_default()
    }

    pub fn get_password(&self) -> Option<String> {
        self.basic_auth.as_ref().and_then(|auth| auth.password.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str, url: &str) -> Endpoint {
        Endpoint {
            name: name.to_string(),
            url: url.to_string(),
            basic_auth: Some(BasicAuth {
                username: "elastic".to_string(),
                password: Some("secret".to_string()),
            }),
            root_certificates: Vec::new(),
        }
    }

    #[test]
    fn resolves_configured_endpoint_by_name() {
        let config = Config {
            endpoints: vec![named("prod", "https://es-prod:9200")],
        };
        let endpoint = config.resolve_endpoint("prod");
        assert_eq!(endpoint.get_url(), "https://es-prod:9200");
        assert!(endpoint.has_basic_auth());
    }

    #[test]
    fn falls_back_to_raw_url() {
        let config = Config::default();
        let endpoint = config.resolve_endpoint("http://localhost:9200/");
        assert_eq!(endpoint.get_url(), "http://localhost:9200");
        assert!(!endpoint.has_basic_auth());
    }
}
