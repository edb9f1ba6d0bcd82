//! Configuration for the Job Bank server

use std::path::Path;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use jobbank_domain::Role;
use jobbank_usecase::AccessPolicy;

/// Server configuration (JSON file, camelCase keys, every key optional)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// sqlx connection URL
    pub database_url: String,

    /// Socket address to listen on
    pub listen_addr: String,

    /// Mark cookies `Secure` (HTTPS deployments)
    pub secure_cookies: bool,

    /// Log filter used when `RUST_LOG` is not set
    pub log_filter: String,

    /// Roles allowed to maintain reference data
    pub privileged_roles: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://jobbank.db?mode=rwc".to_string(),
            listen_addr: "127.0.0.1:8080".to_string(),
            secure_cookies: false,
            log_filter: "info".to_string(),
            privileged_roles: Role::privileged()
                .iter()
                .map(|role| role.display_name().to_string())
                .collect(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Load from `path` if given, defaults otherwise
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Apply command-line overrides on top of the file
    pub fn with_overrides(mut self, database_url: Option<String>, listen_addr: Option<String>) -> Self {
        if let Some(url) = database_url {
            self.database_url = url;
        }
        if let Some(addr) = listen_addr {
            self.listen_addr = addr;
        }
        self
    }

    /// Build the access policy; unknown role names are an error
    pub fn access_policy(&self) -> anyhow::Result<AccessPolicy> {
        let mut roles = Vec::with_capacity(self.privileged_roles.len());
        for name in &self.privileged_roles {
            match Role::parse(name) {
                Some(role) => roles.push(role),
                None => bail!("unknown role in privilegedRoles: {name:?}"),
            }
        }
        if roles.is_empty() {
            bail!("privilegedRoles must name at least one role");
        }
        Ok(AccessPolicy::new(roles))
    }
}
