//! Configuration handling for the console

use crate::state::EntityKind;
use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Registry API address used when nothing is configured
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User configuration for the console
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ConsoleConfig {
    /// Base URL of the registry API
    pub api_url: Option<String>,
    /// Bearer token sent with every request
    pub api_token: Option<String>,
    /// Per-request timeout in seconds
    pub request_timeout_secs: Option<u64>,
    /// Agent whose registration requests are listed
    pub agent_id: Option<String>,
    /// Collection path overrides, keyed by collection name (`parcels`, ...)
    #[serde(default)]
    pub routes: BTreeMap<String, String>,
}

impl ConsoleConfig {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("sn", "cadastre", "cadastre-console")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from file, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => {
                let content = fs::read_to_string(&path)?;
                serde_json::from_str(&content)?
            }
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Write a default config file when none exists yet
    pub fn init_file() -> Result<()> {
        match Self::config_path() {
            Some(path) if !path.exists() => Self::default().save(),
            _ => Ok(()),
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(path) = Self::config_path() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let content = serde_json::to_string_pretty(self)?;
            fs::write(&path, content)?;
        }
        Ok(())
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("CADASTRE_API_URL").filter(|v| !v.is_empty()) {
            self.api_url = Some(url);
        }
        if let Some(token) = lookup("CADASTRE_API_TOKEN").filter(|v| !v.is_empty()) {
            self.api_token = Some(token);
        }
        if let Some(agent) = lookup("CADASTRE_AGENT_ID").filter(|v| !v.is_empty()) {
            self.agent_id = Some(agent);
        }
    }

    pub fn api_url(&self) -> &str {
        self.api_url
            .as_deref()
            .unwrap_or(DEFAULT_API_URL)
            .trim_end_matches('/')
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Collection path for an entity, e.g. `/api/parcels`
    pub fn route(&self, kind: EntityKind) -> String {
        if let Some(route) = self.routes.get(kind.collection()) {
            return route.clone();
        }
        match kind {
            EntityKind::User => "/users".to_string(),
            _ => format!("/api/{}", kind.collection()),
        }
    }

    /// Path the list screen loads; requests are scoped to the session's agent
    pub fn list_route(&self, kind: EntityKind, session: &Session) -> String {
        match (kind, &session.agent_id) {
            (EntityKind::Request, Some(agent)) => format!("/requests/by-agent/{agent}"),
            _ => self.route(kind),
        }
    }

    pub fn session(&self) -> Session {
        Session {
            token: self.api_token.clone().filter(|t| !t.is_empty()),
            agent_id: self.agent_id.clone().filter(|a| !a.is_empty()),
        }
    }
}

/// Credentials for the current operator, passed explicitly to the API client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub agent_id: Option<String>,
}
