use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::auth::Token;

pub const PUBLIC_API_URL: &str = "https://api.travis-ci.org/";
pub const PRIVATE_API_URL: &str = "https://api.travis-ci.com/";

/// One layer of settings, either global (config file) or per view.
///
/// Every field is optional so layers can be stacked: a view-level value
/// wins over the global one, and an absent value falls through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Use the private (travis-ci.com) API instead of the public one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travis_private_projects: Option<bool>,

    /// Travis API token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travis_api_token: Option<String>,

    /// Repository slug override (e.g., 'owner/repo')
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travis_project_repo: Option<String>,

    /// Explicit API base URL, wins over `travis_private_projects`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travis_api_url: Option<String>,
}

/// Settings resolved for a single trigger. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusConfig {
    pub private_projects: bool,
    pub api_token: Option<Token>,
    pub project_repo: Option<String>,
    pub api_url: Option<String>,
}

impl StatusConfig {
    /// Base URL of the API endpoint this trigger talks to.
    pub fn base_url(&self) -> &str {
        match self.api_url.as_deref() {
            Some(url) => url,
            None if self.private_projects => PRIVATE_API_URL,
            None => PUBLIC_API_URL,
        }
    }
}

impl Settings {
    /// Merge a view-level layer over a global layer.
    pub fn resolve(view: &Settings, global: &Settings) -> StatusConfig {
        let api_token = view
            .travis_api_token
            .as_ref()
            .or(global.travis_api_token.as_ref())
            .filter(|token| !token.is_empty())
            .map(|token| Token::from(token.as_str()));

        StatusConfig {
            private_projects: view
                .travis_private_projects
                .or(global.travis_private_projects)
                .unwrap_or(false),
            api_token,
            project_repo: view
                .travis_project_repo
                .clone()
                .or_else(|| global.travis_project_repo.clone()),
            api_url: view
                .travis_api_url
                .clone()
                .or_else(|| global.travis_api_url.clone()),
        }
    }

    /// Load global settings.
    ///
    /// Searches in this order:
    /// 1. Specified path
    /// 2. ./travis-status.{toml,json,yaml,yml}
    /// 3. `<config dir>/travis-status/config.toml`
    ///
    /// Returns empty settings if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let candidates = [
            "travis-status.toml",
            "travis-status.json",
            "travis-status.yaml",
            "travis-status.yml",
        ];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::load_from_path(path);
            }
        }

        if let Some(path) = user_config_path().filter(|path| path.exists()) {
            return Self::load_from_path(&path);
        }

        Ok(Self::default())
    }

    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("travis-status").join("config.toml"))
}
