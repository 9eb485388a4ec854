//! CLI configuration loading.
//!
//! Discovery order: an explicit `--config` path, then `./viva.toml`, then
//! `<config dir>/viva/config.toml`. Credentials resolve per agent kind:
//! the `[credentials]` entry for the kind first, then the shared
//! `[model].api_key`, then the `GEMINI_API_KEY` environment variable.
//! The environment is only consulted here; agents and model clients get
//! their credentials injected.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use viva_scoring::TaskDefinitionStore;

/// Scoring agent kinds, used to pick the matching credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentKind {
    Analytic,
    Holistic,
    OffTopic,
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Analytic => write!(f, "analytic"),
            Self::Holistic => write!(f, "holistic"),
            Self::OffTopic => write!(f, "off-topic"),
        }
    }
}

/// Top-level configuration file contents.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VivaConfig {
    pub model: ModelSection,
    pub credentials: CredentialSection,
    /// `[task_definitions.<session>]` tables, `t1 = "..."` entries.
    pub task_definitions: TaskDefinitionStore,
}

/// `[model]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelSection {
    /// Model provider ("gemini" or "mock").
    pub provider: String,
    /// Model identifier sent to the provider.
    pub model_id: String,
    /// Shared API key used when no per-kind credential is set.
    pub api_key: Option<String>,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model_id: "gemini-1.5-flash".to_string(),
            api_key: None,
        }
    }
}

/// `[credentials]` section: one optional key per agent kind.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CredentialSection {
    pub analytic: Option<String>,
    pub holistic: Option<String>,
    pub off_topic: Option<String>,
}

impl VivaConfig {
    /// Resolves the credential for one agent kind.
    #[must_use]
    pub fn credential_for(&self, kind: AgentKind) -> Option<String> {
        let per_kind = match kind {
            AgentKind::Analytic => self.credentials.analytic.as_ref(),
            AgentKind::Holistic => self.credentials.holistic.as_ref(),
            AgentKind::OffTopic => self.credentials.off_topic.as_ref(),
        };
        per_kind
            .or(self.model.api_key.as_ref())
            .cloned()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
    }
}

/// Loads the configuration from the explicit path or the discovery chain.
pub fn load(explicit: Option<&Path>) -> anyhow::Result<VivaConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => discover().ok_or_else(|| {
            anyhow::anyhow!("No configuration file found; create ./viva.toml or pass --config")
        })?,
    };

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: VivaConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(config)
}

fn discover() -> Option<PathBuf> {
    let local = PathBuf::from("viva.toml");
    if local.is_file() {
        return Some(local);
    }
    let global = dirs::config_dir()?.join("viva").join("config.toml");
    global.is_file().then_some(global)
}
