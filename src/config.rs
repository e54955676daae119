//! 配置：YAML 配置文件 + 环境变量覆盖 + 凭据解析（配置值、系统钥匙串、环境变量）。
//!
//! Suite configuration.
//!
//! [`SuiteConfig::load`] reads the YAML file named by `PEN2PDF_CONFIG`
//! (default `pen2pdf.yaml`); a missing file yields the built-in defaults.
//! Environment overrides are applied last:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `PEN2PDF_HTTP_TIMEOUT_SECS` | `http.timeout_secs` |
//! | `PEN2PDF_PROXY_URL` | `http.proxy_url` |
//! | `PEN2PDF_PORT` (or `PORT`) | `server.port` |
//!
//! ```yaml
//! providers:
//!   gemini:
//!     history_mode: structured
//! tasks:
//!   chat:
//!     candidates: [gemini-2.5-flash, longcat/LongCat-Flash-Chat]
//! fallback:
//!   max_retryable_failures: 3
//! ```

use crate::catalog::{
    Backend, ModelCatalog, DEFAULT_CHAT_CANDIDATES, DEFAULT_GEMINI_MODELS, DEFAULT_GITHUB_MODELS,
    DEFAULT_LONGCAT_MODELS, DEFAULT_NOTES_CANDIDATES, DEFAULT_TEXT_EXTRACTION_CANDIDATES,
};
use crate::fallback::FallbackPolicy;
use crate::request::{HistoryMode, SystemInstructions};
use crate::types::Task;
use crate::{Error, ErrorContext, Result};
use keyring::Entry;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::path::Path;
use tracing::debug;

pub const CONFIG_PATH_ENV: &str = "PEN2PDF_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "pen2pdf.yaml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    pub server: ServerConfig,
    pub http: HttpConfig,
    pub credentials: CredentialsConfig,
    pub providers: ProvidersConfig,
    pub tasks: TasksConfig,
    pub fallback: FallbackConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub body_limit_bytes: usize,
    /// Query each configured backend for its model list at startup.
    pub discover_models: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            body_limit_bytes: 50 * 1024 * 1024,
            discover_models: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub proxy_url: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            connect_timeout_secs: 10,
            proxy_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Look credentials up in the OS keyring after explicit config values.
    pub keyring: bool,
    pub keyring_service: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            keyring: true,
            keyring_service: "pen2pdf".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub gemini: ProviderConfig,
    pub github_models: ProviderConfig,
    pub longcat: ProviderConfig,
}

impl ProvidersConfig {
    pub fn get(&self, backend: Backend) -> &ProviderConfig {
        match backend {
            Backend::Gemini => &self.gemini,
            Backend::GithubModels => &self.github_models,
            Backend::Longcat => &self.longcat,
        }
    }
}

/// Per-backend settings. Unset fields fall back to the backend's defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub api_key_env: Option<Vec<String>>,
    pub history_mode: Option<HistoryMode>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    /// Replaces the built-in model list for this backend.
    pub models: Option<Vec<String>>,
}

impl ProviderConfig {
    pub fn api_key_env_names(&self, backend: Backend) -> Vec<String> {
        if let Some(names) = &self.api_key_env {
            return names.clone();
        }
        let defaults: &[&str] = match backend {
            Backend::Gemini => &["geminiApiKey", "GEMINI_API_KEY", "GEMINI_APIKEY"],
            Backend::GithubModels => &["githubModelsPAT", "GITHUB_MODELS_PAT"],
            Backend::Longcat => &["longcatApiKey", "LONGCAT_API_KEY"],
        };
        defaults.iter().map(|s| s.to_string()).collect()
    }

    pub fn history_mode(&self, backend: Backend) -> HistoryMode {
        self.history_mode.unwrap_or(match backend {
            Backend::GithubModels => HistoryMode::Structured,
            Backend::Gemini | Backend::Longcat => HistoryMode::Flattened,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    #[serde(default)]
    pub candidates: Vec<String>,
    #[serde(default)]
    pub system_instruction: Option<String>,
}

impl TaskConfig {
    fn with_candidates(ids: &[&str]) -> Self {
        Self {
            candidates: ids.iter().map(|s| s.to_string()).collect(),
            system_instruction: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TasksConfig {
    pub text_extraction: TaskConfig,
    pub notes_generation: TaskConfig,
    pub chat: TaskConfig,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            text_extraction: TaskConfig::with_candidates(DEFAULT_TEXT_EXTRACTION_CANDIDATES),
            notes_generation: TaskConfig::with_candidates(DEFAULT_NOTES_CANDIDATES),
            chat: TaskConfig::with_candidates(DEFAULT_CHAT_CANDIDATES),
        }
    }
}

impl TasksConfig {
    pub fn get(&self, task: Task) -> &TaskConfig {
        match task {
            Task::TextExtraction => &self.text_extraction,
            Task::NotesGeneration => &self.notes_generation,
            Task::Chat => &self.chat,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    pub max_retryable_failures: Option<usize>,
}

impl SuiteConfig {
    /// Load from `PEN2PDF_CONFIG` (or `pen2pdf.yaml`), then apply env overrides.
    pub fn load() -> Result<Self> {
        let path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let explicit = env::var(CONFIG_PATH_ENV).is_ok();
        let mut config = if Path::new(&path).exists() {
            Self::from_path(&path)?
        } else if explicit {
            return Err(Error::configuration_with_context(
                format!("config file {} does not exist", path),
                ErrorContext::new()
                    .with_field_path(CONFIG_PATH_ENV)
                    .with_source("config_loader"),
            ));
        } else {
            debug!(path = %path, "no config file, using defaults");
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text).map_err(|e| match e {
            Error::Configuration { message, context } => Error::Configuration {
                message,
                context: context.with_details(path.display().to_string()),
            },
            other => other,
        })
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(text).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid YAML configuration: {}", e),
                ErrorContext::new().with_source("config_loader"),
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for task in Task::ALL {
            let candidates = &self.tasks.get(task).candidates;
            let field = format!("tasks.{}.candidates", task.as_str().replace('-', "_"));
            if candidates.is_empty() {
                return Err(Error::configuration_with_context(
                    format!("task {} has no candidate models", task),
                    ErrorContext::new()
                        .with_field_path(field)
                        .with_source("config_loader"),
                ));
            }
            let mut seen = HashSet::new();
            if let Some(dup) = candidates.iter().find(|c| !seen.insert(c.trim())) {
                return Err(Error::configuration_with_context(
                    format!("task {} lists a candidate model twice", task),
                    ErrorContext::new()
                        .with_field_path(field)
                        .with_details(dup.clone())
                        .with_source("config_loader"),
                ));
            }
        }
        Ok(())
    }

    pub fn apply_env_overrides(&mut self) {
        if let Some(secs) = env::var("PEN2PDF_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            self.http.timeout_secs = secs;
        }
        if let Ok(proxy) = env::var("PEN2PDF_PROXY_URL") {
            if !proxy.trim().is_empty() {
                self.http.proxy_url = Some(proxy);
            }
        }
        if let Some(port) = env::var("PEN2PDF_PORT")
            .or_else(|_| env::var("PORT"))
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }
    }

    /// Explicit config value, then OS keyring, then environment variables.
    pub fn resolve_api_key(&self, backend: Backend) -> Option<String> {
        let provider = self.providers.get(backend);
        if let Some(key) = provider.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Some(key.clone());
        }

        if self.credentials.keyring {
            let from_keyring = Entry::new(&self.credentials.keyring_service, backend.as_str())
                .ok()
                .and_then(|entry| entry.get_password().ok())
                .filter(|k| !k.trim().is_empty());
            if from_keyring.is_some() {
                debug!(backend = backend.as_str(), "credential resolved from keyring");
                return from_keyring;
            }
        }

        provider
            .api_key_env_names(backend)
            .iter()
            .find_map(|name| env::var(name).ok().filter(|v| !v.trim().is_empty()))
    }

    pub fn catalog(&self) -> ModelCatalog {
        let models = |backend: Backend, defaults: &[&str]| {
            self.providers
                .get(backend)
                .models
                .clone()
                .unwrap_or_else(|| defaults.iter().map(|s| s.to_string()).collect())
        };
        let mut catalog = ModelCatalog::new()
            .with_models(Backend::Gemini, models(Backend::Gemini, DEFAULT_GEMINI_MODELS))
            .with_models(
                Backend::GithubModels,
                models(Backend::GithubModels, DEFAULT_GITHUB_MODELS),
            )
            .with_models(Backend::Longcat, models(Backend::Longcat, DEFAULT_LONGCAT_MODELS));
        for task in Task::ALL {
            catalog = catalog.with_task(task, self.tasks.get(task).candidates.clone());
        }
        catalog
    }

    pub fn instructions(&self) -> SystemInstructions {
        Task::ALL
            .iter()
            .fold(SystemInstructions::default(), |acc, task| {
                match &self.tasks.get(*task).system_instruction {
                    Some(text) => acc.with_override(*task, text.clone()),
                    None => acc,
                }
            })
    }

    pub fn fallback_policy(&self) -> FallbackPolicy {
        FallbackPolicy {
            max_retryable_failures: self.fallback.max_retryable_failures,
        }
    }
}
