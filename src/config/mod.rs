//! Configuration system (layered: code > env > config file).

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SiftError};
use crate::tools::search::SafeSearch;

/// Language of the fixed messages returned to the model by the fetch tool.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Locale {
    #[default]
    Ja,
    En,
}

/// Agent behaviour knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// `provider:model` string, see [`crate::models::LanguageModel`].
    pub model: String,
    pub max_iterations: usize,
    /// Exchanges kept in conversation memory.
    pub memory_window: usize,
    pub fetch_timeout_secs: u64,
    /// Characters per fetched page.
    pub page_size: usize,
    pub search_max_results: usize,
    pub search_region: String,
    pub safe_search: SafeSearch,
    /// `None` leaves only the shared client's ceiling
    /// ([`crate::provider::http::DEFAULT_REQUEST_TIMEOUT`], 120 s).
    pub search_timeout_secs: Option<u64>,
    pub locale: Locale,
    pub temperature: Option<f64>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: "openrouter:z-ai/glm-4.5-air:free".to_string(),
            max_iterations: 30,
            memory_window: 10,
            fetch_timeout_secs: 10,
            page_size: 3000,
            search_max_results: 5,
            search_region: "jp-jp".to_string(),
            safe_search: SafeSearch::Off,
            search_timeout_secs: None,
            locale: Locale::Ja,
            temperature: None,
        }
    }
}

impl AgentSettings {
    /// Reject settings the agent cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(SiftError::Configuration(
                "max_iterations must be at least 1".into(),
            ));
        }
        if self.page_size == 0 {
            return Err(SiftError::Configuration(
                "page_size must be at least 1".into(),
            ));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(SiftError::Configuration(
                "fetch_timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// On-disk shape of `config.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    api_keys: HashMap<String, String>,
    base_urls: HashMap<String, String>,
    agent: AgentSettings,
}

const API_KEY_ENV: [(&str, &str); 3] = [
    ("OPENROUTER_API_KEY", "openrouter"),
    ("OPENAI_API_KEY", "openai"),
    ("OPENAI_COMPAT_API_KEY", "openai-compatible"),
];

const BASE_URL_ENV: [(&str, &str); 3] = [
    ("OPENROUTER_BASE_URL", "openrouter"),
    ("OPENAI_BASE_URL", "openai"),
    ("OPENAI_COMPAT_BASE_URL", "openai-compatible"),
];

/// Layered configuration for sift.
///
/// Later layers win: config file, then environment, then explicit setters.
#[derive(Clone)]
pub struct SiftConfig {
    api_keys: Arc<RwLock<HashMap<String, String>>>,
    base_urls: Arc<RwLock<HashMap<String, String>>>,
    settings: AgentSettings,
}

impl fmt::Debug for SiftConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let providers: Vec<String> = self
            .api_keys
            .read()
            .map(|keys| keys.keys().cloned().collect())
            .unwrap_or_default();
        f.debug_struct("SiftConfig")
            .field("api_keys_for", &providers)
            .field("base_urls", &self.base_urls)
            .field("settings", &self.settings)
            .finish()
    }
}

impl Default for SiftConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SiftConfig {
    /// Empty config with default agent settings.
    pub fn new() -> Self {
        Self {
            api_keys: Arc::new(RwLock::new(HashMap::new())),
            base_urls: Arc::new(RwLock::new(HashMap::new())),
            settings: AgentSettings::default(),
        }
    }

    /// Load from environment variables only (`.env` honoured).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let mut config = Self::new();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load the default config file (if present), then the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(&default_config_path())
    }

    /// Load `path` (if present), then the environment.
    pub fn load_from(path: &Path) -> Result<Self> {
        let _ = dotenvy::dotenv();
        let mut config = Self::new();
        config.apply_file(path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Merge a TOML config file. A missing file is not an error.
    pub fn apply_file(&mut self, path: &Path) -> Result<()> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err.into()),
        };
        let file: ConfigFile = toml::from_str(&raw).map_err(|e| {
            SiftError::Configuration(format!("invalid config file {}: {e}", path.display()))
        })?;
        for (provider, key) in file.api_keys {
            self.set_api_key(&provider, key);
        }
        for (provider, url) in file.base_urls {
            self.set_base_url(&provider, url);
        }
        self.settings = file.agent;
        Ok(())
    }

    /// Merge environment values obtained through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        for (env_var, provider) in &API_KEY_ENV {
            if let Some(key) = lookup(env_var).filter(|v| !v.is_empty()) {
                self.set_api_key(provider, key);
            }
        }
        for (env_var, provider) in &BASE_URL_ENV {
            if let Some(url) = lookup(env_var).filter(|v| !v.is_empty()) {
                self.set_base_url(provider, url);
            }
        }

        if let Some(model) = lookup("SIFT_MODEL").filter(|v| !v.is_empty()) {
            self.settings.model = model;
        }
        if let Some(raw) = lookup("SIFT_MAX_ITERATIONS").filter(|v| !v.is_empty()) {
            self.settings.max_iterations = raw.trim().parse().map_err(|_| {
                SiftError::Configuration(format!("SIFT_MAX_ITERATIONS is not a number: {raw}"))
            })?;
        }
        if let Some(raw) = lookup("SIFT_LOCALE").filter(|v| !v.is_empty()) {
            self.settings.locale = raw.trim().parse().map_err(|_| {
                SiftError::Configuration(format!("SIFT_LOCALE must be 'ja' or 'en', got {raw}"))
            })?;
        }
        Ok(())
    }

    pub fn set_api_key(&self, provider: &str, key: String) {
        self.api_keys
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(provider.to_string(), key);
    }

    pub fn get_api_key(&self, provider: &str) -> Option<String> {
        self.api_keys
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(provider)
            .cloned()
    }

    pub fn set_base_url(&self, provider: &str, url: String) {
        self.base_urls
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(provider.to_string(), url);
    }

    pub fn get_base_url(&self, provider: &str) -> Option<String> {
        self.base_urls
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(provider)
            .cloned()
    }

    pub fn has_credentials(&self, provider: &str) -> bool {
        self.get_api_key(provider).is_some()
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut AgentSettings {
        &mut self.settings
    }

    pub fn with_settings(mut self, settings: AgentSettings) -> Self {
        self.settings = settings;
        self
    }
}

/// `~/.sift/config.toml`, or `.sift/config.toml` when no home dir is known.
pub fn default_config_path() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".sift"))
        .unwrap_or_else(|| PathBuf::from(".sift"))
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_the_assistant_profile() {
        let settings = AgentSettings::default();
        assert_eq!(settings.model, "openrouter:z-ai/glm-4.5-air:free");
        assert_eq!(settings.max_iterations, 30);
        assert_eq!(settings.memory_window, 10);
        assert_eq!(settings.fetch_timeout_secs, 10);
        assert_eq!(settings.page_size, 3000);
        assert_eq!(settings.search_max_results, 5);
        assert_eq!(settings.search_region, "jp-jp");
        assert_eq!(settings.safe_search, SafeSearch::Off);
        assert_eq!(settings.search_timeout_secs, None);
        assert_eq!(settings.locale, Locale::Ja);
    }

    #[test]
    fn env_sets_keys_and_overrides() {
        let mut config = SiftConfig::new();
        config
            .apply_env(env(&[
                ("OPENROUTER_API_KEY", "or-key"),
                ("OPENAI_BASE_URL", "http://localhost:9000/v1"),
                ("SIFT_MODEL", "openai:gpt-4o-mini"),
                ("SIFT_MAX_ITERATIONS", "7"),
                ("SIFT_LOCALE", "EN"),
            ]))
            .unwrap();

        assert_eq!(config.get_api_key("openrouter").as_deref(), Some("or-key"));
        assert_eq!(
            config.get_base_url("openai").as_deref(),
            Some("http://localhost:9000/v1")
        );
        assert_eq!(config.settings().model, "openai:gpt-4o-mini");
        assert_eq!(config.settings().max_iterations, 7);
        assert_eq!(config.settings().locale, Locale::En);
    }

    #[test]
    fn empty_env_key_is_ignored() {
        let mut config = SiftConfig::new();
        config.apply_env(env(&[("OPENAI_API_KEY", "")])).unwrap();
        assert!(!config.has_credentials("openai"));
    }

    #[test]
    fn bad_iteration_override_is_a_configuration_error() {
        let mut config = SiftConfig::new();
        let err = config
            .apply_env(env(&[("SIFT_MAX_ITERATIONS", "many")]))
            .unwrap_err();
        assert!(matches!(err, SiftError::Configuration(_)));
    }

    #[test]
    fn file_layer_is_overridden_by_env() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[api_keys]
openrouter = "file-key"

[agent]
model = "openai:gpt-4o"
page_size = 1500
locale = "en"
"#,
        )
        .unwrap();

        let mut config = SiftConfig::new();
        config.apply_file(&path).unwrap();
        assert_eq!(config.get_api_key("openrouter").as_deref(), Some("file-key"));
        assert_eq!(config.settings().page_size, 1500);
        assert_eq!(config.settings().max_iterations, 30);

        config
            .apply_env(env(&[("OPENROUTER_API_KEY", "env-key"), ("SIFT_LOCALE", "ja")]))
            .unwrap();
        assert_eq!(config.get_api_key("openrouter").as_deref(), Some("env-key"));
        assert_eq!(config.settings().locale, Locale::Ja);
        assert_eq!(config.settings().model, "openai:gpt-4o");
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let mut config = SiftConfig::new();
        config.apply_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.settings(), &AgentSettings::default());
    }

    #[test]
    fn malformed_file_is_a_configuration_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[agent\nmodel = ").unwrap();
        let err = SiftConfig::new().apply_file(&path).unwrap_err();
        assert!(matches!(err, SiftError::Configuration(_)));
    }

    #[test]
    fn validate_rejects_zero_iterations() {
        let settings = AgentSettings {
            max_iterations: 0,
            ..AgentSettings::default()
        };
        assert!(settings.validate().is_err());
        assert!(AgentSettings::default().validate().is_ok());
    }

    #[test]
    fn default_path_ends_with_config_toml() {
        assert!(default_config_path().ends_with(".sift/config.toml"));
    }
}
