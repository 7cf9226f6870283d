//! Settings shared by the editor and the `codesmith` CLI

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Environment variable that supplies the API key when none is stored
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Environment variable that overrides the search endpoint
pub const SEARCH_URL_ENV: &str = "YACY_SEARCH_URL";

const MAX_RECENT_FILES: usize = 10;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Recently opened files, most recent first
    pub recent_files: Vec<PathBuf>,
    /// Editor settings
    pub editor: EditorConfig,
    /// CodeSmith agent settings
    pub agent: AgentConfig,
    /// Extension settings
    pub extensions: ExtensionConfig,
}

/// Editor-specific settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Font size in pixels
    pub font_size: f32,
    /// Word wrap
    pub word_wrap: bool,
}

/// Settings for the CodeSmith agent and the services it calls
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Chat-completion API key
    pub api_key: Option<String>,
    /// Model name sent with every request
    pub model: String,
    /// Chat-completion endpoint
    pub chat_url: String,
    /// YaCy JSON search endpoint
    pub search_url: String,
    /// Number of search hits passed to the model
    pub max_search_results: usize,
    /// Whether CodeSmith may suggest and run shell commands
    pub allow_terminal_commands: bool,
    /// File extensions collected for repository questions
    pub source_extensions: Vec<String>,
}

/// Extension settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionConfig {
    /// Extension directory (defaults to the data directory)
    pub dir: Option<PathBuf>,
    /// Extension ids that are never loaded
    pub disabled: Vec<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            font_size: 14.0,
            word_wrap: false,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            chat_url: "https://api.openai.com/v1/chat/completions".to_string(),
            search_url: "http://localhost:8090/yacysearch.json".to_string(),
            max_search_results: 5,
            allow_terminal_commands: false,
            source_extensions: vec!["py".to_string(), "rs".to_string()],
        }
    }
}

impl AgentConfig {
    /// Resolve the API key: a stored key wins over the environment
    pub fn resolve_api_key(&self, env: impl Fn(&str) -> Option<String>) -> Option<String> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .or_else(|| {
                env(API_KEY_ENV)
                    .map(|key| key.trim().to_string())
                    .filter(|key| !key.is_empty())
            })
    }

    /// Resolve the search endpoint: the environment overrides the stored URL
    pub fn resolve_search_url(&self, env: impl Fn(&str) -> Option<String>) -> String {
        env(SEARCH_URL_ENV)
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| self.search_url.clone())
    }

    /// Store a new API key; blank input clears it
    pub fn set_api_key(&mut self, key: &str) {
        let key = key.trim();
        self.api_key = if key.is_empty() {
            None
        } else {
            Some(key.to_string())
        };
    }
}

/// Reads a variable from the process environment
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

impl AppConfig {
    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("com", "novaatom", "NovaAtom")
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from the platform config directory
    pub fn load() -> Result<Self> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Self::load_from(&path)
    }

    /// Load configuration from an explicit path; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Malformed config: {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to the platform config directory
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        self.save_to(&path)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;

        tracing::info!("Saved config to: {}", path.display());
        Ok(())
    }

    /// Add a file to the recent files list
    pub fn add_recent_file(&mut self, path: PathBuf) {
        self.recent_files.retain(|p| p != &path);
        self.recent_files.insert(0, path);
        self.recent_files.truncate(MAX_RECENT_FILES);
    }

    /// Get the extension directory
    pub fn extension_dir(&self) -> PathBuf {
        self.extensions.dir.clone().unwrap_or_else(|| {
            Self::project_dirs()
                .map(|dirs| dirs.data_dir().join("extensions"))
                .unwrap_or_else(|| PathBuf::from("extensions"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.agent.model, "gpt-4o-mini");
        assert_eq!(config.agent.max_search_results, 5);
        assert!(!config.agent.allow_terminal_commands);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = AppConfig::default();
        config.agent.set_api_key("  sk-test  ");
        config.agent.allow_terminal_commands = true;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.agent.api_key.as_deref(), Some("sk-test"));
        assert!(loaded.agent.allow_terminal_commands);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"agent": {"model": "gpt-4o"}}"#).unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.agent.model, "gpt-4o");
        assert_eq!(config.agent.max_search_results, 5);
        assert_eq!(config.editor.font_size, 14.0);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_recent_files_dedup_and_cap() {
        let mut config = AppConfig::default();
        for i in 0..12 {
            config.add_recent_file(PathBuf::from(format!("file{}.py", i)));
        }
        config.add_recent_file(PathBuf::from("file5.py"));

        assert_eq!(config.recent_files.len(), MAX_RECENT_FILES);
        assert_eq!(config.recent_files[0], PathBuf::from("file5.py"));
        assert_eq!(
            config
                .recent_files
                .iter()
                .filter(|p| p.as_path() == Path::new("file5.py"))
                .count(),
            1
        );
    }

    #[test]
    fn test_api_key_resolution() {
        let mut agent = AgentConfig::default();
        assert_eq!(agent.resolve_api_key(no_env), None);

        let env = |name: &str| (name == API_KEY_ENV).then(|| "sk-env".to_string());
        assert_eq!(agent.resolve_api_key(env).as_deref(), Some("sk-env"));

        agent.set_api_key("sk-stored");
        assert_eq!(agent.resolve_api_key(env).as_deref(), Some("sk-stored"));

        agent.set_api_key("   ");
        assert_eq!(agent.api_key, None);
    }

    #[test]
    fn test_search_url_env_override() {
        let agent = AgentConfig::default();
        assert_eq!(agent.resolve_search_url(no_env), agent.search_url);

        let env = |name: &str| (name == SEARCH_URL_ENV).then(|| "http://yacy:8090/s.json".to_string());
        assert_eq!(agent.resolve_search_url(env), "http://yacy:8090/s.json");
    }
}
