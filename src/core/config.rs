//! Configuration management for the gateway server.
//!
//! This module provides a centralized configuration structure populated
//! from environment variables (dotenv-aware), organized by domain.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::transport::HttpConfig;

/// Main configuration structure for the gateway server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// HTTP transport configuration.
    pub transport: HttpConfig,

    /// Backend API credentials and base URLs.
    pub credentials: CredentialsConfig,

    /// Memory store configuration.
    pub memory: MemoryConfig,

    /// Browser automation configuration.
    pub browser: BrowserConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

/// Backend API credentials and endpoints.
#[derive(Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// GitHub REST API base URL.
    pub github_api_url: String,

    /// GitHub personal access token.
    pub github_token: Option<String>,

    /// GitLab REST API base URL.
    pub gitlab_api_url: String,

    /// GitLab private token.
    pub gitlab_token: Option<String>,

    /// Google Maps Platform API key.
    pub gmaps_api_key: Option<String>,
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("github_api_url", &self.github_api_url)
            .field("github_token", &self.github_token.as_ref().map(|_| "[REDACTED]"))
            .field("gitlab_api_url", &self.gitlab_api_url)
            .field("gitlab_token", &self.gitlab_token.as_ref().map(|_| "[REDACTED]"))
            .field("gmaps_api_key", &self.gmaps_api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Memory store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Path of the SQLite database file.
    pub db_path: PathBuf,
}

/// Browser automation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Whether the browser runs headless.
    pub headless: bool,

    /// Explicit Chrome/Chromium executable path, when the bundled one is
    /// not used.
    pub chrome_path: Option<String>,

    /// Directory the embedded automation scripts are installed into.
    pub script_dir: PathBuf,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            github_api_url: "https://api.github.com".to_string(),
            github_token: None,
            gitlab_api_url: "https://gitlab.com/api/v4".to_string(),
            gitlab_token: None,
            gmaps_api_key: None,
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("memory.db"),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_path: None,
            script_dir: PathBuf::from("node_scripts"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "mcp-gateway".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            transport: HttpConfig::default(),
            credentials: CredentialsConfig::default(),
            memory: MemoryConfig::default(),
            browser: BrowserConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        config.transport = HttpConfig::from_env();

        if let Ok(url) = std::env::var("GITHUB_API_URL") {
            config.credentials.github_api_url = url;
        }
        match std::env::var("GITHUB_TOKEN") {
            Ok(token) => config.credentials.github_token = Some(token),
            Err(_) => warn!("GITHUB_TOKEN not set - GitHub requests will be unauthenticated"),
        }

        if let Ok(url) = std::env::var("GITLAB_API_URL") {
            config.credentials.gitlab_api_url = url;
        }
        match std::env::var("GITLAB_TOKEN") {
            Ok(token) => config.credentials.gitlab_token = Some(token),
            Err(_) => warn!("GITLAB_TOKEN not set - GitLab requests will be unauthenticated"),
        }

        match std::env::var("GMAPS_API_KEY") {
            Ok(key) => config.credentials.gmaps_api_key = Some(key),
            Err(_) => warn!("GMAPS_API_KEY not set - Google Maps requests will be rejected upstream"),
        }

        if let Ok(path) = std::env::var("MEMORY_DB_PATH") {
            config.memory.db_path = PathBuf::from(path);
        }
        info!("Memory store path: {}", config.memory.db_path.display());

        if let Ok(headless) = std::env::var("PUPPETEER_HEADLESS") {
            config.browser.headless =
                matches!(headless.to_lowercase().as_str(), "true" | "1" | "t");
        }
        if let Ok(path) = std::env::var("CHROME_PATH") {
            config.browser.chrome_path = Some(path);
        }
        if let Ok(dir) = std::env::var("BROWSER_SCRIPT_DIR") {
            config.browser.script_dir = PathBuf::from(dir);
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests run serially
    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_credentials_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("GITHUB_TOKEN", "test_token_12345");
        }
        let config = Config::from_env();
        assert_eq!(
            config.credentials.github_token.as_deref(),
            Some("test_token_12345")
        );
        unsafe {
            std::env::remove_var("GITHUB_TOKEN");
        }
    }

    #[test]
    fn test_default_api_urls() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::remove_var("GITHUB_API_URL");
            std::env::remove_var("GITLAB_API_URL");
        }
        let config = Config::from_env();
        assert_eq!(config.credentials.github_api_url, "https://api.github.com");
        assert_eq!(config.credentials.gitlab_api_url, "https://gitlab.com/api/v4");
    }

    #[test]
    fn test_credentials_redacted_in_debug() {
        let creds = CredentialsConfig {
            github_token: Some("super_secret_token".to_string()),
            gitlab_token: Some("another_secret".to_string()),
            gmaps_api_key: Some("key_secret".to_string()),
            ..CredentialsConfig::default()
        };
        let debug_str = format!("{:?}", creds);
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("super_secret_token"));
        assert!(!debug_str.contains("another_secret"));
        assert!(!debug_str.contains("key_secret"));
    }

    #[test]
    fn test_puppeteer_headless_parsing() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("PUPPETEER_HEADLESS", "false");
        }
        let config = Config::from_env();
        assert!(!config.browser.headless);
        unsafe {
            std::env::remove_var("PUPPETEER_HEADLESS");
        }
    }
}
