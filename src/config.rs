//! Configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Azure OpenAI configuration
    pub llm: LlmConfig,

    /// Prompt template store configuration
    pub prompts: PromptsConfig,

    /// arXiv query API configuration
    pub arxiv: ArxivConfig,

    /// Log level (overridden by --log-level)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks that required environment variables are set. Call this early
    /// in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        if std::env::var(&self.llm.api_key_env).is_err() {
            return Err(eyre::eyre!(
                "Azure OpenAI API key not found. Set the {} environment variable.",
                self.llm.api_key_env
            ));
        }
        if self.llm.endpoint.is_empty() {
            return Err(eyre::eyre!("Azure OpenAI endpoint is not configured. Set llm.endpoint."));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .arxivchat.yml
        let local_config = PathBuf::from(".arxivchat.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/arxivchat/arxivchat.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("arxivchat").join("arxivchat.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read just the log level from the config file, for use before
    /// logging is set up
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load(config_path).ok().and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Azure OpenAI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Resource endpoint, e.g. https://myresource.openai.azure.com
    pub endpoint: String,

    /// Deployment name
    pub deployment: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API version query parameter
    #[serde(rename = "api-version")]
    pub api_version: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: std::env::var("AZURE_OPENAI_ENDPOINT").unwrap_or_default(),
            deployment: "gpt-4o".to_string(),
            api_key_env: "AZURE_OPENAI_API_KEY".to_string(),
            api_version: "2024-06-01".to_string(),
            max_tokens: 4096,
            timeout_ms: 300_000,
        }
    }
}

/// Prompt template store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// Directory holding the YAML template definitions
    pub dir: PathBuf,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("prompts"),
        }
    }
}

/// arXiv query API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArxivConfig {
    /// Query API endpoint
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for ArxivConfig {
    fn default() -> Self {
        Self {
            base_url: "https://export.arxiv.org/api/query".to_string(),
            timeout_ms: 30_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.llm.api_key_env, "AZURE_OPENAI_API_KEY");
        assert_eq!(config.llm.api_version, "2024-06-01");
        assert_eq!(config.prompts.dir, PathBuf::from("prompts"));
        assert!(config.arxiv.base_url.contains("export.arxiv.org"));
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
llm:
  endpoint: https://myresource.openai.azure.com
  deployment: gpt-4o-mini
  api-key-env: MY_AZURE_KEY
  api-version: 2024-10-21
  max-tokens: 8192
  timeout-ms: 60000

prompts:
  dir: config/prompt

arxiv:
  base-url: https://example.test/api/query
  timeout-ms: 5000
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.llm.endpoint, "https://myresource.openai.azure.com");
        assert_eq!(config.llm.deployment, "gpt-4o-mini");
        assert_eq!(config.llm.api_key_env, "MY_AZURE_KEY");
        assert_eq!(config.llm.max_tokens, 8192);
        assert_eq!(config.prompts.dir, PathBuf::from("config/prompt"));
        assert_eq!(config.arxiv.timeout_ms, 5000);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
llm:
  deployment: gpt-4o-mini
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        // Specified value
        assert_eq!(config.llm.deployment, "gpt-4o-mini");

        // Defaults for unspecified
        assert_eq!(config.llm.api_key_env, "AZURE_OPENAI_API_KEY");
        assert_eq!(config.arxiv.timeout_ms, 30_000);
    }
}
