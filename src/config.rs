use anyhow::{Context, Result};
use globset::Glob;
use serde::Deserialize;
use std::path::Path;

/// Instruction preamble used when the config does not override it.
/// Matches the prompt the assistant payload has always opened with.
pub const DEFAULT_PREAMBLE: &str = "Below are snippets of code from the same project. \
Help the user complete the parts of the project they request based on the existing code. \
Adhere to the same style, structure, and approaches.";

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_ASSISTANT_NAME: &str = "Code Context Assistant";
pub const DEFAULT_THROTTLE_MS: u64 = 2000;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_preamble")]
    pub preamble: String,
    pub assistant: AssistantConfig,
    pub watch: WatchConfig,
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub network: NetworkConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AssistantConfig {
    /// OpenAI assistant id (`asst_...`) whose instructions are rewritten.
    pub id: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_assistant_name")]
    pub name: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WatchConfig {
    /// Ordered list of files, directories, and glob patterns. Order is a
    /// payload contract: snapshot blocks follow target order. Duplicates
    /// are kept as written.
    pub targets: Vec<String>,
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// `mysql://` or `postgres://` connection URL.
    pub url: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct NetworkConfig {
    /// Optional HTTP(S) proxy for all OpenAI traffic.
    pub proxy: Option<String>,
}

fn default_preamble() -> String {
    DEFAULT_PREAMBLE.to_string()
}
fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_assistant_name() -> String {
    DEFAULT_ASSISTANT_NAME.to_string()
}
fn default_api_base() -> String {
    "https://api.openai.com".to_string()
}
fn default_throttle_ms() -> u64 {
    DEFAULT_THROTTLE_MS
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;

    Ok(config)
}

/// Startup validation: every failure here is fatal and the watch loop must
/// never start.
pub fn validate(config: &Config) -> Result<()> {
    if config.assistant.id.trim().is_empty() {
        anyhow::bail!("assistant.id must be set");
    }

    if config.preamble.trim().is_empty() {
        anyhow::bail!("preamble must not be empty");
    }

    if config.watch.targets.is_empty() {
        anyhow::bail!("watch.targets must list at least one file, directory, or glob");
    }

    if config.watch.throttle_ms == 0 {
        anyhow::bail!("watch.throttle_ms must be > 0");
    }

    // Catch malformed glob patterns at startup rather than mid-cycle.
    for target in &config.watch.targets {
        Glob::new(target).with_context(|| format!("Invalid watch target pattern: '{}'", target))?;
    }

    if let Some(db) = &config.database {
        if crate::schema::classify(&db.url).is_none() {
            anyhow::bail!(
                "Invalid database url '{}': supported schemes are mysql:// and postgres://",
                db.url
            );
        }
    }

    Ok(())
}

/// Commented template written by `psync init`.
pub const CONFIG_TEMPLATE: &str = r#"# prompt-sync configuration

# Text prepended to every assembled instruction payload.
# preamble = "Below are snippets of code from the same project. ..."

[assistant]
# Required: the OpenAI assistant to keep in sync.
id = "<required assistant id>"
model = "gpt-4o"
name = "Code Context Assistant"
# api_base = "https://api.openai.com"

[watch]
# Ordered: snapshot blocks follow this order. Files, directories, and globs.
targets = [
    "./src",
    "./docs/**/*.md",
]
throttle_ms = 2000

# [database]
# url = "<optional mysql:// or postgres:// connection url>"

# [network]
# proxy = "<optional proxy url>"
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_toml() -> &'static str {
        r#"
[assistant]
id = "asst_123"

[watch]
targets = ["src"]
"#
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str(minimal_toml()).unwrap();
        assert_eq!(config.assistant.id, "asst_123");
        assert_eq!(config.assistant.model, DEFAULT_MODEL);
        assert_eq!(config.watch.throttle_ms, DEFAULT_THROTTLE_MS);
        assert_eq!(config.preamble, DEFAULT_PREAMBLE);
        assert!(config.database.is_none());
        assert!(config.network.proxy.is_none());
        validate(&config).unwrap();
    }

    #[test]
    fn test_template_parses_after_filling_id() {
        let filled = CONFIG_TEMPLATE.replace("<required assistant id>", "asst_x");
        let config: Config = toml::from_str(&filled).unwrap();
        validate(&config).unwrap();
        assert_eq!(config.watch.targets.len(), 2);
    }

    #[test]
    fn test_rejects_empty_targets() {
        let mut config: Config = toml::from_str(minimal_toml()).unwrap();
        config.watch.targets.clear();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_zero_throttle() {
        let mut config: Config = toml::from_str(minimal_toml()).unwrap();
        config.watch.throttle_ms = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_unsupported_database_scheme() {
        let mut config: Config = toml::from_str(minimal_toml()).unwrap();
        config.database = Some(DatabaseConfig {
            url: "redis://localhost/0".to_string(),
        });
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_bad_glob() {
        let mut config: Config = toml::from_str(minimal_toml()).unwrap();
        config.watch.targets = vec!["src/[broken".to_string()];
        assert!(validate(&config).is_err());
    }
}
