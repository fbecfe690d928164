//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.codeconsole/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CodeConsoleConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    /// Language tag → interpreter command line. Merged over the defaults.
    #[serde(default)]
    pub interpreters: HashMap<String, Vec<String>>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub always_execute_code: Option<bool>,
    pub run_timeout_secs: Option<u64>,
    pub project_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_RUN_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_LEVEL: &str = "debug";

const DEFAULT_INTERPRETERS: &[(&[&str], &[&str])] = &[
    (&["python", "python3", "py"], &["python3", "-c"]),
    (&["sh", "bash", "shell"], &["sh", "-c"]),
    (&["javascript", "js", "node"], &["node", "-e"]),
];

pub fn default_interpreters() -> HashMap<String, Vec<String>> {
    DEFAULT_INTERPRETERS
        .iter()
        .flat_map(|(tags, argv)| {
            tags.iter().map(move |tag| {
                (
                    tag.to_string(),
                    argv.iter().map(|a| a.to_string()).collect(),
                )
            })
        })
        .collect()
}

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub always_execute_code: bool,
    pub run_timeout_secs: u64,
    pub project_dir: PathBuf,
    pub log_level: String,
    pub interpreters: HashMap<String, Vec<String>>,
}

/// Values given on the command line. `None` means "not specified".
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub always_execute_code: bool,
    pub project_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.codeconsole/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".codeconsole").join("config.toml"))
}

/// Load config from `~/.codeconsole/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `CodeConsoleConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<CodeConsoleConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(CodeConsoleConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(CodeConsoleConfig::default());
    }

    let contents = fs::read_to_string(&path).map_err(ConfigError::Io)?;
    let config: CodeConsoleConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

fn generate_default_config(path: &Path) {
    let default_content = r#"# codeconsole configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# always_execute_code = false     # Or CODECONSOLE_ALWAYS_RUN=1
# run_timeout_secs = 30           # Or CODECONSOLE_RUN_TIMEOUT
# project_dir = "/path/to/dir"    # Or CODECONSOLE_PROJECT_DIR; default: cwd
# log_level = "debug"             # Or CODECONSOLE_LOG_LEVEL

# [interpreters]
# The code is appended as the last argument.
# python = ["python3", "-c"]
# sh = ["sh", "-c"]
# javascript = ["node", "-e"]
# ruby = ["ruby", "-e"]
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &CodeConsoleConfig, cli: &CliOverrides) -> ResolvedConfig {
    resolve_with_env(config, cli, |key| std::env::var(key).ok())
}

fn resolve_with_env(
    config: &CodeConsoleConfig,
    cli: &CliOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    // Always run: CLI flag → env → config → default
    let always_execute_code = cli.always_execute_code
        || env("CODECONSOLE_ALWAYS_RUN")
            .map(|v| parse_flag(&v))
            .or(config.general.always_execute_code)
            .unwrap_or(false);

    // Timeout: env → config → default
    let run_timeout_secs = env("CODECONSOLE_RUN_TIMEOUT")
        .and_then(|v| match v.trim().parse::<u64>() {
            Ok(secs) => Some(secs),
            Err(_) => {
                warn!("Ignoring invalid CODECONSOLE_RUN_TIMEOUT: {v}");
                None
            }
        })
        .or(config.general.run_timeout_secs)
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_RUN_TIMEOUT_SECS);

    // Project directory: CLI → env → config → cwd
    let project_dir = cli
        .project_dir
        .clone()
        .or_else(|| env("CODECONSOLE_PROJECT_DIR").map(PathBuf::from))
        .or_else(|| config.general.project_dir.clone())
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    let log_level = cli
        .log_level
        .clone()
        .or_else(|| env("CODECONSOLE_LOG_LEVEL"))
        .or_else(|| config.general.log_level.clone())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

    // Interpreters: configured entries win over defaults; keys are lowercase.
    let mut interpreters = default_interpreters();
    for (tag, argv) in &config.interpreters {
        if argv.is_empty() {
            warn!("Ignoring empty interpreter command for '{tag}'");
            continue;
        }
        interpreters.insert(tag.to_lowercase(), argv.clone());
    }

    ResolvedConfig {
        always_execute_code,
        run_timeout_secs,
        project_dir,
        log_level,
        interpreters,
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let resolved = resolve_with_env(&CodeConsoleConfig::default(), &CliOverrides::default(), no_env);
        assert!(!resolved.always_execute_code);
        assert_eq!(resolved.run_timeout_secs, DEFAULT_RUN_TIMEOUT_SECS);
        assert_eq!(resolved.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(resolved.interpreters["python"], vec!["python3", "-c"]);
        assert_eq!(resolved.interpreters["bash"], vec!["sh", "-c"]);
        assert_eq!(resolved.interpreters["js"], vec!["node", "-e"]);
    }

    #[test]
    fn test_config_values_override_defaults() {
        let config = CodeConsoleConfig {
            general: GeneralConfig {
                always_execute_code: Some(true),
                run_timeout_secs: Some(5),
                project_dir: Some(PathBuf::from("/srv/demo")),
                log_level: Some("info".to_string()),
            },
            ..Default::default()
        };
        let resolved = resolve_with_env(&config, &CliOverrides::default(), no_env);
        assert!(resolved.always_execute_code);
        assert_eq!(resolved.run_timeout_secs, 5);
        assert_eq!(resolved.project_dir, PathBuf::from("/srv/demo"));
        assert_eq!(resolved.log_level, "info");
    }

    #[test]
    fn test_env_wins_over_config_and_cli_wins_over_env() {
        let config = CodeConsoleConfig {
            general: GeneralConfig {
                project_dir: Some(PathBuf::from("/from/config")),
                run_timeout_secs: Some(5),
                ..Default::default()
            },
            ..Default::default()
        };
        let env = |key: &str| match key {
            "CODECONSOLE_PROJECT_DIR" => Some("/from/env".to_string()),
            "CODECONSOLE_RUN_TIMEOUT" => Some("12".to_string()),
            _ => None,
        };
        let resolved = resolve_with_env(&config, &CliOverrides::default(), env);
        assert_eq!(resolved.project_dir, PathBuf::from("/from/env"));
        assert_eq!(resolved.run_timeout_secs, 12);

        let cli = CliOverrides {
            project_dir: Some(PathBuf::from("/from/cli")),
            ..Default::default()
        };
        let resolved = resolve_with_env(&config, &cli, env);
        assert_eq!(resolved.project_dir, PathBuf::from("/from/cli"));
    }

    #[test]
    fn test_invalid_env_timeout_falls_back() {
        let env = |key: &str| (key == "CODECONSOLE_RUN_TIMEOUT").then(|| "soon".to_string());
        let resolved = resolve_with_env(&CodeConsoleConfig::default(), &CliOverrides::default(), env);
        assert_eq!(resolved.run_timeout_secs, DEFAULT_RUN_TIMEOUT_SECS);
    }

    #[test]
    fn test_always_run_env_flag() {
        let env = |key: &str| (key == "CODECONSOLE_ALWAYS_RUN").then(|| "yes".to_string());
        let resolved = resolve_with_env(&CodeConsoleConfig::default(), &CliOverrides::default(), env);
        assert!(resolved.always_execute_code);
    }

    #[test]
    fn test_toml_interpreters_merge_over_defaults() {
        let toml_str = r#"
[general]
run_timeout_secs = 10

[interpreters]
Ruby = ["ruby", "-e"]
python = ["python3.12", "-c"]
empty = []
"#;
        let config: CodeConsoleConfig = toml::from_str(toml_str).unwrap();
        let resolved = resolve_with_env(&config, &CliOverrides::default(), no_env);
        assert_eq!(resolved.run_timeout_secs, 10);
        assert_eq!(resolved.interpreters["ruby"], vec!["ruby", "-e"]);
        assert_eq!(resolved.interpreters["python"], vec!["python3.12", "-c"]);
        assert!(!resolved.interpreters.contains_key("empty"));
        assert!(resolved.interpreters.contains_key("sh"));
    }

    #[test]
    fn test_sparse_toml_parses() {
        let config: CodeConsoleConfig = toml::from_str("[general]\nlog_level = \"warn\"\n").unwrap();
        assert_eq!(config.general.log_level.as_deref(), Some("warn"));
        assert!(config.general.always_execute_code.is_none());
        assert!(config.interpreters.is_empty());
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let result: Result<CodeConsoleConfig, _> = toml::from_str("[general\n");
        assert!(result.map_err(ConfigError::Parse).is_err());
    }
}
