//! Configuration management for docpipe.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Config files (.docpipe/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! Later sources win. The configuration is workspace-centric, with prompt
//! version files and the config file stored in `.docpipe/`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

const ENV_PREFIX: &str = "DOCPIPE_";
const ENV_VERSION_SUFFIX: &str = "_PROMPT_VERSION";
const ENV_FALLBACK_SUFFIX: &str = "_PROMPT_FALLBACK";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .docpipe/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Prompt version selection per agent, keyed by agent name
    pub prompts: BTreeMap<String, PromptSelection>,
}

/// Which prompt version an agent should run with.
///
/// An absent `version` means "use the registry default". `fallback` is the
/// version to retry with when the requested one cannot be resolved, which is
/// how a rollback is done without a redeploy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptSelection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    #[serde(default)]
    prompts: BTreeMap<String, PromptSelection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

/// Canonical form of an agent name used as a key in [`AppConfig::prompts`].
///
/// Lowercase with `-` as separator, so `risk_assessor`, `RISK_ASSESSOR` and
/// `risk-assessor` all name the same agent.
pub fn normalize_agent_name(name: &str) -> String {
    name.trim().to_lowercase().replace('_', "-")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            prompts: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the config file, environment variables and defaults.
    ///
    /// Environment variables:
    /// - `DOCPIPE_WORKSPACE`: Override workspace path
    /// - `DOCPIPE_CONFIG`: Path to config file
    /// - `DOCPIPE_<AGENT>_PROMPT_VERSION`: Prompt version for an agent
    /// - `DOCPIPE_<AGENT>_PROMPT_FALLBACK`: Fallback prompt version for an agent
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use docpipe_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with(None, None)
    }

    /// Like [`AppConfig::load`], with an explicit workspace and config file
    /// taking precedence over `DOCPIPE_WORKSPACE` and `DOCPIPE_CONFIG`.
    ///
    /// The config file is looked up in the final workspace, so a workspace
    /// given on the command line brings its own `.docpipe/config.yaml`.
    pub fn load_with(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) =
            workspace.or_else(|| std::env::var("DOCPIPE_WORKSPACE").ok().map(PathBuf::from))
        {
            config.workspace = workspace;
        }

        config.config_file =
            config_file.or_else(|| std::env::var("DOCPIPE_CONFIG").ok().map(PathBuf::from));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.docpipe_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        config.merge_env(std::env::vars());

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(ws) = config_file.workspace {
            if let Some(path) = ws.path {
                result.workspace = PathBuf::from(path);
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        for (agent, selection) in config_file.prompts {
            result.prompts.insert(normalize_agent_name(&agent), selection);
        }

        Ok(result)
    }

    /// Merge per-agent prompt selections from environment variables.
    ///
    /// `DOCPIPE_EXTRACTOR_PROMPT_VERSION=2.0.0` selects version `2.0.0` for
    /// the `extractor` agent. Only the fields present in the environment
    /// replace what the config file said.
    pub fn merge_env<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(rest) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };

            let value = value.trim();
            if value.is_empty() {
                continue;
            }

            if let Some(agent) = rest.strip_suffix(ENV_VERSION_SUFFIX) {
                self.selection_mut(agent).version = Some(value.to_string());
            } else if let Some(agent) = rest.strip_suffix(ENV_FALLBACK_SUFFIX) {
                self.selection_mut(agent).fallback = Some(value.to_string());
            }
        }
    }

    fn selection_mut(&mut self, env_agent: &str) -> &mut PromptSelection {
        let agent = normalize_agent_name(env_agent);
        tracing::debug!("Prompt selection for '{}' set from environment", agent);
        self.prompts.entry(agent).or_default()
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// This method merges command-line flags with the loaded configuration,
    /// giving precedence to CLI flags over environment variables.
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .docpipe directory.
    pub fn docpipe_dir(&self) -> PathBuf {
        self.workspace.join(".docpipe")
    }

    /// Get the directory holding prompt version files.
    pub fn prompts_dir(&self) -> PathBuf {
        self.docpipe_dir().join("prompts")
    }

    /// Prompt selection for an agent; the default selection when none is configured.
    pub fn prompt_selection(&self, agent_name: &str) -> PromptSelection {
        self.prompts
            .get(&normalize_agent_name(agent_name))
            .cloned()
            .unwrap_or_default()
    }

    /// Validate the loaded configuration.
    ///
    /// Version strings themselves are checked when they are resolved
    /// against the registry.
    pub fn validate(&self) -> AppResult<()> {
        for (agent, selection) in &self.prompts {
            if agent.is_empty() {
                return Err(AppError::Config(
                    "Prompt selection has an empty agent name".to_string(),
                ));
            }

            if selection.version.is_none() && selection.fallback.is_some() {
                return Err(AppError::Config(format!(
                    "Agent '{}' has a fallback prompt version but no requested version",
                    agent
                )));
            }
        }

        Ok(())
    }
}
