//! Prompt command handler.
//!
//! Inspects the prompt versions stored in the workspace and runs version
//! resolution the same way the pipeline does at request time.

use clap::{Args, Subcommand};
use docpipe_core::{config::AppConfig, AppResult, PromptSelection};
use docpipe_prompt::{load_registry, PromptRegistry, PromptVersion, VersionSelector};
use std::sync::Arc;

const DEFAULT_AGENT: &str = "extractor";

/// Prompt version inspection and resolution
#[derive(Args, Debug)]
pub struct PromptCommand {
    #[command(subcommand)]
    pub action: PromptAction,
}

#[derive(Subcommand, Debug)]
pub enum PromptAction {
    /// List registered versions
    List(PromptListCommand),
    /// Show one version (the default when none is given)
    Show(PromptShowCommand),
    /// Resolve the version an agent would run with
    Resolve(PromptResolveCommand),
    /// Show the changelog of an agent
    Changelog(PromptChangelogCommand),
}

/// List registered versions
#[derive(Args, Debug)]
pub struct PromptListCommand {
    /// Only list this agent
    #[arg(short, long)]
    pub agent: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl PromptListCommand {
    pub fn execute(&self, registry: &PromptRegistry) -> AppResult<()> {
        tracing::info!("Executing prompt list command");

        let agents = match self.agent {
            Some(ref agent) => vec![agent.clone()],
            None => registry.agents()?,
        };

        let mut listing = serde_json::Map::new();
        for agent in &agents {
            let versions = registry.list(agent)?;

            if self.json {
                let ids: Vec<String> = versions
                    .iter()
                    .map(|v| v.version_id().to_string())
                    .collect();
                listing.insert(agent.clone(), serde_json::json!(ids));
                continue;
            }

            println!("{}:", agent);
            if versions.is_empty() {
                println!("  (no versions)");
            }
            for version in &versions {
                println!(
                    "  {}  ~{} tokens  {}",
                    version.version_id(),
                    version.estimated_token_count(),
                    version.created_at().format("%Y-%m-%d")
                );
            }
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }

        Ok(())
    }
}

/// Show one version
#[derive(Args, Debug)]
pub struct PromptShowCommand {
    /// Agent name
    #[arg(short, long, default_value = DEFAULT_AGENT)]
    pub agent: String,

    /// Version to show (default: highest registered)
    #[arg(long)]
    pub version: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl PromptShowCommand {
    pub fn execute(&self, registry: &PromptRegistry) -> AppResult<()> {
        tracing::info!("Executing prompt show command for agent: {}", self.agent);

        let version = match self.version {
            Some(ref id) => registry.get(&self.agent, id)?,
            None => registry.get_default(&self.agent)?,
        };

        print_version(&version, self.json)
    }
}

/// Resolve the version an agent would run with
#[derive(Args, Debug)]
pub struct PromptResolveCommand {
    /// Agent name
    #[arg(short, long, default_value = DEFAULT_AGENT)]
    pub agent: String,

    /// Requested version (default: configured selection, then registry default)
    #[arg(long)]
    pub version: Option<String>,

    /// Version to retry with if the requested one cannot be resolved
    #[arg(short, long)]
    pub fallback: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl PromptResolveCommand {
    pub fn execute(&self, config: &AppConfig, registry: Arc<PromptRegistry>) -> AppResult<()> {
        tracing::info!("Executing prompt resolve command for agent: {}", self.agent);

        let selection = self.selection(config);
        tracing::debug!("Prompt selection: {:?}", selection);

        let selector = VersionSelector::new(registry);
        let version = selector.resolve_configured(&self.agent, &selection)?;

        if self.json {
            let output = serde_json::json!({
                "agentName": self.agent,
                "requested": selection.version,
                "fallback": selection.fallback,
                "resolved": version.version_id().to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{} {}", self.agent, version.version_id());
        }

        Ok(())
    }

    /// Flags win over configuration, field by field.
    fn selection(&self, config: &AppConfig) -> PromptSelection {
        let configured = config.prompt_selection(&self.agent);
        PromptSelection {
            version: self.version.clone().or(configured.version),
            fallback: self.fallback.clone().or(configured.fallback),
        }
    }
}

/// Show the changelog of an agent
#[derive(Args, Debug)]
pub struct PromptChangelogCommand {
    /// Agent name
    #[arg(short, long, default_value = DEFAULT_AGENT)]
    pub agent: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl PromptChangelogCommand {
    pub fn execute(&self, registry: &PromptRegistry) -> AppResult<()> {
        tracing::info!("Executing prompt changelog command for agent: {}", self.agent);

        let entries = registry.changelog(&self.agent)?;

        if self.json {
            let output: Vec<serde_json::Value> = entries
                .iter()
                .map(|(version, entry)| {
                    serde_json::json!({ "version": version.to_string(), "changelog": entry })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        for (version, entry) in entries {
            println!("## {}", version);
            if entry.is_empty() {
                println!("(no changelog entry)");
            } else {
                println!("{}", entry);
            }
            println!();
        }

        Ok(())
    }
}

fn print_version(version: &PromptVersion, json: bool) -> AppResult<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(version)?);
        return Ok(());
    }

    println!("Agent:    {}", version.agent_name());
    println!("Version:  {}", version.version_id());
    println!("Created:  {}", version.created_at().to_rfc3339());
    println!("Tokens:   ~{}", version.estimated_token_count());
    if !version.changelog_entry().is_empty() {
        println!("Changes:  {}", version.changelog_entry());
    }
    println!();
    println!("{}", version.template_body());

    Ok(())
}

impl PromptCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let registry = Arc::new(load_registry(&config.prompts_dir())?);

        match &self.action {
            PromptAction::List(cmd) => cmd.execute(&registry),
            PromptAction::Show(cmd) => cmd.execute(&registry),
            PromptAction::Resolve(cmd) => cmd.execute(config, registry),
            PromptAction::Changelog(cmd) => cmd.execute(&registry),
        }
    }
}
