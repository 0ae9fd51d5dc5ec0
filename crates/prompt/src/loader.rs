//! Prompt loader for populating a registry from YAML version files.
//!
//! Layout: `<prompts_dir>/<agent>/<anything>.yml`, one version per file.

use crate::registry::PromptRegistry;
use crate::types::{PromptVersion, PromptVersionFile};
use chrono::Utc;
use docpipe_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// Load a single prompt version file.
///
/// The agent name comes from the file's `agentName` key, or from its parent
/// directory when the key is absent. When both are present they must agree.
///
/// # Example
/// ```no_run
/// use docpipe_prompt::load_prompt_file;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let version = load_prompt_file(Path::new(".docpipe/prompts/extractor/2.0.0.yml"))?;
/// println!("Loaded {} {}", version.agent_name(), version.version_id());
/// # Ok(())
/// # }
/// ```
pub fn load_prompt_file(path: &Path) -> AppResult<PromptVersion> {
    tracing::debug!("Loading prompt version from: {:?}", path);

    if !path.exists() {
        return Err(AppError::Prompt(format!(
            "Prompt file not found: {:?}",
            path
        )));
    }

    let contents = std::fs::read_to_string(path).map_err(|e| {
        AppError::Prompt(format!("Failed to read prompt file {:?}: {}", path, e))
    })?;

    let file: PromptVersionFile = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!("Failed to parse prompt YAML {:?}: {}", path, e))
    })?;

    let dir_agent = path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .map(str::to_string);

    let agent_name = match (file.agent_name.as_deref(), dir_agent) {
        (Some(declared), Some(dir)) if declared != dir => {
            return Err(AppError::Prompt(format!(
                "Prompt file {:?} declares agent '{}' but lives under '{}'",
                path, declared, dir
            )));
        }
        (Some(declared), _) => declared.to_string(),
        (None, Some(dir)) => dir,
        (None, None) => {
            return Err(AppError::Prompt(format!(
                "Cannot determine agent for prompt file {:?}",
                path
            )));
        }
    };

    validate_file(&file, path)?;

    let mut version = PromptVersion::new(agent_name, &file.version_id, file.template)
        .map_err(|e| AppError::Prompt(format!("{:?}: {}", path, e)))?
        .with_changelog(file.changelog)
        .with_created_at(file.created_at.unwrap_or_else(Utc::now));

    if let Some(tokens) = file.estimated_token_count {
        version = version.with_token_estimate(tokens);
    }

    Ok(version)
}

/// Register every prompt version file under `prompts_dir`.
///
/// All files are parsed before anything is registered, and the batch is
/// registered all or nothing: on any error the registry is unchanged.
/// A missing directory yields zero versions. Returns the number of
/// versions registered.
pub fn load_into(registry: &PromptRegistry, prompts_dir: &Path) -> AppResult<usize> {
    let versions = list_prompt_files(prompts_dir)?
        .iter()
        .map(|path| load_prompt_file(path))
        .collect::<AppResult<Vec<_>>>()?;

    let count = registry.register_all(versions)?.len();

    tracing::info!("Loaded {} prompt versions from {:?}", count, prompts_dir);
    Ok(count)
}

/// Build a fresh registry from `prompts_dir`.
pub fn load_registry(prompts_dir: &Path) -> AppResult<PromptRegistry> {
    let registry = PromptRegistry::new();
    load_into(&registry, prompts_dir)?;
    Ok(registry)
}

/// All `.yml`/`.yaml` files one level below the agent directories, sorted.
pub fn list_prompt_files(prompts_dir: &Path) -> AppResult<Vec<PathBuf>> {
    if !prompts_dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();

    for entry in walkdir::WalkDir::new(prompts_dir)
        .min_depth(2)
        .max_depth(2)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        let is_yaml = matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("yml") | Some("yaml")
        );
        if path.is_file() && is_yaml {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

fn validate_file(file: &PromptVersionFile, path: &Path) -> AppResult<()> {
    if file.version_id.trim().is_empty() {
        return Err(AppError::Prompt(format!(
            "Prompt file {:?} has an empty versionId",
            path
        )));
    }

    if file.template.trim().is_empty() {
        return Err(AppError::Prompt(format!(
            "Prompt file {:?} has an empty template",
            path
        )));
    }

    Ok(())
}
