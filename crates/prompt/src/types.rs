//! Prompt types for docpipe.
//!
//! This module defines the domain entities for the prompt registry.

use crate::version::{Version, VersionError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An immutable, versioned prompt template bound to one pipeline agent.
///
/// The template body is opaque: it is stored and handed out verbatim, never
/// rendered or inspected. Records are built once, registered, and never
/// mutated afterwards; a change is a new version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptVersion {
    #[serde(rename = "agentName")]
    agent_name: String,

    #[serde(rename = "versionId")]
    version_id: Version,

    #[serde(rename = "templateBody")]
    template_body: String,

    /// Informational only
    #[serde(rename = "estimatedTokenCount")]
    estimated_token_count: usize,

    #[serde(rename = "createdAt")]
    created_at: DateTime<Utc>,

    #[serde(rename = "changelogEntry", default)]
    changelog_entry: String,
}

impl PromptVersion {
    /// Create a new prompt version stamped with the current time.
    ///
    /// The token estimate defaults to [`estimate_tokens`] of the body.
    pub fn new(
        agent_name: impl Into<String>,
        version_id: &str,
        template_body: impl Into<String>,
    ) -> Result<Self, VersionError> {
        let template_body = template_body.into();
        Ok(Self {
            agent_name: agent_name.into(),
            version_id: Version::parse(version_id)?,
            estimated_token_count: estimate_tokens(&template_body),
            template_body,
            created_at: Utc::now(),
            changelog_entry: String::new(),
        })
    }

    /// Set the changelog entry describing what changed since the previous version.
    pub fn with_changelog(mut self, entry: impl Into<String>) -> Self {
        self.changelog_entry = entry.into();
        self
    }

    /// Override the token estimate.
    pub fn with_token_estimate(mut self, tokens: usize) -> Self {
        self.estimated_token_count = tokens;
        self
    }

    /// Override the creation timestamp.
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    pub fn version_id(&self) -> &Version {
        &self.version_id
    }

    pub fn template_body(&self) -> &str {
        &self.template_body
    }

    pub fn estimated_token_count(&self) -> usize {
        self.estimated_token_count
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn changelog_entry(&self) -> &str {
        &self.changelog_entry
    }
}

/// Rough token estimate for a template: one token per four bytes, rounded up.
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}

/// A prompt version file as stored under `.docpipe/prompts/<agent>/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptVersionFile {
    /// Owning agent; defaults to the directory name
    #[serde(rename = "agentName", default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,

    #[serde(rename = "versionId")]
    pub version_id: String,

    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(
        rename = "estimatedTokenCount",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub estimated_token_count: Option<usize>,

    #[serde(default)]
    pub changelog: String,

    /// Template body, kept verbatim
    pub template: String,
}
