//! Error types for the prompt registry and version selection.

use crate::version::VersionError;
use docpipe_core::AppError;
use thiserror::Error;

/// Errors raised by [`crate::PromptRegistry`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The `(agent, version)` pair is already registered
    #[error("Prompt version {version} is already registered for agent '{agent}'")]
    DuplicateVersion { agent: String, version: String },

    /// No record for the `(agent, version)` pair
    #[error("Prompt version {version} not found for agent '{agent}'")]
    NotFound { agent: String, version: String },

    /// The agent has no versions at all
    #[error("No prompt versions registered for agent '{agent}'")]
    NoVersionsRegistered { agent: String },

    /// The version string is not strict semver
    #[error(transparent)]
    InvalidVersion(#[from] VersionError),

    /// A record was registered under a different agent than its own
    #[error("Prompt version belongs to agent '{found}', cannot register it under '{expected}'")]
    AgentMismatch { expected: String, found: String },

    #[error("Prompt registry lock poisoned")]
    Poisoned,
}

/// Version resolution failed, possibly after a fallback attempt.
///
/// `reason` holds the registry error for the requested version (or the
/// default lookup when nothing was requested). When a fallback was tried,
/// `fallback` records which version and why it failed as well.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "Failed to resolve prompt for agent '{agent_name}' (requested {}): {reason}{}",
    requested_label(.requested),
    fallback_suffix(.fallback)
)]
pub struct VersionResolutionFailed {
    pub agent_name: String,
    pub requested: Option<String>,
    #[source]
    pub reason: RegistryError,
    pub fallback: Option<FallbackFailure>,
}

/// The fallback attempt that also failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackFailure {
    pub version: String,
    pub reason: RegistryError,
}

fn requested_label(requested: &Option<String>) -> &str {
    requested.as_deref().unwrap_or("default")
}

fn fallback_suffix(fallback: &Option<FallbackFailure>) -> String {
    match fallback {
        Some(f) => format!("; fallback {} also failed: {}", f.version, f.reason),
        None => String::new(),
    }
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        AppError::Prompt(err.to_string())
    }
}

impl From<VersionResolutionFailed> for AppError {
    fn from(err: VersionResolutionFailed) -> Self {
        AppError::Prompt(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_resolution_failure_message_and_source() {
        let err = VersionResolutionFailed {
            agent_name: "extractor".to_string(),
            requested: Some("9.9.9".to_string()),
            reason: RegistryError::NotFound {
                agent: "extractor".to_string(),
                version: "9.9.9".to_string(),
            },
            fallback: Some(FallbackFailure {
                version: "8.0.0".to_string(),
                reason: RegistryError::NotFound {
                    agent: "extractor".to_string(),
                    version: "8.0.0".to_string(),
                },
            }),
        };

        let message = err.to_string();
        assert!(message.contains("requested 9.9.9"));
        assert!(message.contains("fallback 8.0.0 also failed"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_default_request_label() {
        let err = VersionResolutionFailed {
            agent_name: "extractor".to_string(),
            requested: None,
            reason: RegistryError::NoVersionsRegistered {
                agent: "extractor".to_string(),
            },
            fallback: None,
        };
        assert!(err.to_string().contains("requested default"));

        let app: AppError = err.into();
        assert!(matches!(app, AppError::Prompt(_)));
    }
}
