//! Request-time prompt version selection.
//!
//! The selector sits between request handlers and the registry. Whatever
//! the underlying lookup failure, callers see one error type,
//! [`VersionResolutionFailed`], with the registry error kept as its source.

use crate::error::{FallbackFailure, RegistryError, VersionResolutionFailed};
use crate::registry::PromptRegistry;
use crate::types::PromptVersion;
use docpipe_core::PromptSelection;
use std::sync::Arc;

/// Resolves which prompt version an agent runs with.
#[derive(Debug, Clone)]
pub struct VersionSelector {
    registry: Arc<PromptRegistry>,
}

impl VersionSelector {
    pub fn new(registry: Arc<PromptRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &PromptRegistry {
        &self.registry
    }

    /// Resolve `requested`, or the registry default when it is `None`.
    pub fn resolve(
        &self,
        agent_name: &str,
        requested: Option<&str>,
    ) -> Result<Arc<PromptVersion>, VersionResolutionFailed> {
        self.lookup(agent_name, requested)
            .map_err(|reason| VersionResolutionFailed {
                agent_name: agent_name.to_string(),
                requested: requested.map(str::to_string),
                reason,
                fallback: None,
            })
    }

    /// Resolve `requested`, retrying once with `fallback` on failure.
    ///
    /// If the fallback fails too the error carries both failures; no other
    /// version is ever substituted.
    pub fn resolve_with_fallback(
        &self,
        agent_name: &str,
        requested: Option<&str>,
        fallback: &str,
    ) -> Result<Arc<PromptVersion>, VersionResolutionFailed> {
        let reason = match self.lookup(agent_name, requested) {
            Ok(version) => return Ok(version),
            Err(reason) => reason,
        };

        tracing::warn!(
            "Prompt {} for agent '{}' unavailable ({}), falling back to {}",
            requested.unwrap_or("default"),
            agent_name,
            reason,
            fallback
        );

        match self.registry.get(agent_name, fallback) {
            Ok(version) => Ok(version),
            Err(fallback_reason) => {
                tracing::error!(
                    "Fallback prompt {} for agent '{}' unavailable: {}",
                    fallback,
                    agent_name,
                    fallback_reason
                );
                Err(VersionResolutionFailed {
                    agent_name: agent_name.to_string(),
                    requested: requested.map(str::to_string),
                    reason,
                    fallback: Some(FallbackFailure {
                        version: fallback.to_string(),
                        reason: fallback_reason,
                    }),
                })
            }
        }
    }

    /// Resolve using a configured selection (environment or config file).
    pub fn resolve_configured(
        &self,
        agent_name: &str,
        selection: &PromptSelection,
    ) -> Result<Arc<PromptVersion>, VersionResolutionFailed> {
        let requested = selection.version.as_deref();
        match selection.fallback.as_deref() {
            Some(fallback) => self.resolve_with_fallback(agent_name, requested, fallback),
            None => self.resolve(agent_name, requested),
        }
    }

    fn lookup(
        &self,
        agent_name: &str,
        requested: Option<&str>,
    ) -> Result<Arc<PromptVersion>, RegistryError> {
        match requested {
            Some(version_id) => self.registry.get(agent_name, version_id),
            None => self.registry.get_default(agent_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector_with(versions: &[&str]) -> VersionSelector {
        let registry = PromptRegistry::new();
        for id in versions {
            let version = PromptVersion::new("extractor", id, format!("extractor {}", id)).unwrap();
            registry.register("extractor", version).unwrap();
        }
        VersionSelector::new(Arc::new(registry))
    }

    #[test]
    fn test_resolve_explicit_and_default() {
        let selector = selector_with(&["1.0.0", "2.0.0"]);

        let explicit = selector.resolve("extractor", Some("1.0.0")).unwrap();
        assert_eq!(explicit.version_id().to_string(), "1.0.0");

        let default = selector.resolve("extractor", None).unwrap();
        assert_eq!(default.version_id().to_string(), "2.0.0");
    }

    #[test]
    fn test_resolve_unknown_version_fails() {
        let selector = selector_with(&["1.0.0", "2.0.0"]);

        let err = selector.resolve("extractor", Some("9.9.9")).unwrap_err();
        assert_eq!(err.agent_name, "extractor");
        assert_eq!(err.requested.as_deref(), Some("9.9.9"));
        assert!(matches!(err.reason, RegistryError::NotFound { .. }));
        assert!(err.fallback.is_none());
    }

    #[test]
    fn test_resolve_default_without_versions() {
        let selector = selector_with(&[]);
        let err = selector.resolve("extractor", None).unwrap_err();
        assert!(matches!(err.reason, RegistryError::NoVersionsRegistered { .. }));
    }

    #[test]
    fn test_resolve_invalid_version_string() {
        let selector = selector_with(&["2.0.0"]);
        let err = selector.resolve("extractor", Some("2.0")).unwrap_err();
        assert!(matches!(err.reason, RegistryError::InvalidVersion(_)));
    }

    #[test]
    fn test_fallback_used_when_requested_missing() {
        let selector = selector_with(&["1.0.0", "2.0.0"]);
        let resolved = selector
            .resolve_with_fallback("extractor", Some("9.9.9"), "1.0.0")
            .unwrap();
        assert_eq!(resolved.version_id().to_string(), "1.0.0");
    }

    #[test]
    fn test_fallback_not_used_when_requested_exists() {
        let selector = selector_with(&["1.0.0", "2.0.0"]);
        let resolved = selector
            .resolve_with_fallback("extractor", Some("2.0.0"), "1.0.0")
            .unwrap();
        assert_eq!(resolved.version_id().to_string(), "2.0.0");
    }

    #[test]
    fn test_fallback_failure_is_explicit() {
        let selector = selector_with(&["2.0.0"]);
        let err = selector
            .resolve_with_fallback("extractor", Some("9.9.9"), "1.0.0")
            .unwrap_err();

        assert!(matches!(err.reason, RegistryError::NotFound { .. }));
        let fallback = err.fallback.unwrap();
        assert_eq!(fallback.version, "1.0.0");
        assert!(matches!(fallback.reason, RegistryError::NotFound { .. }));
    }

    #[test]
    fn test_resolve_configured() {
        let selector = selector_with(&["1.0.0", "2.0.0"]);

        let rollback = PromptSelection {
            version: Some("3.0.0".to_string()),
            fallback: Some("1.0.0".to_string()),
        };
        let resolved = selector.resolve_configured("extractor", &rollback).unwrap();
        assert_eq!(resolved.version_id().to_string(), "1.0.0");

        let default = selector
            .resolve_configured("extractor", &PromptSelection::default())
            .unwrap();
        assert_eq!(default.version_id().to_string(), "2.0.0");

        let pinned_missing = PromptSelection {
            version: Some("3.0.0".to_string()),
            fallback: None,
        };
        assert!(selector
            .resolve_configured("extractor", &pinned_missing)
            .is_err());
    }
}
