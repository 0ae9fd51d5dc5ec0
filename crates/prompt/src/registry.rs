//! Prompt registry: agent name to an ordered set of immutable prompt versions.
//!
//! The registry is an explicit object owned by the caller and shared by
//! reference (typically `Arc<PromptRegistry>`) across request handlers.
//! All state lives behind one `RwLock`: the duplicate check and the insert
//! of [`PromptRegistry::register`] run under a single write guard, so a
//! version is either fully visible or not visible at all and a duplicate
//! registration fails deterministically.

use crate::error::RegistryError;
use crate::types::PromptVersion;
use crate::version::Version;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard};

type VersionMap = BTreeMap<Version, Arc<PromptVersion>>;

/// Registry of prompt versions keyed by agent name.
#[derive(Debug, Default)]
pub struct PromptRegistry {
    agents: RwLock<HashMap<String, VersionMap>>,
}

impl PromptRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a prompt version under `agent_name`.
    ///
    /// # Errors
    /// - `DuplicateVersion` if the agent already has a precedence-equal version;
    ///   the existing record is left untouched
    /// - `AgentMismatch` if the record names a different agent
    pub fn register(
        &self,
        agent_name: &str,
        version: PromptVersion,
    ) -> Result<Arc<PromptVersion>, RegistryError> {
        if version.agent_name() != agent_name {
            return Err(RegistryError::AgentMismatch {
                expected: agent_name.to_string(),
                found: version.agent_name().to_string(),
            });
        }

        let key = version.version_id().clone();
        let record = Arc::new(version);

        let mut agents = self.agents.write().map_err(|_| RegistryError::Poisoned)?;
        let versions = agents.entry(agent_name.to_string()).or_default();

        if let Some(existing) = versions.get(&key) {
            tracing::warn!(
                "Rejected duplicate prompt version {} for agent '{}'",
                key,
                agent_name
            );
            return Err(RegistryError::DuplicateVersion {
                agent: agent_name.to_string(),
                version: existing.version_id().to_string(),
            });
        }

        versions.insert(key, Arc::clone(&record));
        tracing::info!(
            "Registered prompt version {} for agent '{}'",
            record.version_id(),
            agent_name
        );

        Ok(record)
    }

    /// Register a batch of versions, all or nothing.
    ///
    /// Every record is checked against the registry and against the rest of
    /// the batch under one write guard. If any check fails nothing is
    /// inserted.
    ///
    /// # Errors
    /// The first `DuplicateVersion` found, whether against an existing record
    /// or within the batch itself.
    pub fn register_all(
        &self,
        versions: Vec<PromptVersion>,
    ) -> Result<Vec<Arc<PromptVersion>>, RegistryError> {
        let mut agents = self.agents.write().map_err(|_| RegistryError::Poisoned)?;

        let mut staged: HashMap<&str, Vec<&Version>> = HashMap::new();
        for version in &versions {
            let agent = version.agent_name();
            let key = version.version_id();
            let existing = agents.get(agent).and_then(|versions| versions.get(key));
            let in_batch = staged.get(agent).is_some_and(|keys| keys.contains(&key));

            if existing.is_some() || in_batch {
                tracing::warn!(
                    "Rejected batch: duplicate prompt version {} for agent '{}'",
                    key,
                    agent
                );
                return Err(RegistryError::DuplicateVersion {
                    agent: agent.to_string(),
                    version: key.to_string(),
                });
            }
            staged.entry(agent).or_default().push(key);
        }
        drop(staged);

        let records: Vec<Arc<PromptVersion>> = versions.into_iter().map(Arc::new).collect();
        for record in &records {
            agents
                .entry(record.agent_name().to_string())
                .or_default()
                .insert(record.version_id().clone(), Arc::clone(record));
        }
        tracing::info!("Registered {} prompt versions", records.len());

        Ok(records)
    }

    /// Look up an exact version.
    ///
    /// # Errors
    /// `InvalidVersion` if `version_id` is not strict semver, `NotFound` if absent.
    pub fn get(
        &self,
        agent_name: &str,
        version_id: &str,
    ) -> Result<Arc<PromptVersion>, RegistryError> {
        let version = Version::parse(version_id)?;
        tracing::debug!("Looking up prompt {} for agent '{}'", version, agent_name);

        let found = self
            .read()?
            .get(agent_name)
            .and_then(|versions| versions.get(&version))
            .cloned();

        found.ok_or_else(|| RegistryError::NotFound {
            agent: agent_name.to_string(),
            version: version_id.to_string(),
        })
    }

    /// The highest-precedence version registered for the agent.
    ///
    /// # Errors
    /// `NoVersionsRegistered` if the agent has none.
    pub fn get_default(&self, agent_name: &str) -> Result<Arc<PromptVersion>, RegistryError> {
        self.read()?
            .get(agent_name)
            .and_then(|versions| versions.values().next_back())
            .cloned()
            .ok_or_else(|| RegistryError::NoVersionsRegistered {
                agent: agent_name.to_string(),
            })
    }

    /// All versions for the agent in ascending precedence.
    ///
    /// Unknown agents yield an empty list.
    pub fn list(&self, agent_name: &str) -> Result<VersionList, RegistryError> {
        let versions = self
            .read()?
            .get(agent_name)
            .map(|versions| versions.values().cloned().collect())
            .unwrap_or_default();

        Ok(VersionList { versions })
    }

    /// Names of all agents with at least one version, sorted.
    pub fn agents(&self) -> Result<Vec<String>, RegistryError> {
        let mut names: Vec<String> = self
            .read()?
            .iter()
            .filter(|(_, versions)| !versions.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    /// `(version, changelog entry)` pairs for the agent, ascending.
    pub fn changelog(&self, agent_name: &str) -> Result<Vec<(Version, String)>, RegistryError> {
        Ok(self
            .list(agent_name)?
            .iter()
            .map(|v| (v.version_id().clone(), v.changelog_entry().to_string()))
            .collect())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, VersionMap>>, RegistryError> {
        self.agents.read().map_err(|_| RegistryError::Poisoned)
    }
}

/// Snapshot of an agent's versions in ascending precedence.
///
/// Holding the list does not block registration; iterate it as many times
/// as needed.
#[derive(Debug, Clone, Default)]
pub struct VersionList {
    versions: Vec<Arc<PromptVersion>>,
}

impl VersionList {
    pub fn iter(&self) -> std::slice::Iter<'_, Arc<PromptVersion>> {
        self.versions.iter()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

impl<'a> IntoIterator for &'a VersionList {
    type Item = &'a Arc<PromptVersion>;
    type IntoIter = std::slice::Iter<'a, Arc<PromptVersion>>;

    fn into_iter(self) -> Self::IntoIter {
        self.versions.iter()
    }
}

impl IntoIterator for VersionList {
    type Item = Arc<PromptVersion>;
    type IntoIter = std::vec::IntoIter<Arc<PromptVersion>>;

    fn into_iter(self) -> Self::IntoIter {
        self.versions.into_iter()
    }
}
