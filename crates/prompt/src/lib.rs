//! Prompt system for docpipe.
//!
//! This crate provides versioned prompt management with:
//! - Immutable prompt versions with semantic-version precedence
//! - A concurrent registry keyed by agent name
//! - Request-time version selection with fallback
//! - YAML-based prompt version files

pub mod error;
pub mod loader;
pub mod registry;
pub mod selector;
pub mod types;
pub mod version;

// Re-export main types
pub use error::{FallbackFailure, RegistryError, VersionResolutionFailed};
pub use loader::{list_prompt_files, load_into, load_prompt_file, load_registry};
pub use registry::{PromptRegistry, VersionList};
pub use selector::VersionSelector;
pub use types::{estimate_tokens, PromptVersion, PromptVersionFile};
pub use version::{Version, VersionError};
