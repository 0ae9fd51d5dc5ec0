//! Command handlers for the docpipe CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod notes;
pub mod prompt;

// Re-export command types for convenience
pub use notes::NotesCommand;
pub use prompt::PromptCommand;
