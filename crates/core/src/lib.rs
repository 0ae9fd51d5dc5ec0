//! docpipe core library
//!
//! This crate provides the foundational utilities shared by the docpipe crates:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management, including per-agent prompt version selection

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{normalize_agent_name, AppConfig, PromptSelection};
pub use error::{AppError, AppResult};
