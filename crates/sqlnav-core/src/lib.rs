//! Core traits and types for sqlnav
//!
//! This crate provides the shared error type, configuration loading and the
//! tool abstractions used to expose schema navigation to agents.

pub mod config;
pub mod context;
pub mod error;
pub mod traits;

// Re-exports
pub use config::{CacheConfig, DatabaseConfig, LogFormat, ObservabilityConfig, SqlNavConfig, ToolsConfig};
pub use context::ToolContext;
pub use error::{Error, Result};
pub use traits::{Tool, ToolResponse};
