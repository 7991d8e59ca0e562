//! Tool system for sqlnav
//!
//! This crate provides the tool execution framework:
//! - Function tools built from async closures
//! - JSON schema builders for tool parameters
//! - Parameter extraction helpers
//! - A default tool context

pub mod context;
pub mod function_tool;
pub mod params;
pub mod schema;

// Re-exports
pub use context::DefaultToolContext;
pub use function_tool::FunctionTool;
pub use schema::{ToolSchema, generate_schema};

// Re-export core types
pub use sqlnav_core::{Result, Tool, ToolContext, ToolResponse};
