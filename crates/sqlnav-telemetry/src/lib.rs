//! # sqlnav Telemetry
//!
//! Structured logging and OpenTelemetry tracing for schema navigation.
//!
//! Tool executions and join synthesis runs are recorded as spans with a small
//! set of attribute names so they can be filtered in any OTel backend.

mod spans;
mod tracer;

pub use spans::{
    JoinSpanAttributes, ToolSpanAttributes, safe_serialize, trace_join_synthesis, trace_tool_call,
};
pub use tracer::{TelemetryOptions, init_telemetry, register_span_processor};

/// Span attribute names used by sqlnav.
pub mod attributes {
    pub const OPERATION_NAME: &str = "sqlnav.operation.name";

    // Tool attributes
    pub const TOOL_NAME: &str = "sqlnav.tool.name";
    pub const TOOL_DESCRIPTION: &str = "sqlnav.tool.description";
    pub const TOOL_CALL_ID: &str = "sqlnav.tool.call.id";
    pub const TOOL_CALL_ARGS: &str = "sqlnav.tool.call_args";
    pub const TOOL_RESPONSE: &str = "sqlnav.tool.response";
    pub const INVOCATION_ID: &str = "sqlnav.invocation_id";

    // Relationship graph attributes
    pub const SCHEMA: &str = "sqlnav.schema";
    pub const REQUESTED_TABLES: &str = "sqlnav.join.requested_tables";
    pub const JOIN_COUNT: &str = "sqlnav.join.count";
    pub const JOIN_FOUND: &str = "sqlnav.join.found";

    pub const SYSTEM_NAME: &str = "sqlnav";
}
