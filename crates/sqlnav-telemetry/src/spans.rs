//! Span helpers for tool executions and join synthesis

use crate::attributes::*;

/// Attributes for tracing a tool call
#[derive(Debug, Clone)]
pub struct ToolSpanAttributes {
    pub tool_name: String,
    pub tool_description: String,
    pub tool_call_id: String,
    pub invocation_id: String,
    pub args_json: String,
    pub response_json: String,
}

/// Attributes for tracing one join synthesis
#[derive(Debug, Clone)]
pub struct JoinSpanAttributes {
    pub schema: String,
    pub requested_tables: Vec<String>,
    pub join_count: usize,
    pub found: bool,
}

/// Record a span for a tool execution.
pub fn trace_tool_call(attrs: ToolSpanAttributes) {
    let span = tracing::info_span!(
        "execute_tool",
        { OPERATION_NAME } = "execute_tool",
        { TOOL_NAME } = %attrs.tool_name,
        { TOOL_DESCRIPTION } = %attrs.tool_description,
        { TOOL_CALL_ID } = %attrs.tool_call_id,
        { INVOCATION_ID } = %attrs.invocation_id,
        { TOOL_CALL_ARGS } = %attrs.args_json,
        { TOOL_RESPONSE } = %attrs.response_json,
    );

    let _guard = span.enter();
}

/// Record a span for a join synthesis over a schema.
pub fn trace_join_synthesis(attrs: JoinSpanAttributes) {
    let span = tracing::info_span!(
        "synthesize_join",
        { OPERATION_NAME } = "synthesize_join",
        { SCHEMA } = %attrs.schema,
        { REQUESTED_TABLES } = %attrs.requested_tables.join(","),
        { JOIN_COUNT } = attrs.join_count,
        { JOIN_FOUND } = attrs.found,
    );

    let _guard = span.enter();
}

/// Helper to safely serialize to JSON string
pub fn safe_serialize<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "<not serializable>".to_string())
}
