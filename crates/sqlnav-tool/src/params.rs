//! Helpers for pulling typed arguments out of tool parameters

use serde_json::Value;
use sqlnav_core::{Error, Result};

/// Required string parameter
pub fn required_str<'a>(params: &'a Value, name: &str) -> Result<&'a str> {
    params[name]
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| Error::invalid_parameter(format!("Missing '{}' parameter", name)))
}

/// Optional string parameter with a default
pub fn str_or<'a>(params: &'a Value, name: &str, default: &'a str) -> &'a str {
    params[name].as_str().unwrap_or(default)
}

/// Optional boolean parameter with a default
pub fn bool_or(params: &Value, name: &str, default: bool) -> bool {
    params[name].as_bool().unwrap_or(default)
}

/// Required array of strings
pub fn required_str_list(params: &Value, name: &str) -> Result<Vec<String>> {
    let items = params[name]
        .as_array()
        .ok_or_else(|| Error::invalid_parameter(format!("Missing '{}' parameter", name)))?;

    items
        .iter()
        .map(|item| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                Error::invalid_parameter(format!("'{}' must contain only strings", name))
            })
        })
        .collect()
}
