//! Tool Registry
//!
//! The fixed catalogue of tool descriptors advertised to clients. Built once;
//! dispatch never consults it.

use serde::Serialize;
use serde_json::{json, Value};

use super::handlers;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Object schema with the given properties; unknown properties are not allowed.
pub(crate) fn descriptor(
    name: &str,
    description: &str,
    properties: Value,
    required: &[&str],
) -> ToolDescriptor {
    ToolDescriptor {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        }),
    }
}

#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        let mut tools = Vec::new();
        tools.extend(handlers::gmail::descriptors());
        tools.extend(handlers::chat::descriptors());
        tools.extend(handlers::sheets::descriptors());
        tools.extend(handlers::drive::descriptors());
        tools.extend(handlers::forms::descriptors());
        tools.extend(handlers::calendar::descriptors());
        tools.extend(handlers::docs::descriptors());
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        Self { tools }
    }

    pub fn list(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools
            .binary_search_by(|t| t.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.tools[i])
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolCall;
    use std::collections::HashSet;

    /// Smallest value satisfying a property schema.
    fn sample(schema: &Value) -> Value {
        match schema.get("type").and_then(Value::as_str) {
            Some("string") => schema
                .get("enum")
                .and_then(|e| e.get(0))
                .cloned()
                .unwrap_or_else(|| json!("x")),
            Some("integer") | Some("number") => json!(1),
            Some("boolean") => json!(true),
            Some("array") => json!([sample(&schema["items"])]),
            Some("object") => json!({}),
            _ => json!("x"),
        }
    }

    #[test]
    fn catalogue_is_complete_and_sorted() {
        let registry = ToolRegistry::new();
        assert_eq!(registry.len(), 49);

        let names: Vec<&str> = registry.list().iter().map(|t| t.name.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names.iter().collect::<HashSet<_>>().len(), names.len());

        for prefix in ["gmail_", "chat_", "sheets_", "drive_", "forms_", "calendar_", "docs_"] {
            assert!(names.iter().any(|n| n.starts_with(prefix)), "{prefix}");
        }
        assert!(registry.get("drive_move_file").is_some());
        assert!(registry.get("drive_teleport").is_none());
    }

    #[test]
    fn every_descriptor_resolves_to_a_call() {
        for tool in ToolRegistry::new().list() {
            let schema = &tool.input_schema;
            let mut args = serde_json::Map::new();
            for field in schema["required"].as_array().unwrap() {
                let field = field.as_str().unwrap();
                args.insert(field.to_string(), sample(&schema["properties"][field]));
            }
            if args.contains_key("end_index") {
                args.insert("end_index".to_string(), json!(2));
            }
            // style-less format calls are rejected on purpose
            if tool.name == "sheets_format_cells" || tool.name == "docs_format_text" {
                args.insert("bold".to_string(), json!(true));
            }
            if let Err(e) = ToolCall::parse(&tool.name, Value::Object(args)) {
                panic!("{} does not parse its own required args: {}", tool.name, e);
            }
        }
    }

    #[test]
    fn missing_required_argument_is_named() {
        for tool in ToolRegistry::new().list() {
            let required = tool.input_schema["required"].as_array().unwrap();
            let Some(first) = required.first().and_then(Value::as_str) else {
                continue;
            };
            let err = ToolCall::parse(&tool.name, json!({})).unwrap_err();
            assert!(
                err.to_string().contains(first),
                "{}: {} should mention {}",
                tool.name,
                err,
                first
            );
        }
    }
}
