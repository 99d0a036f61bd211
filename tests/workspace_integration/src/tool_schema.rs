//! Tool schema validity tests.
//!
//! Every registered tool must carry a name, a description and an object
//! input schema that lists its parameters.

use serde_json::Value;

/// Validates that a JSON schema has the required structure.
fn validate_json_schema(schema: &Value) -> Result<(), String> {
    let obj = schema
        .as_object()
        .ok_or_else(|| "Schema must be an object".to_string())?;

    if let Some(type_val) = obj.get("type") {
        if type_val != "object" {
            return Err(format!("Expected type 'object', got {:?}", type_val));
        }
    }

    if let Some(properties) = obj.get("properties") {
        if !properties.is_object() {
            return Err("Properties must be an object".to_string());
        }
    }

    Ok(())
}

/// Validates that a tool has required fields.
fn validate_tool(tool: &rmcp::model::Tool) -> Result<(), String> {
    if tool.name.is_empty() {
        return Err("Tool name cannot be empty".to_string());
    }

    match tool.description.as_deref() {
        Some(description) if !description.is_empty() => {}
        _ => return Err(format!("Tool '{}' must have a description", tool.name)),
    }

    if tool.input_schema.is_empty() {
        return Err(format!("Tool '{}' must have an input schema", tool.name));
    }

    let schema_value = serde_json::to_value(&*tool.input_schema)
        .map_err(|e| format!("Failed to serialize schema: {}", e))?;
    validate_json_schema(&schema_value)?;

    Ok(())
}

fn required_fields(tool: &rmcp::model::Tool) -> Vec<String> {
    tool.input_schema
        .get("required")
        .and_then(Value::as_array)
        .map(|fields| {
            fields
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn find_tool(name: &str) -> rmcp::model::Tool {
    cdp_mcp_server::server::tool_definitions()
        .into_iter()
        .find(|t| t.name == name)
        .unwrap_or_else(|| panic!("tool {name} not registered"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdp_mcp_server::server::{TOOL_NAMES, tool_definitions};
    use std::borrow::Cow;
    use std::sync::Arc;

    #[test]
    fn test_json_schema_validation() {
        let valid_schema = serde_json::json!({
            "type": "object",
            "properties": {
                "program": { "type": "string" }
            },
            "required": ["program"]
        });
        assert!(validate_json_schema(&valid_schema).is_ok());

        let invalid_schema = serde_json::json!({ "type": "string" });
        assert!(validate_json_schema(&invalid_schema).is_err());
    }

    #[test]
    fn test_tool_validation() {
        let invalid_tool = rmcp::model::Tool {
            name: Cow::Borrowed(""),
            description: Some(Cow::Borrowed("A test tool")),
            input_schema: Arc::new(serde_json::Map::new()),
            annotations: None,
            icons: None,
            meta: None,
            output_schema: None,
            title: None,
        };
        assert!(validate_tool(&invalid_tool).is_err());

        let undocumented = rmcp::model::Tool {
            description: None,
            name: Cow::Borrowed("execute_cdp"),
            ..invalid_tool
        };
        assert!(validate_tool(&undocumented).is_err());
    }

    #[test]
    fn test_every_tool_is_valid() {
        let tools = tool_definitions();
        assert_eq!(tools.len(), TOOL_NAMES.len());
        for tool in &tools {
            let result = validate_tool(tool);
            assert!(result.is_ok(), "{}: {:?}", tool.name, result.err());
        }
    }

    #[test]
    fn test_tool_names_are_unique() {
        let mut names: Vec<String> = tool_definitions().iter().map(|t| t.name.to_string()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), TOOL_NAMES.len());
    }

    #[test]
    fn test_required_parameters() {
        assert_eq!(required_fields(&find_tool("get_cdp_usage")), vec!["program"]);
        assert_eq!(required_fields(&find_tool("execute_cdp")), vec!["command"]);
        assert_eq!(required_fields(&find_tool("analyze_sound")), vec!["filepath"]);

        let mut data_file = required_fields(&find_tool("create_data_file"));
        data_file.sort();
        assert_eq!(data_file, vec!["content", "filepath"]);

        let mut spectral = required_fields(&find_tool("prepare_spectral"));
        spectral.sort();
        assert_eq!(spectral, vec!["input_file", "output_file"]);

        assert!(required_fields(&find_tool("list_cdp_programs")).is_empty());
    }

    #[test]
    fn test_command_schema_is_string_array() {
        let tool = find_tool("execute_cdp");
        let command = &tool.input_schema["properties"]["command"];
        assert_eq!(command["type"], "array");
        assert_eq!(command["items"]["type"], "string");
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Registered names follow the snake_case tool naming convention.
        #[test]
        fn tool_names_are_snake_case(index in 0usize..cdp_mcp_server::server::TOOL_NAMES.len()) {
            let name = cdp_mcp_server::server::TOOL_NAMES[index];
            prop_assert!(name.chars().next().is_some_and(|c| c.is_ascii_lowercase()));
            prop_assert!(name.chars().all(|c| c.is_ascii_lowercase() || c == '_'));
        }

        /// Unknown names never resolve to a registered tool.
        #[test]
        fn unknown_names_are_not_registered(name in "[a-z]{3,12}_[a-z]{3,12}_x") {
            let registered = cdp_mcp_server::server::tool_definitions()
                .iter()
                .any(|t| t.name == name.as_str());
            prop_assert!(!registered);
        }
    }
}
