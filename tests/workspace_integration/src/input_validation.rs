//! Input parameter validation tests.
//!
//! Malformed or missing arguments are protocol errors (`invalid_params`).
//! Well-formed arguments that fail a domain check come back as a structured
//! failure body inside a successful tool result.

use rmcp::model::{CallToolResult, RawContent};
use serde_json::{Map, Value};

/// Arguments map from a JSON object literal.
pub fn args(value: Value) -> Option<Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Parsed JSON body of a tool result.
pub fn body(result: &CallToolResult) -> Value {
    match &result.content[0].raw {
        RawContent::Text(text) => serde_json::from_str(&text.text).unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server;
    use cdp_mcp_server::handler::{PrepareSpectralParams, is_valid_window};
    use serde_json::json;

    #[tokio::test]
    async fn test_missing_arguments_are_invalid_params() {
        let dir = tempfile::tempdir().unwrap();
        let server = test_server(dir.path()).await;

        for tool in ["get_cdp_usage", "execute_cdp", "create_data_file", "analyze_sound", "prepare_spectral"] {
            let err = server.dispatch(tool, None).await.unwrap_err();
            assert_eq!(err.code, rmcp::model::ErrorCode::INVALID_PARAMS, "{tool}");
        }
    }

    #[tokio::test]
    async fn test_wrong_argument_types_are_invalid_params() {
        let dir = tempfile::tempdir().unwrap();
        let server = test_server(dir.path()).await;

        let err = server
            .dispatch("execute_cdp", args(json!({"command": "blur blur in.ana out.ana 50"})))
            .await
            .unwrap_err();
        assert!(err.message.contains("Invalid parameters"));

        let err = server
            .dispatch("prepare_spectral", args(json!({"input_file": "a.wav", "output_file": "a.ana", "window_size": -1})))
            .await
            .unwrap_err();
        assert_eq!(err.code, rmcp::model::ErrorCode::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_missing_required_field_is_invalid_params() {
        let dir = tempfile::tempdir().unwrap();
        let server = test_server(dir.path()).await;
        let err = server
            .dispatch("create_data_file", args(json!({"filepath": "notes.txt"})))
            .await
            .unwrap_err();
        assert!(err.message.contains("content"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_invalid_params() {
        let dir = tempfile::tempdir().unwrap();
        let server = test_server(dir.path()).await;
        let err = server.dispatch("generate_image", None).await.unwrap_err();
        assert_eq!(err.code, rmcp::model::ErrorCode::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_empty_command_is_a_tool_failure() {
        let dir = tempfile::tempdir().unwrap();
        let server = test_server(dir.path()).await;
        let result = server
            .dispatch("execute_cdp", args(json!({"command": []})))
            .await
            .unwrap();
        assert_eq!(body(&result), json!({"status": "failed", "error": "Empty command array provided"}));
    }

    #[tokio::test]
    async fn test_empty_data_file_path_is_a_tool_failure() {
        let dir = tempfile::tempdir().unwrap();
        let server = test_server(dir.path()).await;
        let result = server
            .dispatch("create_data_file", args(json!({"filepath": "  ", "content": "1 2"})))
            .await
            .unwrap();
        let body = body(&result);
        assert_eq!(body["status"], "failed");
        assert!(body["error"].as_str().unwrap().starts_with("Failed to create data file"));
    }

    #[tokio::test]
    async fn test_bad_window_is_a_tool_failure() {
        let dir = tempfile::tempdir().unwrap();
        let server = test_server(dir.path()).await;
        let result = server
            .dispatch("prepare_spectral", args(json!({"input_file": "a.wav", "output_file": "a.ana", "window_size": 100})))
            .await
            .unwrap();
        let body = body(&result);
        assert_eq!(body["status"], "failed");
        assert!(body["error"].as_str().unwrap().contains("window_size"));
    }

    #[test]
    fn test_valid_params_pass_validation() {
        let params = PrepareSpectralParams {
            input_file: "voice.wav".to_string(),
            output_file: "voice.ana".to_string(),
            window_size: 4096,
        };
        assert!(params.validate().is_ok());
        assert!(is_valid_window(params.window_size));
    }

    #[test]
    fn test_validation_collects_multiple_errors() {
        let params = PrepareSpectralParams {
            input_file: " ".to_string(),
            output_file: String::new(),
            window_size: 7,
        };
        let errors = params.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}

#[cfg(test)]
mod property_tests {
    use cdp_mcp_server::handler::{PrepareSpectralParams, is_valid_window};
    use proptest::prelude::*;

    fn params(window_size: u32) -> PrepareSpectralParams {
        PrepareSpectralParams {
            input_file: "in.wav".to_string(),
            output_file: "out.ana".to_string(),
            window_size,
        }
    }

    proptest! {
        #[test]
        fn powers_of_two_in_range_pass(exponent in 6u32..=13) {
            let size = 1u32 << exponent;
            prop_assert!(params(size).validate().is_ok());
        }

        #[test]
        fn other_sizes_fail(size in 0u32..20_000) {
            prop_assume!(!(size.is_power_of_two() && (64..=8192).contains(&size)));
            let errors = params(size).validate().unwrap_err();
            prop_assert!(errors.iter().any(|e| e.field == "window_size"));
            prop_assert!(!is_valid_window(size));
        }

        #[test]
        fn arbitrary_objects_never_panic_parsing(
            key in "[a-z_]{1,12}",
            value in "[ -~]{0,20}",
        ) {
            let mut map = serde_json::Map::new();
            map.insert(key, serde_json::Value::String(value));
            // Either parses or is rejected, never panics
            let _ = serde_json::from_value::<PrepareSpectralParams>(serde_json::Value::Object(map));
        }
    }
}
