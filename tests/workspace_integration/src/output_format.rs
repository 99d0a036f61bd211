//! Output format tests.
//!
//! Every tool answers with a single text content item holding pretty-printed
//! JSON, failures included.

use rmcp::model::{CallToolResult, Content, RawContent};

/// Validates that a CallToolResult has valid content format.
fn validate_tool_result(result: &CallToolResult) -> Result<(), String> {
    if result.content.is_empty() && !result.is_error.unwrap_or(false) {
        return Err("Successful result should have content".to_string());
    }

    for content in &result.content {
        validate_content(content)?;
    }

    Ok(())
}

/// Text content must be a non-empty JSON document.
fn validate_content(content: &Content) -> Result<(), String> {
    match &content.raw {
        RawContent::Text(text_content) => {
            if text_content.text.is_empty() {
                return Err("Text content should not be empty".to_string());
            }
            serde_json::from_str::<serde_json::Value>(&text_content.text)
                .map(|_| ())
                .map_err(|e| format!("Text content should be JSON: {}", e))
        }
        _ => Err("CDP tools only return text content".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input_validation::{args, body};
    use crate::test_server;
    use serde_json::json;

    #[test]
    fn test_content_text_helper() {
        let content = Content::text(r#"{"status": "success"}"#);
        assert!(validate_content(&content).is_ok());
    }

    #[test]
    fn test_content_text_empty_fails() {
        assert!(validate_content(&Content::text("")).is_err());
    }

    #[test]
    fn test_content_text_not_json_fails() {
        assert!(validate_content(&Content::text("Converted to: out.mp3")).is_err());
    }

    #[test]
    fn test_empty_content_non_error_fails() {
        let result = CallToolResult::success(vec![]);
        assert!(validate_tool_result(&result).is_err());
    }

    #[tokio::test]
    async fn test_every_tool_returns_json_text() {
        let dir = tempfile::tempdir().unwrap();
        let server = test_server(dir.path()).await;

        let calls = [
            ("list_cdp_programs", None),
            ("get_cdp_usage", args(json!({"program": "blur"}))),
            ("execute_cdp", args(json!({"command": ["blur", "blur", "in.ana", "out.ana", "50"]}))),
            ("create_data_file", args(json!({"filepath": "times.txt", "content": "0.0\n1.5"}))),
            ("analyze_sound", args(json!({"filepath": "absent.wav"}))),
            ("prepare_spectral", args(json!({"input_file": "take.ana", "output_file": "x.ana"}))),
        ];

        for (tool, arguments) in calls {
            let result = server.dispatch(tool, arguments).await.unwrap();
            assert_eq!(result.content.len(), 1, "{tool}");
            let validation = validate_tool_result(&result);
            assert!(validation.is_ok(), "{tool}: {:?}", validation.err());
        }
    }

    #[tokio::test]
    async fn test_json_is_pretty_printed() {
        let dir = tempfile::tempdir().unwrap();
        let server = test_server(dir.path()).await;
        let result = server
            .dispatch("create_data_file", args(json!({"filepath": "a.txt", "content": "1"})))
            .await
            .unwrap();
        match &result.content[0].raw {
            RawContent::Text(text) => assert!(text.text.contains("\n  \"")),
            other => panic!("unexpected content {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_execute_report_fields() {
        let dir = tempfile::tempdir().unwrap();
        let server = test_server(dir.path()).await;
        let result = server
            .dispatch("execute_cdp", args(json!({"command": ["housekeep", "chans", "4", "stereo.wav", "mono.wav"]})))
            .await
            .unwrap();
        let body = body(&result);
        for key in ["status", "exit_code", "command", "stdout", "stderr", "verdict", "output_file"] {
            assert!(body.get(key).is_some(), "missing {key}");
        }
        assert_eq!(body["command"], "housekeep chans 4 stereo.wav mono.wav");
        assert_eq!(body["output_file"], "mono.wav");
        assert_eq!(body["verdict"], "failed");
        assert!(body.get("output_exists").is_none());
    }

    #[tokio::test]
    async fn test_data_file_report_fields() {
        let dir = tempfile::tempdir().unwrap();
        let server = test_server(dir.path()).await;
        let content = "5 5 5 5\n0.0 0.1 0.2 0.3\n";
        let result = server
            .dispatch("create_data_file", args(json!({"filepath": "tess.txt", "content": content})))
            .await
            .unwrap();
        let body = body(&result);
        assert_eq!(body["status"], "success");
        assert_eq!(body["lines"], 2);
        assert_eq!(body["size"], content.len());
        assert_eq!(body["preview"], content);
    }

    #[tokio::test]
    async fn test_analyze_missing_file_body() {
        let dir = tempfile::tempdir().unwrap();
        let server = test_server(dir.path()).await;
        let result = server
            .dispatch("analyze_sound", args(json!({"filepath": "absent.wav"})))
            .await
            .unwrap();
        assert_eq!(body(&result), json!({"error": "File not found: absent.wav"}));
    }

    #[tokio::test]
    async fn test_usage_report_of_missing_program() {
        let dir = tempfile::tempdir().unwrap();
        let server = test_server(dir.path()).await;
        let result = server
            .dispatch("get_cdp_usage", args(json!({"program": "blur", "subprogram": "blur"})))
            .await
            .unwrap();
        let body = body(&result);
        assert_eq!(body["program"], "blur");
        assert_eq!(body["subprogram"], "blur");
        assert_eq!(body["exit_code"], -1);
        assert!(body["usage_text"].as_str().unwrap().contains("not found"));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Any serializable map survives the text content round trip as JSON.
        #[test]
        fn json_text_content_is_valid(key in "[a-z_]{1,10}", value in "[ -~]{0,50}") {
            let body = serde_json::json!({ key: value });
            let text = serde_json::to_string_pretty(&body).unwrap();
            let result = CallToolResult::success(vec![Content::text(text)]);
            prop_assert!(validate_tool_result(&result).is_ok());
        }

        /// Free text is never accepted as a tool body.
        #[test]
        fn plain_text_is_rejected(text in "[a-zA-Z][a-zA-Z ]{0,40}") {
            prop_assume!(!["true", "false", "null"].contains(&text.trim()));
            let result = CallToolResult::success(vec![Content::text(text)]);
            prop_assert!(validate_tool_result(&result).is_err());
        }
    }
}
