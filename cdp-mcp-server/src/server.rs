//! MCP Server implementation for the CDP server.
//!
//! This module provides the MCP server handler that exposes the CDP tools
//! and the two documentation resources.

use crate::handler::{
    AnalyzeSoundParams, CdpHandler, CreateDataFileParams, ExecuteParams, GetUsageParams,
    PrepareSpectralParams,
};
use crate::resources;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    model::{
        CallToolResult, Content, ListResourcesResult, ReadResourceResult, ResourceContents,
        ServerCapabilities, ServerInfo,
    },
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, info};

/// Tool names, in listing order.
pub const TOOL_NAMES: &[&str] = &[
    "list_cdp_programs",
    "get_cdp_usage",
    "execute_cdp",
    "create_data_file",
    "analyze_sound",
    "prepare_spectral",
];

/// `list_cdp_programs` takes no arguments.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct ListProgramsParams {}

/// MCP Server for the CDP toolsuite.
#[derive(Clone)]
pub struct CdpServer {
    handler: Arc<CdpHandler>,
}

impl CdpServer {
    /// Wrap an initialized handler.
    pub fn new(handler: CdpHandler) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    pub fn handler(&self) -> &CdpHandler {
        &self.handler
    }

    /// List CDP programs by category.
    pub async fn list_cdp_programs(&self) -> Result<CallToolResult, McpError> {
        info!("Listing CDP programs");
        let catalog = self.handler.list_programs().await;
        json_result(&catalog)
    }

    /// Capture a program's usage text.
    pub async fn get_cdp_usage(&self, params: GetUsageParams) -> Result<CallToolResult, McpError> {
        info!(program = %params.program, subprogram = ?params.subprogram, "Getting CDP usage");
        let report = self.handler.get_usage(params).await;
        json_result(&report)
    }

    /// Execute a command array.
    pub async fn execute_cdp(&self, params: ExecuteParams) -> Result<CallToolResult, McpError> {
        info!(args = params.command.len(), "Executing CDP command");
        match self.handler.execute(params).await {
            Ok(report) => json_result(&report),
            Err(failure) => json_result(&failure),
        }
    }

    /// Write a data file.
    pub async fn create_data_file(
        &self,
        params: CreateDataFileParams,
    ) -> Result<CallToolResult, McpError> {
        info!(filepath = %params.filepath, "Creating data file");
        match self.handler.create_data_file(params).await {
            Ok(report) => json_result(&report),
            Err(failure) => json_result(&failure),
        }
    }

    /// Inspect a sound file.
    pub async fn analyze_sound(&self, params: AnalyzeSoundParams) -> Result<CallToolResult, McpError> {
        info!(filepath = %params.filepath, "Analyzing sound");
        match self.handler.analyze_sound(params).await {
            Ok(info) => json_result(&info),
            Err(failure) => json_result(&failure),
        }
    }

    /// PVOC-analyze a sound file.
    pub async fn prepare_spectral(
        &self,
        params: PrepareSpectralParams,
    ) -> Result<CallToolResult, McpError> {
        info!(input = %params.input_file, output = %params.output_file, "Preparing spectral file");
        match self.handler.prepare_spectral(params).await {
            Ok(report) => json_result(&report),
            Err(failure) => json_result(&failure),
        }
    }

    /// Route a tool call by name. Argument errors surface as `invalid_params`.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> Result<CallToolResult, McpError> {
        match name {
            "list_cdp_programs" => self.list_cdp_programs().await,
            "get_cdp_usage" => {
                let tool_params: GetUsageParams = parse_params(arguments)?;
                self.get_cdp_usage(tool_params).await
            }
            "execute_cdp" => {
                let tool_params: ExecuteParams = parse_params(arguments)?;
                self.execute_cdp(tool_params).await
            }
            "create_data_file" => {
                let tool_params: CreateDataFileParams = parse_params(arguments)?;
                self.create_data_file(tool_params).await
            }
            "analyze_sound" => {
                let tool_params: AnalyzeSoundParams = parse_params(arguments)?;
                self.analyze_sound(tool_params).await
            }
            "prepare_spectral" => {
                let tool_params: PrepareSpectralParams = parse_params(arguments)?;
                self.prepare_spectral(tool_params).await
            }
            _ => Err(McpError::invalid_params(format!("Unknown tool: {}", name), None)),
        }
    }
}

impl ServerHandler for CdpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "CDP sound transformation server. List programs, read their usage text, \
                 create data files and execute exact command arrays. \
                 See cdp://workflow for the recommended sequence."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _params: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<rmcp::model::ListToolsResult, McpError>> + Send + '_ {
        async move {
            use rmcp::model::ListToolsResult;

            let tools = tool_definitions();

            Ok(ListToolsResult {
                tools,
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn call_tool(
        &self,
        params: rmcp::model::CallToolRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move { self.dispatch(params.name.as_ref(), params.arguments).await }
    }

    fn list_resources(
        &self,
        _params: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        async move {
            debug!("Listing resources");

            let resources = resources::DOCUMENTS
                .iter()
                .map(|doc| rmcp::model::Resource {
                    raw: rmcp::model::RawResource {
                        uri: doc.uri.to_string(),
                        name: doc.name.to_string(),
                        title: None,
                        description: Some(doc.description.to_string()),
                        mime_type: Some(resources::MARKDOWN_MIME.to_string()),
                        size: None,
                        icons: None,
                        meta: None,
                    },
                    annotations: None,
                })
                .collect();

            Ok(ListResourcesResult {
                resources,
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn read_resource(
        &self,
        params: rmcp::model::ReadResourceRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        async move {
            let uri = &params.uri;
            debug!(uri = %uri, "Reading resource");

            let doc = resources::find(uri).ok_or_else(|| {
                McpError::resource_not_found(format!("Unknown resource: {}", uri), None)
            })?;

            Ok(ReadResourceResult {
                contents: vec![ResourceContents::text(doc.body, uri.clone())],
            })
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Definitions of every tool, in listing order.
pub fn tool_definitions() -> Vec<rmcp::model::Tool> {
    vec![
        create_tool::<ListProgramsParams>(
            "list_cdp_programs",
            "List all available CDP programs organized by category.",
        ),
        create_tool::<GetUsageParams>(
            "get_cdp_usage",
            "Get the raw usage text of a CDP program by running it without arguments, \
             optionally with a sub-program.",
        ),
        create_tool::<ExecuteParams>(
            "execute_cdp",
            "Execute a CDP command given as an array of strings, program first. \
             No interpretation is applied.",
        ),
        create_tool::<CreateDataFileParams>(
            "create_data_file",
            "Create a text data file for CDP programs that read parameters from one.",
        ),
        create_tool::<AnalyzeSoundParams>(
            "analyze_sound",
            "Report duration, sample rate, channels, peak amplitude and format of a sound file.",
        ),
        create_tool::<PrepareSpectralParams>(
            "prepare_spectral",
            "Convert a sound file to a PVOC spectral (.ana) file.",
        ),
    ]
}

/// Create a tool definition from a parameter type.
pub(crate) fn create_tool<T: JsonSchema>(name: &'static str, description: &'static str) -> rmcp::model::Tool {
    use schemars::schema_for;

    let schema = schema_for!(T);
    let schema_value = serde_json::to_value(&schema).unwrap_or_default();

    let input_schema = match schema_value {
        serde_json::Value::Object(map) => Arc::new(map),
        _ => Arc::new(serde_json::Map::new()),
    };

    rmcp::model::Tool {
        name: Cow::Borrowed(name),
        description: Some(Cow::Borrowed(description)),
        input_schema,
        annotations: None,
        icons: None,
        meta: None,
        output_schema: None,
        title: None,
    }
}

/// Parse tool parameters from JSON arguments.
fn parse_params<T: for<'de> Deserialize<'de>>(
    arguments: Option<serde_json::Map<String, serde_json::Value>>,
) -> Result<T, McpError> {
    arguments
        .map(|args| serde_json::from_value(serde_json::Value::Object(args)))
        .transpose()
        .map_err(|e| McpError::invalid_params(format!("Invalid parameters: {}", e), None))?
        .ok_or_else(|| McpError::invalid_params("Missing parameters", None))
}

/// Pretty-printed JSON body as a successful tool result.
fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| {
        McpError::internal_error(format!("Failed to serialize result: {}", e), None)
    })?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

// =============================================================================
// Tests
// =============================================================================
