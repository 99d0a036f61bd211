//! CDP handler: the operations behind each MCP tool.
//!
//! This module provides the `CdpHandler` struct, the tool parameter types and
//! the report types serialized back to the agent. Tool-level failures are
//! returned as [`ToolFailure`] bodies rather than protocol errors.

use crate::catalog::{self, ProgramCatalog};
use crate::executor::{
    ExecutionResult, Executor, NO_EXIT_CODE, UsageProbe, Verdict, reported_output_file,
};
use crate::sound::{self, SoundInfo};
use cdp_mcp_common::config::Config;
use cdp_mcp_common::error::Error;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

// =============================================================================
// Constants
// =============================================================================

/// Default FFT window for `prepare_spectral`.
pub const DEFAULT_WINDOW_SIZE: u32 = 2048;

/// Smallest accepted PVOC window.
pub const MIN_WINDOW_SIZE: u32 = 64;

/// Largest accepted PVOC window.
pub const MAX_WINDOW_SIZE: u32 = 8192;

/// Characters of content echoed back by `create_data_file`.
pub const PREVIEW_CHARS: usize = 200;

/// Extension of PVOC analysis files.
pub const SPECTRAL_EXTENSION: &str = ".ana";

// =============================================================================
// Parameter Types
// =============================================================================

/// Parameters for probing a program's usage text.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct GetUsageParams {
    /// CDP program name (e.g. "blur", "modify").
    pub program: String,
    /// Optional sub-program (e.g. "brassage" for modify).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subprogram: Option<String>,
}

/// Parameters for running a CDP command.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ExecuteParams {
    /// Complete command as an array, program first
    /// (e.g. ["blur", "blur", "in.ana", "out.ana", "50"]).
    pub command: Vec<String>,
}

/// Parameters for writing a data file.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct CreateDataFileParams {
    /// Output path. Relative paths land in the scratch directory.
    pub filepath: String,
    /// Exact text content to write.
    pub content: String,
}

/// Parameters for inspecting a sound file.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct AnalyzeSoundParams {
    /// Path to the sound file.
    pub filepath: String,
}

/// Parameters for PVOC analysis of a sound file.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct PrepareSpectralParams {
    /// Input sound file.
    pub input_file: String,
    /// Output analysis file (.ana).
    pub output_file: String,
    /// FFT window size, a power of two from 64 to 8192. Default: 2048.
    #[serde(default = "default_window_size")]
    pub window_size: u32,
}

fn default_window_size() -> u32 {
    DEFAULT_WINDOW_SIZE
}

// =============================================================================
// Validation
// =============================================================================

/// Validation error details.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field that failed validation.
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl CreateDataFileParams {
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        if self.filepath.trim().is_empty() {
            return Err(vec![ValidationError {
                field: "filepath".to_string(),
                message: "Path cannot be empty".to_string(),
            }]);
        }
        Ok(())
    }
}

impl PrepareSpectralParams {
    /// Check paths and window size.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.input_file.trim().is_empty() {
            errors.push(ValidationError {
                field: "input_file".to_string(),
                message: "Input path cannot be empty".to_string(),
            });
        }

        if self.output_file.trim().is_empty() {
            errors.push(ValidationError {
                field: "output_file".to_string(),
                message: "Output path cannot be empty".to_string(),
            });
        }

        if !is_valid_window(self.window_size) {
            errors.push(ValidationError {
                field: "window_size".to_string(),
                message: format!(
                    "must be a power of two between {} and {}, got {}",
                    MIN_WINDOW_SIZE, MAX_WINDOW_SIZE, self.window_size
                ),
            });
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Power of two within the PVOC window range.
pub fn is_valid_window(size: u32) -> bool {
    size.is_power_of_two() && (MIN_WINDOW_SIZE..=MAX_WINDOW_SIZE).contains(&size)
}

// =============================================================================
// Output Types
// =============================================================================

/// Failure body returned in place of a tool's normal report.
///
/// `status` is omitted for tools whose failures carry only `error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolFailure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub error: String,
}

impl ToolFailure {
    /// `{"status": "failed", "error": ...}`
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: Some(Verdict::Failed.status().to_string()),
            error: error.into(),
        }
    }

    /// `{"error": ...}`
    pub fn error(error: impl Into<String>) -> Self {
        Self {
            status: None,
            error: error.into(),
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Usage text of one program along with hints about its shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageReport {
    pub program: String,
    /// Sub-program name, or `"none"`.
    pub subprogram: String,
    pub usage_text: String,
    pub exit_code: i32,
    #[serde(default, skip_serializing_if = "is_false")]
    pub has_usage: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub has_modes: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub has_flags: bool,
    /// Set when the program repeats its own name as first argument.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub timed_out: bool,
}

impl UsageReport {
    /// Build the report for a finished probe.
    ///
    /// Hints are only derived from text the program itself printed.
    pub fn from_probe(program: &str, subprogram: Option<&str>, probe: &UsageProbe) -> Self {
        let text = probe.text();
        let mut report = Self {
            program: program.to_string(),
            subprogram: subprogram.unwrap_or("none").to_string(),
            usage_text: text.to_string(),
            exit_code: probe.exit_code(),
            has_usage: false,
            has_modes: false,
            has_flags: false,
            note: None,
            timed_out: matches!(probe, UsageProbe::TimedOut),
        };

        if matches!(probe, UsageProbe::Completed { .. }) && !text.is_empty() {
            report.has_usage = text.contains("USAGE:") || text.contains("Usage:");
            report.has_modes = text.contains("MODES:") || text.contains("Modes:");
            report.has_flags = ["-", "FLAGS:", "Options:"].iter().any(|f| text.contains(f));
            let double = format!("{program} {program}");
            if text.to_lowercase().contains(&double) {
                report.note = Some(format!("This program uses double syntax: {double}"));
            }
        }

        report
    }
}

/// Result of `execute_cdp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteReport {
    /// `"success"` or `"failed"`.
    pub status: String,
    pub exit_code: i32,
    /// The command array joined by spaces.
    pub command: String,
    pub stdout: String,
    pub stderr: String,
    pub verdict: Verdict,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub output_exists: bool,
}

impl ExecuteReport {
    fn from_result(command: &[String], result: ExecutionResult) -> Self {
        Self {
            status: result.verdict.status().to_string(),
            exit_code: result.exit_code,
            command: command.join(" "),
            stdout: result.stdout,
            stderr: result.stderr,
            verdict: result.verdict,
            output_file: None,
            output_exists: false,
        }
    }

    /// A run that never produced an exit status. Always failed.
    fn from_error(command: &[String], error: &Error) -> Self {
        Self {
            status: Verdict::Failed.status().to_string(),
            exit_code: NO_EXIT_CODE,
            command: command.join(" "),
            stdout: String::new(),
            stderr: error.to_string(),
            verdict: Verdict::Failed,
            output_file: None,
            output_exists: false,
        }
    }

    pub fn is_success(&self) -> bool {
        self.verdict.is_success()
    }
}

/// Result of `create_data_file`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataFileReport {
    pub status: String,
    /// Where the file was written, after scratch resolution.
    pub filepath: String,
    /// Newline-separated segments of the trimmed content.
    pub lines: usize,
    /// Content length in bytes.
    pub size: usize,
    pub preview: String,
}

/// Result of `prepare_spectral`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SpectralReport {
    /// The input was already an analysis file; nothing ran.
    AlreadySpectral {
        status: String,
        message: String,
        ana_file: String,
    },
    /// PVOC ran; `ana_file` is set on success.
    Analyzed {
        #[serde(flatten)]
        run: ExecuteReport,
        #[serde(skip_serializing_if = "Option::is_none")]
        ana_file: Option<String>,
    },
}

/// Number of lines `create_data_file` reports for `content`.
pub fn count_lines(content: &str) -> usize {
    content.trim().split('\n').count()
}

/// First [`PREVIEW_CHARS`] characters, with `...` appended when cut.
pub fn preview(content: &str) -> String {
    match content.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}

// =============================================================================
// CdpHandler
// =============================================================================

/// Handler for the CDP tools.
#[derive(Debug, Clone)]
pub struct CdpHandler {
    /// Application configuration.
    pub config: Config,
    executor: Executor,
}

impl CdpHandler {
    /// Create a handler and make sure the scratch directory exists.
    ///
    /// # Errors
    /// Returns an error if the scratch directory cannot be created.
    #[instrument(level = "debug", name = "cdp_handler_new", skip_all)]
    pub async fn new(config: Config) -> Result<Self, Error> {
        debug!(scratch_dir = %config.scratch_dir.display(), "Initializing CdpHandler");
        tokio::fs::create_dir_all(&config.scratch_dir).await?;

        let executor = Executor::new(&config);
        Ok(Self { config, executor })
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// List installed programs by category.
    #[instrument(level = "info", skip(self))]
    pub async fn list_programs(&self) -> ProgramCatalog {
        catalog::scan(&self.config.cdp_path).await
    }

    /// Run a program bare to capture its usage text.
    #[instrument(level = "info", skip(self), fields(program = %params.program))]
    pub async fn get_usage(&self, params: GetUsageParams) -> UsageReport {
        let subprogram = params.subprogram.as_deref().filter(|s| !s.is_empty());
        let probe = self.executor.probe_usage(&params.program, subprogram).await;
        UsageReport::from_probe(&params.program, subprogram, &probe)
    }

    /// Execute a command array and judge the outcome.
    #[instrument(level = "info", skip(self), fields(program = params.command.first().map(String::as_str)))]
    pub async fn execute(&self, params: ExecuteParams) -> Result<ExecuteReport, ToolFailure> {
        let command = params.command;
        if command.is_empty() {
            return Err(ToolFailure::failed("Empty command array provided"));
        }

        let mut report = match self.executor.run(&command).await {
            Ok(result) => ExecuteReport::from_result(&command, result),
            Err(e) => {
                warn!(error = %e, "Command did not run");
                ExecuteReport::from_error(&command, &e)
            }
        };

        if let Some(output) = reported_output_file(&command) {
            report.output_exists = self.executor.resolve_output(output).exists();
            report.output_file = Some(output.to_string());
        }

        Ok(report)
    }

    /// Write a text data file for programs that read parameters from one.
    #[instrument(level = "info", skip(self, params), fields(filepath = %params.filepath))]
    pub async fn create_data_file(
        &self,
        params: CreateDataFileParams,
    ) -> Result<DataFileReport, ToolFailure> {
        params.validate().map_err(|errors| {
            ToolFailure::failed(format!("Failed to create data file: {}", join_errors(&errors)))
        })?;

        let path = self.config.resolve_in_scratch(&params.filepath);
        write_file(&path, &params.content)
            .await
            .map_err(|e| ToolFailure::failed(format!("Failed to create data file: {}", e)))?;

        info!(path = %path.display(), bytes = params.content.len(), "Data file written");

        Ok(DataFileReport {
            status: "success".to_string(),
            filepath: path.display().to_string(),
            lines: count_lines(&params.content),
            size: params.content.len(),
            preview: preview(&params.content),
        })
    }

    /// Report duration, layout and peak level of a sound file.
    #[instrument(level = "info", skip(self), fields(filepath = %params.filepath))]
    pub async fn analyze_sound(&self, params: AnalyzeSoundParams) -> Result<SoundInfo, ToolFailure> {
        let path = self.config.resolve_in_scratch(&params.filepath);
        if !path.exists() {
            return Err(ToolFailure::error(format!("File not found: {}", params.filepath)));
        }

        tokio::task::spawn_blocking(move || sound::analyze(&path))
            .await
            .map_err(|e| ToolFailure::error(format!("Analysis task failed: {}", e)))?
            .map_err(|e| ToolFailure::error(e.to_string()))
    }

    /// Run PVOC analysis to turn a sound file into an `.ana` spectral file.
    #[instrument(level = "info", skip(self))]
    pub async fn prepare_spectral(
        &self,
        params: PrepareSpectralParams,
    ) -> Result<SpectralReport, ToolFailure> {
        if params.input_file.ends_with(SPECTRAL_EXTENSION) {
            return Ok(SpectralReport::AlreadySpectral {
                status: "info".to_string(),
                message: "Input is already a spectral file".to_string(),
                ana_file: params.input_file,
            });
        }

        params
            .validate()
            .map_err(|errors| ToolFailure::failed(join_errors(&errors)))?;

        if !self.config.resolve_in_scratch(&params.input_file).exists() {
            return Err(ToolFailure::failed(format!(
                "Input file not found: {}",
                params.input_file
            )));
        }

        let command = vec![
            "pvoc".to_string(),
            "anal".to_string(),
            "1".to_string(),
            params.input_file,
            params.output_file.clone(),
            format!("-c{}", params.window_size),
        ];
        let run = self.execute(ExecuteParams { command }).await?;
        let ana_file = run.is_success().then_some(params.output_file);

        Ok(SpectralReport::Analyzed { run, ana_file })
    }
}

async fn write_file(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, content).await
}

// =============================================================================
// Tests
// =============================================================================


// =============================================================================
// Property Tests
// =============================================================================
