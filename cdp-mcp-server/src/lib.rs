//! CDP MCP Server Library
//!
//! MCP server exposing the CDP command-line audio toolsuite.
//!
//! Tools:
//! - `list_cdp_programs` - List installed programs by category
//! - `get_cdp_usage` - Capture a program's usage text
//! - `execute_cdp` - Run an exact command array
//! - `create_data_file` - Write a parameter data file
//! - `analyze_sound` - Inspect a sound file
//! - `prepare_spectral` - PVOC-analyze a sound into an `.ana` file
//!
//! Resources: `cdp://workflow`, `cdp://quickstart`.

pub mod catalog;
pub mod executor;
pub mod handler;
pub mod resources;
pub mod server;
pub mod sound;

pub use catalog::ProgramCatalog;
pub use executor::{ExecutionResult, Executor, UsageProbe, Verdict};
pub use handler::{
    AnalyzeSoundParams, CdpHandler, CreateDataFileParams, DataFileReport, ExecuteParams,
    ExecuteReport, GetUsageParams, PrepareSpectralParams, SpectralReport, ToolFailure,
    UsageReport,
};
pub use server::CdpServer;
pub use sound::SoundInfo;
