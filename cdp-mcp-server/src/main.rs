//! CDP MCP Server
//!
//! MCP server for the CDP sound transformation programs.
//!
//! # Usage
//!
//! ```bash
//! # Run with stdio transport (default)
//! cdp-mcp-server
//!
//! # Point at a specific install
//! cdp-mcp-server --cdp-path /opt/cdp/_cdprogs
//!
//! # Run with HTTP transport
//! cdp-mcp-server --transport http --port 8080
//! ```

use anyhow::Result;
use cdp_mcp_common::tracing::init_tracing;
use cdp_mcp_common::{Config, McpServerBuilder, TransportArgs};
use cdp_mcp_server::{CdpHandler, CdpServer};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cdp-mcp-server")]
#[command(about = "MCP server for the CDP audio toolsuite")]
#[command(version)]
struct Args {
    #[command(flatten)]
    transport: TransportArgs,

    /// Directory containing the CDP executables (overrides CDP_PATH)
    #[arg(long)]
    cdp_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout belongs to the stdio transport
    init_tracing();

    let args = Args::parse();

    let mut config = Config::from_env()?;
    if let Some(path) = args.cdp_path {
        config = config.with_cdp_path(path);
    }

    tracing::info!(
        cdp_path = %config.cdp_path.display(),
        scratch_dir = %config.scratch_dir.display(),
        translation = %config.translation,
        "Starting cdp-mcp-server"
    );
    if !config.cdp_path.is_dir() {
        tracing::warn!(cdp_path = %config.cdp_path.display(), "CDP directory does not exist");
    }

    let transport = args.transport.into_transport(config.port);

    let handler = CdpHandler::new(config).await?;
    let server = CdpServer::new(handler);

    McpServerBuilder::new(server)
        .with_transport(transport)
        .run()
        .await?;

    Ok(())
}
