//! CDP MCP Common Library
//!
//! Configuration, error handling, tracing and transport plumbing shared by
//! the CDP MCP server binary and its integration tests.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod error;
pub mod server;
pub mod tracing;
pub mod transport;


pub use config::{ArchTranslation, Config};
pub use error::{ConfigError, Error, Result};
pub use server::{McpServerBuilder, ServerError, shutdown_channel};
pub use transport::{Transport, TransportArgs, TransportMode};
