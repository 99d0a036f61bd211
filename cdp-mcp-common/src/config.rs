//! Configuration module for loading environment variables and settings.

use crate::error::ConfigError;
use std::fmt;
use std::path::{Path, PathBuf};

/// Install directory used when `CDP_PATH` is not set.
pub const DEFAULT_CDP_PATH: &str = "/usr/local/cdp/_cdprogs";

/// Name of the scratch directory created under the platform temp path.
pub const SCRATCH_DIR_NAME: &str = "cdp_mcp";

/// Default HTTP/SSE port.
pub const DEFAULT_PORT: u16 = 8080;

/// Binary translation applied in front of every CDP invocation.
///
/// The CDP release binaries are x86_64 only, so Apple Silicon hosts run them
/// through Rosetta via `arch -x86_64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArchTranslation {
    /// Run the program directly.
    #[default]
    Native,
    /// Prefix the invocation with `arch -x86_64`.
    Rosetta,
}

impl ArchTranslation {
    /// Pick the translation for a given OS / CPU pair
    /// (values as in `std::env::consts`).
    pub fn for_platform(os: &str, arch: &str) -> Self {
        match (os, arch) {
            ("macos", "aarch64") => ArchTranslation::Rosetta,
            _ => ArchTranslation::Native,
        }
    }

    /// Translation for the host this process runs on.
    pub fn detect() -> Self {
        Self::for_platform(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Launcher prefix; empty for native execution.
    pub fn prefix(&self) -> &'static [&'static str] {
        match self {
            ArchTranslation::Native => &[],
            ArchTranslation::Rosetta => &["arch", "-x86_64"],
        }
    }
}

impl fmt::Display for ArchTranslation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchTranslation::Native => write!(f, "native"),
            ArchTranslation::Rosetta => write!(f, "rosetta (arch -x86_64)"),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory containing the CDP executables
    pub cdp_path: PathBuf,
    /// Working directory for spawned programs and default data-file location
    pub scratch_dir: PathBuf,
    /// Launcher prefix for the host architecture
    pub translation: ArchTranslation,
    /// HTTP server port
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables and .env file.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` if CDP_PATH is set but empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let cdp_path = match lookup("CDP_PATH") {
            Some(path) if path.trim().is_empty() => {
                return Err(ConfigError::invalid_value("CDP_PATH", "path cannot be empty"));
            }
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CDP_PATH),
        };

        let scratch_dir = lookup("CDP_SCRATCH_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_scratch_dir);

        let port = lookup("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Ok(Self {
            cdp_path,
            scratch_dir,
            translation: ArchTranslation::detect(),
            port,
        })
    }

    /// Replace the install directory (used by the `--cdp-path` flag).
    pub fn with_cdp_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cdp_path = path.into();
        self
    }

    /// Resolve a possibly relative path against the scratch directory.
    pub fn resolve_in_scratch(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.scratch_dir.join(candidate)
        }
    }
}

/// `<platform temp>/cdp_mcp`
pub fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir().join(SCRATCH_DIR_NAME)
}
