//! Program catalog: CDP executables grouped by category.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::path::Path;
use tracing::{debug, instrument, warn};

/// Bucket for executables not listed in [`CDP_CATEGORIES`].
pub const OTHER_CATEGORY: &str = "Other";

/// Key used when the install directory cannot be listed.
pub const ERROR_KEY: &str = "error";

/// Known CDP programs, by category, in display order.
pub const CDP_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Spectral Processing",
        &[
            "blur", "clean", "combine", "cross", "focus", "formants", "gate", "get", "hilite",
            "morph", "pitch", "spec", "strange", "stretch",
        ],
    ),
    (
        "Time Domain",
        &["modify", "distort", "envel", "extend", "filter", "grain", "sfedit", "zigzag"],
    ),
    ("Synthesis", &["synth", "texture", "fracture"]),
    (
        "Analysis and Utility",
        &["pvoc", "sndinfo", "housekeep", "submix", "mchshred"],
    ),
];

/// Category of a program name, [`OTHER_CATEGORY`] if it is not in the table.
pub fn category_of(program: &str) -> &'static str {
    CDP_CATEGORIES
        .iter()
        .find(|(_, programs)| programs.contains(&program))
        .map(|(category, _)| *category)
        .unwrap_or(OTHER_CATEGORY)
}

/// Ordered `category -> programs` mapping. Never holds an empty category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramCatalog {
    entries: Vec<(String, Vec<String>)>,
}

impl ProgramCatalog {
    /// Group program names into categories, sorted by name within each.
    pub fn categorize<I, S>(programs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = programs.into_iter().map(Into::into).collect();
        names.sort();
        names.dedup();

        let order = CDP_CATEGORIES
            .iter()
            .map(|(category, _)| *category)
            .chain(std::iter::once(OTHER_CATEGORY));

        let entries = order
            .map(|category| {
                let members: Vec<String> = names
                    .iter()
                    .filter(|name| category_of(name) == category)
                    .cloned()
                    .collect();
                (category.to_string(), members)
            })
            .filter(|(_, members)| !members.is_empty())
            .collect();

        Self { entries }
    }

    /// Catalog carrying a single error message, shaped like a category.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            entries: vec![(ERROR_KEY.to_string(), vec![message.into()])],
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.entries.as_slice(), [(key, _)] if key == ERROR_KEY)
    }

    pub fn get(&self, category: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, programs)| programs.as_slice())
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn program_count(&self) -> usize {
        if self.is_error() {
            0
        } else {
            self.entries.iter().map(|(_, programs)| programs.len()).sum()
        }
    }
}

impl Serialize for ProgramCatalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (category, programs) in &self.entries {
            map.serialize_entry(category, programs)?;
        }
        map.end()
    }
}

/// Whether a directory entry name can be a CDP program.
fn is_candidate_name(name: &str) -> bool {
    !name.starts_with('.') && !name.ends_with(".txt")
}

#[cfg(unix)]
fn is_executable(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &std::fs::Metadata) -> bool {
    true
}

/// List executable programs in `dir` and categorize them.
///
/// Failures come back as an error catalog rather than an `Err`.
#[instrument(level = "debug")]
pub async fn scan(dir: &Path) -> ProgramCatalog {
    if !dir.exists() {
        warn!(dir = %dir.display(), "CDP directory missing");
        return ProgramCatalog::error(format!("CDP directory not found: {}", dir.display()));
    }

    match list_executables(dir).await {
        Ok(programs) => {
            debug!(count = programs.len(), "Scanned CDP directory");
            ProgramCatalog::categorize(programs)
        }
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Failed to scan CDP directory");
            ProgramCatalog::error(format!("Failed to scan CDP directory: {}", e))
        }
    }
}

async fn list_executables(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut programs = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !is_candidate_name(&name) {
            continue;
        }
        // Follows symlinks, so linked binaries count
        let Ok(metadata) = tokio::fs::metadata(entry.path()).await else {
            continue;
        };
        if metadata.is_file() && is_executable(&metadata) {
            programs.push(name);
        }
    }

    Ok(programs)
}
