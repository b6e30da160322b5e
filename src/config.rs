//! Compile options and their TOML representation.
//!
//! ```toml
//! [limits]
//! max_depth = 256
//! max_nodes = 10000
//!
//! [naming]
//! subquery_alias = "anon"
//! ```
//!
//! Every key is optional; missing keys keep their defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum nesting depth accepted by the validator.
pub const MAX_REQUEST_DEPTH: usize = 256;
/// Maximum number of nodes accepted by the validator.
pub const MAX_REQUEST_NODES: usize = 10_000;
/// Base name of aliases given to derived tables.
pub const DEFAULT_SUBQUERY_ALIAS: &str = "anon";

/// Tunables for a compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Deepest request nesting accepted.
    pub max_depth: usize,
    /// Largest request (in nodes) accepted.
    pub max_nodes: usize,
    /// Base name for sub-select aliases (`<base>_<n>`).
    pub subquery_alias: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            max_depth: MAX_REQUEST_DEPTH,
            max_nodes: MAX_REQUEST_NODES,
            subquery_alias: DEFAULT_SUBQUERY_ALIAS.to_owned(),
        }
    }
}

impl CompileOptions {
    /// Parses options from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let raw: RawOptions = toml::from_str(text)?;
        raw.convert()
    }

    /// Loads options from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: RawOptions = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        raw.convert()
    }

    /// Renders the options as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        let raw = RawOptions {
            limits: RawLimits {
                max_depth: Some(self.max_depth),
                max_nodes: Some(self.max_nodes),
            },
            naming: RawNaming {
                subquery_alias: Some(self.subquery_alias.clone()),
            },
        };
        toml::to_string_pretty(&raw).map_err(|source| ConfigError::Serialize { source })
    }

    /// Writes the options to `path` as TOML.
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let serialized = self.to_toml_string()?;
        fs::write(path, serialized).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct RawOptions {
    #[serde(default)]
    limits: RawLimits,
    #[serde(default)]
    naming: RawNaming,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct RawLimits {
    max_depth: Option<usize>,
    max_nodes: Option<usize>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct RawNaming {
    subquery_alias: Option<String>,
}

impl RawOptions {
    fn convert(self) -> Result<CompileOptions, ConfigError> {
        let defaults = CompileOptions::default();
        let max_depth = self.limits.max_depth.unwrap_or(defaults.max_depth);
        if max_depth == 0 {
            return Err(ConfigError::invalid("limits.max_depth", "must be at least 1"));
        }
        let max_nodes = self.limits.max_nodes.unwrap_or(defaults.max_nodes);
        if max_nodes == 0 {
            return Err(ConfigError::invalid("limits.max_nodes", "must be at least 1"));
        }
        let subquery_alias = self
            .naming
            .subquery_alias
            .unwrap_or(defaults.subquery_alias);
        if !is_identifier(&subquery_alias) {
            return Err(ConfigError::invalid(
                "naming.subquery_alias",
                "must be a non-empty identifier",
            ));
        }
        Ok(CompileOptions {
            max_depth,
            max_nodes,
            subquery_alias,
        })
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Failures loading or storing [`CompileOptions`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The options file could not be read.
    #[error("failed to read compile options {path}: {source}")]
    Read {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// The options file is not valid TOML for this schema.
    #[error("failed to parse compile options {path}: {source}")]
    Parse {
        /// File that was parsed.
        path: PathBuf,
        /// Underlying TOML failure.
        source: toml::de::Error,
    },
    /// Inline TOML text could not be parsed.
    #[error("failed to parse compile options: {0}")]
    InvalidToml(#[from] toml::de::Error),
    /// The options could not be rendered as TOML.
    #[error("failed to serialize compile options: {source}")]
    Serialize {
        /// Underlying TOML failure.
        source: toml::ser::Error,
    },
    /// The options file could not be written.
    #[error("failed to write compile options {path}: {source}")]
    Write {
        /// File that was written.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// A value parsed but is out of range.
    #[error("compile option '{field}' {reason}")]
    Invalid {
        /// Dotted key of the offending option.
        field: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: &'static str) -> Self {
        ConfigError::Invalid { field, reason }
    }
}
