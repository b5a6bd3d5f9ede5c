//! Catalog of surveillance detection assets discovered on disk.
//!
//! A scan walks the configured roots and turns every detection config file
//! and test-definition file into a uniform [`CatalogRecord`]. The catalog is
//! in-memory only and rebuilt on every scan.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub mod annotations;
pub mod scanner;

pub use scanner::CatalogScanner;

// ---------------------------------------------------------------------------
// Record kinds and parameter literals
// ---------------------------------------------------------------------------

/// What kind of file a record was parsed from, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Detection configuration file (`# @key: value` comment metadata).
    Config,
    /// Test-definition source file (`@Meta` / `@Parameter` annotations).
    TestDefinition,
}

/// Declared type of a test parameter, inferred from its initializer literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    /// Quoted string literal.
    String,
    /// Bare integer literal.
    Integer,
    /// Literal containing a decimal point.
    Float,
    /// `true` or `false`.
    Boolean,
    /// Explicit `null` or no readable initializer; accepts any value.
    Null,
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Null => "null",
        };
        f.write_str(name)
    }
}

/// A parameter value as written in the source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Contents of a quoted string literal.
    Str(String),
    /// Integer literal.
    Int(i64),
    /// Floating-point literal.
    Float(f64),
    /// Boolean literal.
    Bool(bool),
    /// `null`, or a parameter with no readable initializer.
    Null,
}

impl ParamValue {
    /// The [`ParamType`] this value belongs to.
    pub fn kind(&self) -> ParamType {
        match self {
            Self::Str(_) => ParamType::String,
            Self::Int(_) => ParamType::Integer,
            Self::Float(_) => ParamType::Float,
            Self::Bool(_) => ParamType::Boolean,
            Self::Null => ParamType::Null,
        }
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) if v.fract() == 0.0 => write!(f, "{v:.1}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Null => f.write_str("null"),
        }
    }
}

/// A parameter declared by a test definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Parameter name as given in the `@Parameter("…")` annotation.
    pub name: String,
    /// Type inferred from the initializer literal.
    pub declared_type: ParamType,
    /// Default value taken from the initializer literal.
    pub default: ParamValue,
}

// ---------------------------------------------------------------------------
// CatalogRecord
// ---------------------------------------------------------------------------

/// One scanned file, with whatever metadata could be parsed out of it.
///
/// A file with malformed or missing metadata still yields a record: the
/// path and raw content alone keep it reachable through filename and
/// free-text matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    /// Path the record was parsed from.
    pub source_path: PathBuf,
    /// Config or test definition.
    pub kind: RecordKind,
    /// `@name` metadata, if declared.
    pub declared_name: Option<String>,
    /// `@report_type` metadata, if declared.
    pub report_type: Option<String>,
    /// `@domain` metadata, if declared.
    pub domain: Option<String>,
    /// Accumulated `@capability` entries.
    pub capabilities: BTreeSet<String>,
    /// Accumulated `@tags` entries (comma-separated lists, merged).
    pub tags: BTreeSet<String>,
    /// `@config_file` metadata on a test definition, if declared.
    pub linked_config: Option<String>,
    /// Declared parameters (test definitions only).
    pub parameters: Vec<ParameterSpec>,
    /// Parse diagnostics; never fatal.
    pub issues: Vec<String>,
    /// Full file text, used for free-text matching.
    pub raw_content: String,
}

impl CatalogRecord {
    /// Name used for matching: the declared `@name`, or the file stem.
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.declared_name {
            return name.clone();
        }
        self.source_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
