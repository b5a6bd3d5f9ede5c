//! Metadata annotation parsing.
//!
//! Config files declare metadata in `# @key: value` comment lines. Test
//! definitions declare it in `@Meta(key = "value")` annotations, and their
//! parameters in `@Parameter("name")` annotations whose field initializer
//! literal provides the default value and the inferred type. Both parsers
//! are pure: bad input produces diagnostics, never errors.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use super::{ParamType, ParamValue, ParameterSpec, RecordKind};

/// `# @key: value` comment annotation in a config file.
static CONFIG_ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*#\s*@([A-Za-z_][A-Za-z0-9_]*)\s*:\s*(.*?)\s*$")
        .expect("config annotation pattern compiles")
});

/// `@Meta(...)` annotation body in a test definition.
static META_ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@Meta\s*\(([^)]*)\)").expect("meta annotation pattern compiles"));

/// One `key = "value"` pair inside a `@Meta(...)` body.
static META_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_][A-Za-z0-9_]*)\s*=\s*"([^"]*)""#).expect("meta pair pattern compiles")
});

/// `@Parameter("name")` annotation in a test definition.
static PARAMETER_ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@Parameter\s*\(\s*"([^"]+)"\s*\)"#).expect("parameter annotation pattern compiles")
});

/// Bare integer literal, optional sign.
static INTEGER_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d+$").expect("integer literal pattern compiles"));

/// Literal containing a decimal point, optional sign.
static FLOAT_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.\d*|\.\d+)$").expect("float literal pattern compiles")
});

// ---------------------------------------------------------------------------
// Parsed metadata
// ---------------------------------------------------------------------------

/// Metadata fields shared by both record kinds, plus parse diagnostics.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MetadataFields {
    /// `@name`.
    pub declared_name: Option<String>,
    /// `@report_type`.
    pub report_type: Option<String>,
    /// `@domain`.
    pub domain: Option<String>,
    /// Accumulated `@capability` entries.
    pub capabilities: BTreeSet<String>,
    /// Accumulated `@tags` entries.
    pub tags: BTreeSet<String>,
    /// `@config_file` (test definitions only).
    pub linked_config: Option<String>,
    /// Unknown keys, empty values, unreadable literals.
    pub issues: Vec<String>,
}

impl MetadataFields {
    /// Apply one annotation assignment. The first value wins for scalar
    /// keys; unknown keys and empty values become issues, never errors.
    fn apply(&mut self, key: &str, value: &str, kind: RecordKind) {
        if value.is_empty() {
            self.issues.push(format!("empty value for @{key}"));
            return;
        }
        match key {
            "name" => {
                if self.declared_name.is_none() {
                    self.declared_name = Some(value.to_owned());
                }
            }
            "report_type" => {
                if self.report_type.is_none() {
                    self.report_type = Some(value.to_owned());
                }
            }
            "domain" => {
                if self.domain.is_none() {
                    self.domain = Some(value.to_owned());
                }
            }
            "capability" => {
                self.capabilities.insert(value.to_owned());
            }
            "tags" => {
                for tag in value.split(',') {
                    let tag = tag.trim();
                    if !tag.is_empty() {
                        self.tags.insert(tag.to_owned());
                    }
                }
            }
            "config_file" if kind == RecordKind::TestDefinition => {
                if self.linked_config.is_none() {
                    self.linked_config = Some(value.to_owned());
                }
            }
            _ => self.issues.push(format!("unknown metadata key: @{key}")),
        }
    }
}

/// Parsed metadata and declared parameters of a test-definition file.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TestMetadata {
    /// Annotation metadata.
    pub fields: MetadataFields,
    /// Parameters declared via `@Parameter`.
    pub parameters: Vec<ParameterSpec>,
}

// ---------------------------------------------------------------------------
// Parsers
// ---------------------------------------------------------------------------

/// Parse `# @key: value` comment annotations out of config file text.
pub fn parse_config_metadata(text: &str) -> MetadataFields {
    let mut fields = MetadataFields::default();
    for caps in CONFIG_ANNOTATION.captures_iter(text) {
        let (Some(key), Some(value)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        fields.apply(key.as_str(), value.as_str(), RecordKind::Config);
    }
    fields
}

/// Parse `@Meta` and `@Parameter` annotations out of test-definition text.
pub fn parse_test_metadata(text: &str) -> TestMetadata {
    let mut fields = MetadataFields::default();
    for annotation in META_ANNOTATION.captures_iter(text) {
        let Some(body) = annotation.get(1) else {
            continue;
        };
        for pair in META_PAIR.captures_iter(body.as_str()) {
            let (Some(key), Some(value)) = (pair.get(1), pair.get(2)) else {
                continue;
            };
            fields.apply(key.as_str(), value.as_str(), RecordKind::TestDefinition);
        }
    }

    let mut parameters = Vec::new();
    for caps in PARAMETER_ANNOTATION.captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let rest = text.get(whole.end()..).unwrap_or("");
        parameters.push(parameter_from_declaration(name.as_str(), rest, &mut fields.issues));
    }

    TestMetadata { fields, parameters }
}

/// Build a [`ParameterSpec`] from the field declaration that follows a
/// `@Parameter` annotation, reading the initializer literal up to the
/// terminating semicolon.
fn parameter_from_declaration(name: &str, rest: &str, issues: &mut Vec<String>) -> ParameterSpec {
    let declaration = rest.split(';').next().unwrap_or(rest);
    let Some(eq) = declaration.find('=') else {
        issues.push(format!("parameter {name} has no initializer"));
        return ParameterSpec {
            name: name.to_owned(),
            declared_type: ParamType::Null,
            default: ParamValue::Null,
        };
    };

    let literal = declaration.get(eq.saturating_add(1)..).unwrap_or("").trim();
    match classify_literal(literal) {
        Some((declared_type, default)) => ParameterSpec {
            name: name.to_owned(),
            declared_type,
            default,
        },
        None => {
            issues.push(format!("parameter {name} has an unreadable initializer: {literal}"));
            ParameterSpec {
                name: name.to_owned(),
                declared_type: ParamType::Null,
                default: ParamValue::Null,
            }
        }
    }
}

/// Whether `raw` reads as a bare integer literal.
pub(crate) fn is_integer_literal(raw: &str) -> bool {
    INTEGER_LITERAL.is_match(raw)
}

/// Whether `raw` reads as a literal with a decimal point.
pub(crate) fn is_float_literal(raw: &str) -> bool {
    FLOAT_LITERAL.is_match(raw)
}

/// Infer a parameter's declared type and default from its initializer
/// literal: quoted string, `true`/`false`, `null`, bare digits, or digits
/// with a decimal point. Anything else is unreadable.
pub(crate) fn classify_literal(literal: &str) -> Option<(ParamType, ParamValue)> {
    if let Some(inner) = literal.strip_prefix('"').and_then(|rest| rest.strip_suffix('"')) {
        return Some((ParamType::String, ParamValue::Str(inner.to_owned())));
    }
    match literal {
        "true" => return Some((ParamType::Boolean, ParamValue::Bool(true))),
        "false" => return Some((ParamType::Boolean, ParamValue::Bool(false))),
        "null" => return Some((ParamType::Null, ParamValue::Null)),
        _ => {}
    }

    let bare = strip_numeric_suffix(literal);
    if INTEGER_LITERAL.is_match(bare) {
        let value = bare.parse::<i64>().ok()?;
        return Some((ParamType::Integer, ParamValue::Int(value)));
    }
    if FLOAT_LITERAL.is_match(bare) {
        let value = bare.parse::<f64>().ok()?;
        return Some((ParamType::Float, ParamValue::Float(value)));
    }
    None
}

/// Drop a trailing Java numeric suffix (`L`, `f`, `d`) when one is present.
fn strip_numeric_suffix(literal: &str) -> &str {
    let stripped = literal
        .strip_suffix(|c: char| matches!(c, 'L' | 'l' | 'F' | 'f' | 'D' | 'd'))
        .unwrap_or(literal);
    if stripped.is_empty() {
        literal
    } else {
        stripped
    }
}
