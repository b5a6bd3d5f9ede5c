//! Parameter inspection and side-effect-free change proposals.
//!
//! A [`ParameterSet`] is the declared parameters of one test definition.
//! [`ParameterSet::propose`] validates a change set in full and returns an
//! updated preview; neither the receiver nor the source file is touched,
//! and a proposal with any invalid entry applies nothing.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::catalog::annotations::{classify_literal, is_float_literal, is_integer_literal};
use crate::catalog::{CatalogRecord, ParamType, ParamValue};

/// A single rejected entry in a proposed parameter change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidParameter {
    /// Parameter name as proposed.
    pub name: String,
    /// Why it was rejected.
    pub reason: String,
}

impl std::fmt::Display for InvalidParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.reason)
    }
}

/// Parameter validation failure, carrying every invalid entry of the
/// proposal rather than just the first.
#[derive(Debug, thiserror::Error)]
pub enum ParameterError {
    /// One or more proposed changes were rejected.
    #[error("{} invalid parameter change(s)", .0.len())]
    Validation(Vec<InvalidParameter>),
}

/// One declared parameter with its current value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterEntry {
    /// Value in effect; equals `default` until a proposal changes it.
    pub current: ParamValue,
    /// Type inferred from the declaration.
    pub declared_type: ParamType,
    /// Declared default value.
    pub default: ParamValue,
}

/// Declared parameters of one test definition, keyed by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    /// Test definition the set was loaded from.
    pub source: PathBuf,
    /// Entries keyed by parameter name.
    pub entries: BTreeMap<String, ParameterEntry>,
}

impl ParameterSet {
    /// Build the parameter set declared by a catalog record.
    ///
    /// Config records declare no parameters, so they produce an empty set.
    pub fn from_record(record: &CatalogRecord) -> Self {
        let entries = record
            .parameters
            .iter()
            .map(|spec| {
                (
                    spec.name.clone(),
                    ParameterEntry {
                        current: spec.default.clone(),
                        declared_type: spec.declared_type,
                        default: spec.default.clone(),
                    },
                )
            })
            .collect();
        Self {
            source: record.source_path.clone(),
            entries,
        }
    }

    /// Validate a proposed change set and return the updated preview.
    ///
    /// Every change is checked: the name must be declared, and the value
    /// must be lexically compatible with the declared type. Any invalid
    /// entry rejects the whole proposal, with all invalid entries reported
    /// together. On success a new set is returned with updated `current`
    /// values; the receiver and the underlying file are untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::Validation`] listing every rejected entry.
    pub fn propose(
        &self,
        changes: &BTreeMap<String, String>,
    ) -> Result<ParameterSet, ParameterError> {
        let mut invalid = Vec::new();
        let mut accepted: Vec<(String, ParamValue)> = Vec::new();

        for (name, raw) in changes {
            let Some(entry) = self.entries.get(name) else {
                invalid.push(InvalidParameter {
                    name: name.clone(),
                    reason: "not a declared parameter".to_owned(),
                });
                continue;
            };
            match validate_value(entry.declared_type, raw) {
                Ok(value) => accepted.push((name.clone(), value)),
                Err(reason) => invalid.push(InvalidParameter {
                    name: name.clone(),
                    reason,
                }),
            }
        }

        if !invalid.is_empty() {
            return Err(ParameterError::Validation(invalid));
        }

        let mut updated = self.clone();
        for (name, value) in accepted {
            if let Some(entry) = updated.entries.get_mut(&name) {
                entry.current = value;
            }
        }
        Ok(updated)
    }
}

/// Check a raw value against a declared type and convert it on success.
///
/// `Integer` takes an integer literal; `Float` takes integer or float
/// literals; `Boolean` takes `true`/`false`; `String` takes anything;
/// `Null`-typed parameters are untyped and take any value.
fn validate_value(declared_type: ParamType, raw: &str) -> Result<ParamValue, String> {
    match declared_type {
        ParamType::String => Ok(ParamValue::Str(raw.to_owned())),
        ParamType::Integer => {
            if !is_integer_literal(raw) {
                return Err(format!("expected an integer literal, got {raw:?}"));
            }
            raw.parse::<i64>()
                .map(ParamValue::Int)
                .map_err(|_| format!("integer out of range: {raw}"))
        }
        ParamType::Float => {
            if !is_integer_literal(raw) && !is_float_literal(raw) {
                return Err(format!("expected a numeric literal, got {raw:?}"));
            }
            raw.parse::<f64>()
                .map(ParamValue::Float)
                .map_err(|_| format!("unreadable numeric literal: {raw}"))
        }
        ParamType::Boolean => match raw {
            "true" => Ok(ParamValue::Bool(true)),
            "false" => Ok(ParamValue::Bool(false)),
            _ => Err(format!("expected true or false, got {raw:?}")),
        },
        ParamType::Null => Ok(coerce_untyped(raw)),
    }
}

/// Best-effort interpretation of a value for an untyped parameter.
fn coerce_untyped(raw: &str) -> ParamValue {
    match classify_literal(raw) {
        Some((_, value)) => value,
        None => ParamValue::Str(raw.to_owned()),
    }
}
