//! Tool surface for assistant integration.
//!
//! Each workflow is exposed as a named tool with a JSON Schema, dispatched
//! by name with JSON input, returning JSON output. `serve` runs the
//! JSON-lines loop over stdin/stdout that assistant hosts attach to.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use crate::agent::{SurveillanceAgent, WorkflowError};
use crate::search::MatchQuery;

/// JSON Schema definition for a tool an assistant can call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (must match a dispatch arm).
    pub name: String,
    /// Description shown to the assistant.
    pub description: String,
    /// JSON Schema object for the tool's parameters.
    pub input_schema: Value,
}

/// Errors produced by tool dispatch.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// No tool registered under this name.
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    /// The input JSON is missing or malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The underlying workflow rejected the request.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    /// The result could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Return definitions for all 6 workflow tools.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "process_inquiry".to_owned(),
            description: "Process a free-text surveillance inquiry: extract fields, \
                          rank matching detection configs and tests, and recommend next steps."
                .to_owned(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "text": {
                        "type": "string",
                        "description": "The inquiry text, e.g. a forwarded e-mail body."
                    }
                },
                "required": ["text"]
            }),
        },
        ToolDefinition {
            name: "search_catalog".to_owned(),
            description: "Search the detection catalog by report type, keywords, and free text."
                .to_owned(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "report_type": {
                        "type": "string",
                        "description": "Canonical report type, e.g. wash_trade."
                    },
                    "keywords": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Topic keywords matched against tags, capabilities, domain, and names."
                    },
                    "free_text": {
                        "type": "string",
                        "description": "Raw text matched as a substring of file contents."
                    }
                }
            }),
        },
        ToolDefinition {
            name: "list_report_types".to_owned(),
            description: "List every report type in the catalog with its configs and tests."
                .to_owned(),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
        ToolDefinition {
            name: "get_test_parameters".to_owned(),
            description: "Read the declared parameters of a test definition with types and defaults."
                .to_owned(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "test_path": {
                        "type": "string",
                        "description": "Path of the test definition (full path or bare file name)."
                    }
                },
                "required": ["test_path"]
            }),
        },
        ToolDefinition {
            name: "preview_parameter_change".to_owned(),
            description: "Validate a proposed parameter change and preview the resulting \
                          parameter set. Nothing is written."
                .to_owned(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "test_path": {
                        "type": "string",
                        "description": "Path of the test definition."
                    },
                    "changes": {
                        "type": "object",
                        "description": "Parameter names mapped to proposed values.",
                        "additionalProperties": { "type": "string" }
                    }
                },
                "required": ["test_path", "changes"]
            }),
        },
        ToolDefinition {
            name: "execute_test".to_owned(),
            description: "Run a test definition through the project build tool and report \
                          the outcome, generated report path included."
                .to_owned(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "test_path": {
                        "type": "string",
                        "description": "Path of the test definition."
                    },
                    "parameters": {
                        "type": "object",
                        "description": "Parameter overrides passed as -D system properties.",
                        "additionalProperties": { "type": "string" }
                    },
                    "output_format": {
                        "type": "string",
                        "description": "Report output format (default csv)."
                    }
                },
                "required": ["test_path"]
            }),
        },
    ]
}

/// Dispatch one tool call by name.
///
/// # Errors
///
/// Returns [`ToolError::UnknownTool`] for unregistered names,
/// [`ToolError::InvalidInput`] for missing or malformed fields, and
/// [`ToolError::Workflow`] when the workflow itself rejects the call.
pub async fn dispatch(
    agent: &SurveillanceAgent,
    name: &str,
    input: &Value,
) -> Result<Value, ToolError> {
    debug!(tool = name, "dispatching tool call");
    match name {
        "process_inquiry" => {
            let text = required_str(input, "text")?;
            Ok(serde_json::to_value(agent.process_inquiry(&text))?)
        }
        "search_catalog" => {
            let query = MatchQuery {
                report_type: optional_str(input, "report_type"),
                keywords: string_array(input, "keywords"),
                free_text: optional_str(input, "free_text"),
            };
            Ok(serde_json::to_value(agent.search_catalog(&query))?)
        }
        "list_report_types" => Ok(serde_json::to_value(agent.report_overview())?),
        "get_test_parameters" => {
            let test_path = required_str(input, "test_path")?;
            let set = agent.get_parameters(test_path.as_ref())?;
            Ok(serde_json::to_value(set)?)
        }
        "preview_parameter_change" => {
            let test_path = required_str(input, "test_path")?;
            let changes = string_map(input, "changes")
                .ok_or_else(|| ToolError::InvalidInput("missing required field: changes".to_owned()))?;
            let set = agent.propose_parameter_change(test_path.as_ref(), &changes)?;
            Ok(serde_json::to_value(set)?)
        }
        "execute_test" => {
            let test_path = required_str(input, "test_path")?;
            let parameters = string_map(input, "parameters").unwrap_or_default();
            let output_format = optional_str(input, "output_format")
                .unwrap_or_else(|| "csv".to_owned());
            let report = agent
                .execute(test_path.as_ref(), parameters, &output_format)
                .await?;
            Ok(serde_json::to_value(report)?)
        }
        other => Err(ToolError::UnknownTool(other.to_owned())),
    }
}

/// Extract a required string field.
fn required_str(input: &Value, field: &str) -> Result<String, ToolError> {
    input
        .get(field)
        .and_then(|v| v.as_str())
        .map(ToOwned::to_owned)
        .ok_or_else(|| ToolError::InvalidInput(format!("missing required field: {field}")))
}

/// Extract an optional string field, treating empty strings as absent.
fn optional_str(input: &Value, field: &str) -> Option<String> {
    input
        .get(field)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
}

/// Extract an optional array of strings, skipping non-string entries.
fn string_array(input: &Value, field: &str) -> Vec<String> {
    input
        .get(field)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str())
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

/// Extract an optional string-to-string object. Non-string values are kept
/// in their JSON rendering so numbers and booleans pass through as written.
fn string_map(input: &Value, field: &str) -> Option<BTreeMap<String, String>> {
    let object = input.get(field)?.as_object()?;
    Some(
        object
            .iter()
            .map(|(key, value)| {
                let rendered = match value.as_str() {
                    Some(s) => s.to_owned(),
                    None => value.to_string(),
                };
                (key.clone(), rendered)
            })
            .collect(),
    )
}

// ---------------------------------------------------------------------------
// Serve loop
// ---------------------------------------------------------------------------

/// One request on the serve loop.
#[derive(Debug, Deserialize)]
struct ToolRequest {
    /// Tool name to dispatch.
    tool: String,
    /// Tool input, defaulting to JSON null.
    #[serde(default)]
    input: Value,
}

/// Run the JSON-lines tool loop over stdin/stdout until EOF.
///
/// Each input line is a `{"tool": …, "input": …}` request; each output
/// line is `{"ok": true, "result": …}` or `{"ok": false, "error": …}`.
/// Bad requests produce an error line, never a crash.
///
/// # Errors
///
/// Returns an error only when stdin or stdout itself fails.
pub async fn serve(agent: &SurveillanceAgent) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let response = respond(agent, line).await;
        let mut encoded = serde_json::to_string(&response)?;
        encoded.push('\n');
        stdout.write_all(encoded.as_bytes()).await?;
        stdout.flush().await?;
    }
    Ok(())
}

/// Parse one request line and produce the response value.
async fn respond(agent: &SurveillanceAgent, line: &str) -> Value {
    let request: ToolRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "malformed tool request");
            return json!({"ok": false, "error": {"message": format!("invalid request: {e}")}});
        }
    };

    match dispatch(agent, &request.tool, &request.input).await {
        Ok(result) => json!({"ok": true, "result": result}),
        Err(e) => json!({"ok": false, "error": error_body(&e)}),
    }
}

/// Render a tool error as a JSON object, keeping per-entry validation
/// detail intact.
fn error_body(error: &ToolError) -> Value {
    match error {
        ToolError::Workflow(WorkflowError::Validation(invalid)) => json!({
            "message": error.to_string(),
            "invalid": invalid
                .iter()
                .map(|entry| json!({"name": entry.name, "reason": entry.reason}))
                .collect::<Vec<_>>(),
        }),
        other => json!({"message": other.to_string()}),
    }
}
