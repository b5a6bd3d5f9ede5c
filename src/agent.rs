//! Workflow orchestration: inquiries in, ranked matches and reports out.
//!
//! [`SurveillanceAgent`] ties the extractor, the catalog, the search
//! engine, and the external runner together. It holds no state beyond its
//! configuration; every operation re-scans the catalog, so the filesystem
//! is the single source of truth.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::catalog::{CatalogRecord, CatalogScanner, RecordKind};
use crate::config::Config;
use crate::inquiry::{InquiryExtractor, InquiryFields};
use crate::params::{InvalidParameter, ParameterError, ParameterSet};
use crate::runner::{JobOutcome, JobRequest, JobRunner, ProcessRunner};
use crate::search::{search, MatchQuery, MatchResult};

/// Errors produced by the orchestrated workflows.
///
/// Runner-level failures never appear here; they are folded into
/// [`ExecutionReport`] as data.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// The path matched no catalog record.
    #[error("no catalog record for {}", .0.display())]
    RecordNotFound(PathBuf),
    /// The record exists but is not a test definition.
    #[error("{} is not a test definition", .0.display())]
    NotATestDefinition(PathBuf),
    /// A parameter proposal was rejected; every invalid entry listed.
    #[error("{} invalid parameter change(s)", .0.len())]
    Validation(Vec<InvalidParameter>),
}

impl From<ParameterError> for WorkflowError {
    fn from(err: ParameterError) -> Self {
        match err {
            ParameterError::Validation(invalid) => Self::Validation(invalid),
        }
    }
}

/// Everything `process_inquiry` produces for one inquiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InquiryOutcome {
    /// Fields extracted from the inquiry text.
    pub fields: InquiryFields,
    /// Ranked catalog matches.
    pub matches: Vec<MatchResult>,
    /// Source path of the highest-ranked test definition, if any.
    pub recommended_test: Option<PathBuf>,
    /// Human-readable next steps.
    pub recommendations: Vec<String>,
}

/// Outcome of one `execute` call, failure modes included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Whether the run completed with exit code 0.
    pub success: bool,
    /// Exit code when the process ran to completion.
    pub exit_code: Option<i32>,
    /// Produced report: the stdout marker when present, otherwise the
    /// newest candidate found in the output directory.
    pub report_path: Option<PathBuf>,
    /// Alert count parsed from the `Alerts found:` stdout marker.
    pub alert_count: Option<u64>,
    /// Wall-clock execution time in milliseconds.
    pub execution_time_ms: u64,
    /// Captured stdout.
    pub stdout: String,
    /// Captured stderr.
    pub stderr: String,
    /// Failure description when `success` is false.
    pub error: Option<String>,
}

/// Catalog records that share a report type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportGroup {
    /// Report type, or `unknown` for untyped records.
    pub report_type: String,
    /// Config files of this type, in scan order.
    pub configs: Vec<PathBuf>,
    /// Test definitions of this type, in scan order.
    pub tests: Vec<PathBuf>,
}

/// Orchestrates the support workflows over the catalog, the extractor,
/// and the external runner.
pub struct SurveillanceAgent {
    config: Config,
    extractor: InquiryExtractor,
    runner: Arc<dyn JobRunner>,
}

impl std::fmt::Debug for SurveillanceAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurveillanceAgent")
            .field("config", &self.config)
            .finish()
    }
}

impl SurveillanceAgent {
    /// Create an agent with the production process runner.
    pub fn new(config: Config) -> Self {
        let runner = Arc::new(ProcessRunner::new(&config.runner));
        Self::with_runner(config, runner)
    }

    /// Create an agent with a custom runner implementation.
    pub fn with_runner(config: Config, runner: Arc<dyn JobRunner>) -> Self {
        Self {
            config,
            extractor: InquiryExtractor::new(),
            runner,
        }
    }

    /// Process a free-text inquiry end-to-end: extract fields, rank the
    /// catalog against the derived query, and suggest next steps.
    ///
    /// Extracted identifiers and symbols are filters, not topics, so they
    /// never become search keywords; the report-type hint does.
    pub fn process_inquiry(&self, raw_text: &str) -> InquiryOutcome {
        let fields = self.extractor.extract(raw_text);
        let mut keywords = self.extractor.keywords(raw_text);
        if let Some(hint) = &fields.report_type_hint {
            if !keywords.contains(hint) {
                keywords.push(hint.clone());
            }
        }

        let query = MatchQuery {
            report_type: fields.report_type_hint.clone(),
            keywords,
            free_text: None,
        };
        let matches = self.search_catalog(&query);

        let recommended_test = matches
            .iter()
            .find(|m| m.record.kind == RecordKind::TestDefinition)
            .map(|m| m.record.source_path.clone());
        let recommendations = build_recommendations(&fields, &matches, recommended_test.as_deref());

        info!(
            matches = matches.len(),
            recommended = ?recommended_test,
            "inquiry processed"
        );
        InquiryOutcome {
            fields,
            matches,
            recommended_test,
            recommendations,
        }
    }

    /// Scan the catalog and rank it against the query, bounded by the
    /// configured result limit.
    pub fn search_catalog(&self, query: &MatchQuery) -> Vec<MatchResult> {
        let mut matches = search(self.scan(), query);
        matches.truncate(self.config.search.max_results);
        matches
    }

    /// Load the declared parameters of a test definition.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::RecordNotFound`] when the path is not in
    /// the catalog, or [`WorkflowError::NotATestDefinition`] when it names
    /// a config file.
    pub fn get_parameters(&self, test_path: &Path) -> Result<ParameterSet, WorkflowError> {
        let record = self.find_test_record(test_path)?;
        Ok(ParameterSet::from_record(&record))
    }

    /// Validate a proposed parameter change and return the preview set.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Validation`] carrying every invalid entry,
    /// or a lookup error per [`Self::get_parameters`]. Nothing is written
    /// in any case.
    pub fn propose_parameter_change(
        &self,
        test_path: &Path,
        changes: &BTreeMap<String, String>,
    ) -> Result<ParameterSet, WorkflowError> {
        let current = self.get_parameters(test_path)?;
        Ok(current.propose(changes)?)
    }

    /// Run a test definition through the external runner.
    ///
    /// Runner failures (timeout, spawn, non-zero exit) always come back as
    /// a report with `success = false`; the process is never terminated
    /// from here.
    ///
    /// # Errors
    ///
    /// Returns a [`WorkflowError`] only when the record lookup fails.
    pub async fn execute(
        &self,
        test_path: &Path,
        parameters: BTreeMap<String, String>,
        output_format: &str,
    ) -> Result<ExecutionReport, WorkflowError> {
        let record = self.find_test_record(test_path)?;
        let request = JobRequest {
            test_name: record.display_name(),
            source_path: record.source_path.clone(),
            parameters,
            output_format: output_format.to_owned(),
        };

        info!(test = %request.test_name, "executing test definition");
        let started = Instant::now();
        let report = match self.runner.run(&request).await {
            Ok(outcome) => report_from_outcome(&outcome),
            Err(err) => {
                warn!(test = %request.test_name, error = %err, "test run failed");
                ExecutionReport {
                    success: false,
                    exit_code: None,
                    report_path: None,
                    alert_count: None,
                    execution_time_ms: millis(started.elapsed()),
                    stdout: String::new(),
                    stderr: String::new(),
                    error: Some(err.to_string()),
                }
            }
        };
        Ok(report)
    }

    /// Catalog records grouped by report type, sorted by type, with
    /// untyped records grouped under `unknown`.
    pub fn report_overview(&self) -> Vec<ReportGroup> {
        let mut groups: BTreeMap<String, ReportGroup> = BTreeMap::new();
        for record in self.scan() {
            let report_type = record
                .report_type
                .clone()
                .unwrap_or_else(|| "unknown".to_owned());
            let group = groups
                .entry(report_type.clone())
                .or_insert_with(|| ReportGroup {
                    report_type: report_type.clone(),
                    configs: Vec::new(),
                    tests: Vec::new(),
                });
            match record.kind {
                RecordKind::Config => group.configs.push(record.source_path),
                RecordKind::TestDefinition => group.tests.push(record.source_path),
            }
        }
        groups.into_values().collect()
    }

    /// Scan the configured catalog roots.
    fn scan(&self) -> Vec<CatalogRecord> {
        CatalogScanner::new(&self.config.catalog).scan()
    }

    /// Look up a path in the catalog and insist on a test definition.
    fn find_test_record(&self, test_path: &Path) -> Result<CatalogRecord, WorkflowError> {
        let records = self.scan();
        let record = find_record(records, test_path)
            .ok_or_else(|| WorkflowError::RecordNotFound(test_path.to_path_buf()))?;
        if record.kind != RecordKind::TestDefinition {
            return Err(WorkflowError::NotATestDefinition(record.source_path));
        }
        Ok(record)
    }
}

/// Find a record by exact path, falling back to a trailing-components
/// match so a bare file name selects a nested record.
fn find_record(records: Vec<CatalogRecord>, path: &Path) -> Option<CatalogRecord> {
    let mut fallback = None;
    for record in records {
        if record.source_path == path {
            return Some(record);
        }
        if fallback.is_none() && record.source_path.ends_with(path) {
            fallback = Some(record);
        }
    }
    fallback
}

/// Fold a runner outcome into an execution report, reading the stdout
/// markers for alert count and report path.
fn report_from_outcome(outcome: &JobOutcome) -> ExecutionReport {
    let success = outcome.success();
    let error = if success {
        None
    } else {
        Some(match outcome.exit_code {
            Some(code) => format!("test run exited with code {code}"),
            None => "test run terminated by a signal".to_owned(),
        })
    };

    ExecutionReport {
        success,
        exit_code: outcome.exit_code,
        report_path: report_marker(&outcome.stdout).or_else(|| outcome.report_path.clone()),
        alert_count: alert_count(&outcome.stdout),
        execution_time_ms: millis(outcome.duration),
        stdout: outcome.stdout.clone(),
        stderr: outcome.stderr.clone(),
        error,
    }
}

/// Next-step guidance derived from the extraction and the match results.
fn build_recommendations(
    fields: &InquiryFields,
    matches: &[MatchResult],
    recommended_test: Option<&Path>,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if matches.is_empty() {
        recommendations.push(
            "No matching records found. Try adding more specific keywords to the inquiry."
                .to_owned(),
        );
        return recommendations;
    }

    let config_count = matches
        .iter()
        .filter(|m| m.record.kind == RecordKind::Config)
        .count();
    if config_count > 0 && recommended_test.is_none() {
        recommendations.push(format!(
            "Found {config_count} matching config(s) but no test definition that references them. \
             Consider adding a test definition."
        ));
    }

    if let Some(best_config) = matches.iter().find(|m| m.record.kind == RecordKind::Config) {
        recommendations.push(format!(
            "Closest matching config: {} (score {})",
            best_config.record.source_path.display(),
            best_config.score
        ));
    }

    if let Some(path) = recommended_test {
        let score = matches
            .iter()
            .find(|m| m.record.source_path == path)
            .map(|m| m.score)
            .unwrap_or_default();
        recommendations.push(format!(
            "Recommended action: execute test {} (score {score})",
            path.display()
        ));
    }

    match &fields.report_type_hint {
        Some(report_type) => {
            recommendations.push(format!("Report type identified: {report_type}"));
        }
        None => recommendations.push(
            "No specific report type identified. Consider naming the suspected pattern in the inquiry."
                .to_owned(),
        ),
    }

    recommendations
}

/// Parse the final `Alerts found: N` stdout marker.
fn alert_count(stdout: &str) -> Option<u64> {
    stdout
        .lines()
        .rev()
        .find_map(|line| line.trim().strip_prefix("Alerts found:"))
        .and_then(|rest| rest.trim().parse().ok())
}

/// Parse the final `Report generated: <path>` stdout marker.
fn report_marker(stdout: &str) -> Option<PathBuf> {
    stdout
        .lines()
        .rev()
        .find_map(|line| line.trim().strip_prefix("Report generated:"))
        .map(|rest| PathBuf::from(rest.trim()))
}

/// Clamp a duration to whole milliseconds.
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
