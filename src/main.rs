//! Watchdesk CLI entry point.
//!
//! Query subcommands (`process`, `search`, `reports`, `params`, `preview`,
//! `execute`) print results to stdout and exit; `serve` runs the JSON-lines
//! tool loop that assistant hosts attach to.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use watchdesk::agent::{ExecutionReport, InquiryOutcome, ReportGroup, SurveillanceAgent, WorkflowError};
use watchdesk::catalog::RecordKind;
use watchdesk::config::Config;
use watchdesk::inquiry::InquiryFields;
use watchdesk::logging;
use watchdesk::params::ParameterSet;
use watchdesk::search::{MatchQuery, MatchResult};
use watchdesk::tools;

/// Watchdesk — support assistant for trade-surveillance teams.
#[derive(Parser)]
#[command(name = "watchdesk", version, about)]
struct Cli {
    /// Path to the configuration file (default: ./watchdesk.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit results as pretty-printed JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Process a free-text inquiry and recommend a test to run.
    Process {
        /// Read the inquiry text from a file.
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
        /// Inquiry text given inline.
        #[arg(long)]
        text: Option<String>,
        /// Execute the recommended test after processing.
        #[arg(long)]
        execute: bool,
    },
    /// Search the catalog by report type, keywords, and free text.
    Search {
        /// Topic keyword; repeatable.
        #[arg(long = "keyword")]
        keywords: Vec<String>,
        /// Canonical report type, e.g. wash_trade.
        #[arg(long)]
        report_type: Option<String>,
        /// Free text matched against raw file contents.
        #[arg(long)]
        free_text: Option<String>,
    },
    /// List every report type with its configs and tests.
    Reports,
    /// Show the declared parameters of a test definition.
    Params {
        /// Path of the test definition (full path or bare file name).
        test_path: PathBuf,
    },
    /// Validate a parameter change and preview the result without writing.
    Preview {
        /// Path of the test definition.
        test_path: PathBuf,
        /// Proposed change as NAME=VALUE; repeatable.
        #[arg(long = "set", value_name = "NAME=VALUE")]
        set: Vec<String>,
    },
    /// Run a test definition through the project build tool.
    Execute {
        /// Path of the test definition.
        test_path: PathBuf,
        /// Parameter override as NAME=VALUE; repeatable.
        #[arg(long = "set", value_name = "NAME=VALUE")]
        set: Vec<String>,
        /// Report output format.
        #[arg(long, default_value = "csv")]
        format: String,
    },
    /// Run the JSON-lines tool loop over stdin/stdout.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Serve => {
            let _logging_guard = logging::init_production(&config.logging.dir)?;
            let agent = SurveillanceAgent::new(config);
            tools::serve(&agent).await
        }
        command => {
            logging::init_cli();
            let agent = SurveillanceAgent::new(config);
            run_query(&agent, command, cli.json).await
        }
    }
}

/// Dispatch one query subcommand.
async fn run_query(agent: &SurveillanceAgent, command: Command, json: bool) -> anyhow::Result<()> {
    match command {
        Command::Process {
            file,
            text,
            execute,
        } => handle_process(agent, file, text, execute, json).await,
        Command::Search {
            keywords,
            report_type,
            free_text,
        } => {
            let query = MatchQuery {
                report_type,
                keywords,
                free_text,
            };
            handle_search(agent, &query, json)
        }
        Command::Reports => handle_reports(agent, json),
        Command::Params { test_path } => handle_params(agent, &test_path, json),
        Command::Preview { test_path, set } => handle_preview(agent, &test_path, &set, json),
        Command::Execute {
            test_path,
            set,
            format,
        } => handle_execute(agent, &test_path, &set, &format, json).await,
        // serve is dispatched in main before this point
        Command::Serve => Ok(()),
    }
}

/// Process an inquiry from a file or inline text, optionally executing the
/// recommended test.
async fn handle_process(
    agent: &SurveillanceAgent,
    file: Option<PathBuf>,
    text: Option<String>,
    execute: bool,
    json: bool,
) -> anyhow::Result<()> {
    let text = match (file, text) {
        (Some(path), None) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, Some(text)) => text,
        _ => anyhow::bail!("provide the inquiry via --file or --text"),
    };

    let outcome = agent.process_inquiry(&text);
    if json {
        print_json(&outcome)?;
    } else {
        print_outcome(&outcome);
    }

    if execute {
        let Some(test_path) = outcome.recommended_test else {
            anyhow::bail!("no test to execute: the inquiry matched no test definition");
        };
        let report = agent.execute(&test_path, BTreeMap::new(), "csv").await?;
        finish_report(&report, json)?;
    }
    Ok(())
}

/// Search the catalog and print the ranked matches.
fn handle_search(agent: &SurveillanceAgent, query: &MatchQuery, json: bool) -> anyhow::Result<()> {
    let matches = agent.search_catalog(query);
    if json {
        print_json(&matches)?;
    } else {
        print_matches(&matches);
    }
    Ok(())
}

/// Print the report-type overview of the catalog.
fn handle_reports(agent: &SurveillanceAgent, json: bool) -> anyhow::Result<()> {
    let groups = agent.report_overview();
    if json {
        print_json(&groups)?;
    } else {
        print_groups(&groups);
    }
    Ok(())
}

/// Print the declared parameters of a test definition.
fn handle_params(agent: &SurveillanceAgent, test_path: &Path, json: bool) -> anyhow::Result<()> {
    let set = agent.get_parameters(test_path)?;
    if json {
        print_json(&set)?;
    } else {
        print_parameter_set(&set);
    }
    Ok(())
}

/// Validate a proposed parameter change and print the preview. Every
/// invalid entry is reported before the command fails.
fn handle_preview(
    agent: &SurveillanceAgent,
    test_path: &Path,
    set: &[String],
    json: bool,
) -> anyhow::Result<()> {
    let changes = parse_set_pairs(set)?;
    match agent.propose_parameter_change(test_path, &changes) {
        Ok(preview) => {
            if json {
                print_json(&preview)?;
            } else {
                println!("Preview (nothing written):");
                print_parameter_set(&preview);
            }
            Ok(())
        }
        Err(WorkflowError::Validation(invalid)) => {
            eprintln!("{} invalid parameter change(s):", invalid.len());
            for entry in &invalid {
                eprintln!("  {entry}");
            }
            anyhow::bail!("parameter change rejected")
        }
        Err(e) => Err(e.into()),
    }
}

/// Run a test definition and print the execution report.
async fn handle_execute(
    agent: &SurveillanceAgent,
    test_path: &Path,
    set: &[String],
    format: &str,
    json: bool,
) -> anyhow::Result<()> {
    let parameters = parse_set_pairs(set)?;
    let report = agent.execute(test_path, parameters, format).await?;
    finish_report(&report, json)
}

/// Print an execution report and map a failed run to a non-zero exit.
fn finish_report(report: &ExecutionReport, json: bool) -> anyhow::Result<()> {
    if json {
        print_json(report)?;
    } else {
        print_report(report);
    }
    if report.success {
        Ok(())
    } else {
        let reason = report
            .error
            .clone()
            .unwrap_or_else(|| "test run failed".to_owned());
        Err(anyhow::anyhow!(reason))
    }
}

/// Parse repeated `NAME=VALUE` arguments into a change map.
fn parse_set_pairs(pairs: &[String]) -> anyhow::Result<BTreeMap<String, String>> {
    let mut changes = BTreeMap::new();
    for pair in pairs {
        let Some((name, value)) = pair.split_once('=') else {
            anyhow::bail!("invalid --set {pair:?}: expected NAME=VALUE");
        };
        changes.insert(name.trim().to_owned(), value.to_owned());
    }
    Ok(changes)
}

// ---------------------------------------------------------------------------
// Text rendering
// ---------------------------------------------------------------------------

/// Pretty-print any serializable value to stdout.
fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print the full outcome of a processed inquiry.
fn print_outcome(outcome: &InquiryOutcome) {
    print_fields(&outcome.fields);
    print_matches(&outcome.matches);
    if !outcome.recommendations.is_empty() {
        println!("Recommendations:");
        for recommendation in &outcome.recommendations {
            println!("  - {recommendation}");
        }
    }
}

/// Print the extracted inquiry fields, skipping absent ones.
fn print_fields(fields: &InquiryFields) {
    println!("Extracted fields:");
    print_field("account", fields.account_id.as_deref());
    print_field("employee", fields.employee_id.as_deref());
    print_field("department", fields.department.as_deref());
    print_field("symbol", fields.symbol.as_deref());
    if let Some(range) = &fields.date_range {
        println!("  {:<12} {} to {}", "dates", range.start, range.end);
    }
    print_field("report type", fields.report_type_hint.as_deref());
}

/// Print one labeled field when present.
fn print_field(label: &str, value: Option<&str>) {
    if let Some(value) = value {
        println!("  {label:<12} {value}");
    }
}

/// Print ranked matches as a score/kind/path table.
fn print_matches(matches: &[MatchResult]) {
    if matches.is_empty() {
        println!("No matches.");
        return;
    }
    println!("Matches:");
    for result in matches {
        let fields: Vec<&str> = result.matched.iter().map(|m| m.field.as_str()).collect();
        println!(
            "  {:>3}  {:<6}  {}  [{}]",
            result.score,
            kind_label(result.record.kind),
            result.record.source_path.display(),
            fields.join(", ")
        );
    }
}

/// Short label for a record kind.
fn kind_label(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Config => "config",
        RecordKind::TestDefinition => "test",
    }
}

/// Print a parameter set as a name/type/value table.
fn print_parameter_set(set: &ParameterSet) {
    println!("Parameters of {}:", set.source.display());
    if set.entries.is_empty() {
        println!("  (none declared)");
        return;
    }
    for (name, entry) in &set.entries {
        println!(
            "  {name}: {} = {} (default {})",
            entry.declared_type, entry.current, entry.default
        );
    }
}

/// Print an execution report summary.
fn print_report(report: &ExecutionReport) {
    let status = if report.success { "succeeded" } else { "failed" };
    println!(
        "Test run {status} in {} ms (exit code {})",
        report.execution_time_ms,
        match report.exit_code {
            Some(code) => code.to_string(),
            None => "none".to_owned(),
        }
    );
    if let Some(count) = report.alert_count {
        println!("Alerts found: {count}");
    }
    if let Some(path) = &report.report_path {
        println!("Report: {}", path.display());
    }
    if let Some(error) = &report.error {
        println!("Error: {error}");
    }
}

/// Print the report-type overview.
fn print_groups(groups: &[ReportGroup]) {
    if groups.is_empty() {
        println!("Catalog is empty.");
        return;
    }
    for group in groups {
        println!("{}", group.report_type);
        for path in &group.configs {
            println!("  config  {}", path.display());
        }
        for path in &group.tests {
            println!("  test    {}", path.display());
        }
    }
}
