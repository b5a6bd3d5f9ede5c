//! `tokio::process` implementation of the job runner.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::RunnerConfig;

use super::{BuildTool, JobOutcome, JobRequest, JobRunner, RunnerError};

/// Runs jobs as external processes under the configured timeout.
///
/// The child is spawned with kill-on-drop, so an elapsed timeout also
/// terminates the process rather than leaving it running.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    project_dir: PathBuf,
    output_dir: PathBuf,
    timeout: Duration,
    command_override: Vec<String>,
}

impl ProcessRunner {
    /// Create a runner from the runner section of the configuration.
    pub fn new(config: &RunnerConfig) -> Self {
        Self {
            project_dir: config.project_dir.clone(),
            output_dir: config.output_dir.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            command_override: config.command.clone(),
        }
    }

    /// Assemble the program and arguments for a request.
    ///
    /// A configured override command runs verbatim with the parameters
    /// appended; otherwise the detected build tool decides the shape.
    fn build_command(&self, request: &JobRequest) -> (String, Vec<String>) {
        let properties = property_args(request);

        if let Some((program, rest)) = self.command_override.split_first() {
            let mut args = rest.to_vec();
            args.extend(properties);
            return (program.clone(), args);
        }

        match BuildTool::detect(&self.project_dir) {
            BuildTool::Maven => {
                let mut args = vec!["test".to_owned(), format!("-Dtest={}", request.test_name)];
                args.extend(properties);
                ("mvn".to_owned(), args)
            }
            BuildTool::Gradle => {
                let mut args = vec![
                    "test".to_owned(),
                    "--tests".to_owned(),
                    request.test_name.clone(),
                ];
                args.extend(properties);
                ("gradle".to_owned(), args)
            }
            BuildTool::DirectJava => {
                let mut args = properties;
                args.push(request.test_name.clone());
                ("java".to_owned(), args)
            }
        }
    }
}

#[async_trait]
impl JobRunner for ProcessRunner {
    async fn run(&self, request: &JobRequest) -> Result<JobOutcome, RunnerError> {
        let (program, args) = self.build_command(request);
        info!(test = %request.test_name, program = %program, "launching test run");
        debug!(?args, timeout = ?self.timeout, "run command assembled");

        let mut command = tokio::process::Command::new(&program);
        command
            .args(&args)
            .current_dir(&self.project_dir)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true);

        let started = Instant::now();
        let child = command.spawn().map_err(|source| RunnerError::Spawn {
            program: program.clone(),
            source,
        })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(test = %request.test_name, timeout = ?self.timeout, "test run timed out");
                return Err(RunnerError::Timeout {
                    seconds: self.timeout.as_secs(),
                });
            }
        };
        let duration = started.elapsed();

        let outcome = JobOutcome {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration,
            report_path: find_report(&self.output_dir),
        };
        info!(
            test = %request.test_name,
            exit_code = ?outcome.exit_code,
            duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            "test run finished"
        );
        Ok(outcome)
    }
}

/// Render the request parameters as `-Dkey=value` system properties. The
/// output format travels the same way unless the caller already set one.
fn property_args(request: &JobRequest) -> Vec<String> {
    let mut args: Vec<String> = request
        .parameters
        .iter()
        .map(|(key, value)| format!("-D{key}={value}"))
        .collect();
    if !request.output_format.is_empty() && !request.parameters.contains_key("outputFormat") {
        args.push(format!("-DoutputFormat={}", request.output_format));
    }
    args
}

/// Newest regular file under the output directory that looks like a
/// report, or `None` when nothing qualifies.
fn find_report(output_dir: &Path) -> Option<PathBuf> {
    let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;

    for entry in walkdir::WalkDir::new(output_dir).into_iter().flatten() {
        if !entry.file_type().is_file() || !looks_like_report(entry.path()) {
            continue;
        }
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        let Ok(modified) = metadata.modified() else {
            continue;
        };
        if newest.as_ref().map_or(true, |(time, _)| modified > *time) {
            newest = Some((modified, entry.path().to_path_buf()));
        }
    }

    newest.map(|(_, path)| path)
}

/// Report heuristics: a known report extension, or `report` in the name.
fn looks_like_report(path: &Path) -> bool {
    let by_extension = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| matches!(ext, "html" | "pdf" | "csv" | "xlsx"));
    let by_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| name.to_lowercase().contains("report"));
    by_extension || by_name
}
