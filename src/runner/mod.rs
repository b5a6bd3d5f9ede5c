//! External test execution behind a pluggable trait.
//!
//! The orchestrator depends only on [`JobRunner`]; the production
//! implementation in [`process`] shells out to the project's build tool.
//! Every execution path carries a timeout, and failures come back as
//! [`RunnerError`] values rather than panics.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

pub mod process;

pub use process::ProcessRunner;

/// Build tool used to launch a test run, detected from the project layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildTool {
    /// Maven project (`pom.xml`).
    Maven,
    /// Gradle project (`build.gradle` or `build.gradle.kts`).
    Gradle,
    /// No build tool markers; invoke `java` directly.
    DirectJava,
}

impl BuildTool {
    /// Detect the build tool from marker files in the project directory.
    pub fn detect(project_dir: &Path) -> Self {
        if project_dir.join("pom.xml").is_file() {
            return Self::Maven;
        }
        if project_dir.join("build.gradle").is_file()
            || project_dir.join("build.gradle.kts").is_file()
        {
            return Self::Gradle;
        }
        Self::DirectJava
    }
}

/// A request to run one test definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    /// Test name handed to the build tool (declared name or class name).
    pub test_name: String,
    /// Source file of the test definition.
    pub source_path: PathBuf,
    /// Parameters forwarded as `-D` system properties.
    pub parameters: BTreeMap<String, String>,
    /// Requested report output format, forwarded as `-DoutputFormat=…`.
    pub output_format: String,
}

/// What happened when a job ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    /// Process exit code (`None` when terminated by a signal).
    pub exit_code: Option<i32>,
    /// Captured stdout text.
    pub stdout: String,
    /// Captured stderr text.
    pub stderr: String,
    /// Wall-clock duration of the run.
    pub duration: Duration,
    /// Report file produced by the run, when one was found.
    pub report_path: Option<PathBuf>,
}

impl JobOutcome {
    /// Returns `true` when the job exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Errors produced by job execution.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The job exceeded its timeout and was terminated.
    #[error("job timed out after {seconds}s")]
    Timeout {
        /// Timeout budget in seconds.
        seconds: u64,
    },
    /// The external process could not be started.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Other IO failure while running the job.
    #[error("job io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs test definitions through an external process.
#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Execute the request and report the outcome as data.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] when the process cannot be spawned, fails
    /// mid-run, or exceeds its timeout. A non-zero exit is not an error;
    /// it is an outcome.
    async fn run(&self, request: &JobRequest) -> Result<JobOutcome, RunnerError>;
}
