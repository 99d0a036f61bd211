//! Running CDP programs.
//!
//! Locates a program under the install directory, applies the host's binary
//! translation prefix and runs it with the scratch directory as its working
//! directory. CDP programs are inconsistent about exit codes, so success is
//! decided by [`infer_verdict`] rather than by the exit status alone.

use cdp_mcp_common::config::{ArchTranslation, Config};
use cdp_mcp_common::error::Error;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::process::{ExitStatus, Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// Time limit for a usage probe, in seconds.
pub const USAGE_PROBE_TIMEOUT_SECS: u64 = 5;

/// Reported when a usage probe hits [`USAGE_PROBE_TIMEOUT_SECS`].
pub const PROBE_TIMEOUT_MESSAGE: &str = "Command timed out - program may be waiting for input";

/// Exit code reported when the process produced none.
pub const NO_EXIT_CODE: i32 = -1;

/// How a run was judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// The program exited with status 0.
    ExitZero,
    /// Status 1 with output on stdout and nothing on stderr.
    ExitOneCleanOutput,
    /// The final argument names a file that exists after the run.
    OutputFileExists,
    /// None of the above.
    Failed,
}

impl Verdict {
    pub fn is_success(self) -> bool {
        !matches!(self, Verdict::Failed)
    }

    /// `"success"` or `"failed"`, as reported to the agent.
    pub fn status(self) -> &'static str {
        if self.is_success() { "success" } else { "failed" }
    }
}

/// Decide whether a CDP run succeeded.
///
/// The three success signals are OR-ed and checked in order, so
/// `output_exists` is only called when the exit code alone is inconclusive.
pub fn infer_verdict(
    exit_code: i32,
    stdout: &str,
    stderr: &str,
    output_exists: impl FnOnce() -> bool,
) -> Verdict {
    if exit_code == 0 {
        Verdict::ExitZero
    } else if exit_code == 1 && !stdout.is_empty() && stderr.is_empty() {
        Verdict::ExitOneCleanOutput
    } else if output_exists() {
        Verdict::OutputFileExists
    } else {
        Verdict::Failed
    }
}

/// Final argument checked for existence by [`infer_verdict`].
///
/// Only commands with at least three elements qualify, and flags are skipped.
pub fn verdict_output_candidate(command: &[String]) -> Option<&str> {
    match command {
        [_, _, .., last] if !last.starts_with('-') => Some(last.as_str()),
        _ => None,
    }
}

/// Final argument reported back as `output_file`: a verdict candidate that
/// also looks like a file name.
pub fn reported_output_file(command: &[String]) -> Option<&str> {
    verdict_output_candidate(command).filter(|arg| arg.contains('.'))
}

/// Outcome of one completed CDP run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub verdict: Verdict,
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        self.verdict.is_success()
    }
}

/// Outcome of a usage probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageProbe {
    /// The program printed something and exited.
    Completed {
        exit_code: i32,
        stdout: String,
        stderr: String,
    },
    /// The program was still running when the probe's time limit expired.
    TimedOut,
    /// No such program under the install directory.
    NotFound(String),
    /// The program exists but could not be started.
    SpawnFailed(String),
}

impl UsageProbe {
    /// Exit code as reported to the agent; `-1` when the program never completed.
    pub fn exit_code(&self) -> i32 {
        match self {
            UsageProbe::Completed { exit_code, .. } => *exit_code,
            _ => NO_EXIT_CODE,
        }
    }

    /// The usage text: stdout when present, otherwise stderr, otherwise the
    /// reason the probe did not complete.
    pub fn text(&self) -> &str {
        match self {
            UsageProbe::Completed { stdout, stderr, .. } => {
                if stdout.is_empty() { stderr } else { stdout }
            }
            UsageProbe::TimedOut => PROBE_TIMEOUT_MESSAGE,
            UsageProbe::NotFound(message) | UsageProbe::SpawnFailed(message) => message,
        }
    }
}

/// Spawns CDP programs from a single install directory.
#[derive(Debug, Clone)]
pub struct Executor {
    cdp_path: PathBuf,
    scratch_dir: PathBuf,
    translation: ArchTranslation,
}

impl Executor {
    pub fn new(config: &Config) -> Self {
        Self {
            cdp_path: config.cdp_path.clone(),
            scratch_dir: config.scratch_dir.clone(),
            translation: config.translation,
        }
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Resolve a program name to its executable.
    ///
    /// Names that are not a single plain path component never leave the
    /// install directory and are reported as not found.
    pub fn locate(&self, program: &str) -> Result<PathBuf, Error> {
        let path = self.cdp_path.join(program);
        let mut components = Path::new(program).components();
        let plain = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );

        if plain && path.exists() {
            Ok(path)
        } else {
            Err(Error::program_not_found(program, path))
        }
    }

    /// Full argv for a located program, translation prefix included.
    pub fn invocation(&self, program_path: &Path, args: &[String]) -> Vec<String> {
        self.translation
            .prefix()
            .iter()
            .map(|s| s.to_string())
            .chain(std::iter::once(program_path.display().to_string()))
            .chain(args.iter().cloned())
            .collect()
    }

    fn command(&self, program_path: &Path, args: &[String]) -> Command {
        let mut cmd = match self.translation.prefix() {
            [launcher, launcher_args @ ..] => {
                let mut cmd = Command::new(launcher);
                cmd.args(launcher_args).arg(program_path);
                cmd
            }
            [] => Command::new(program_path),
        };
        // stdin stays closed: under stdio transport it carries the MCP stream
        cmd.args(args)
            .current_dir(&self.scratch_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Path used for the output-file check, relative to the working directory of the run.
    pub fn resolve_output(&self, arg: &str) -> PathBuf {
        let path = Path::new(arg);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.scratch_dir.join(path)
        }
    }

    /// Run a full command array (`[program, args...]`) to completion.
    ///
    /// No time limit applies; a program that never exits blocks the call.
    #[instrument(level = "debug", skip(self), fields(program = command.first().map(String::as_str)))]
    pub async fn run(&self, command: &[String]) -> Result<ExecutionResult, Error> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| Error::validation("Empty command array"))?;

        let program_path = self.locate(program)?;
        let invocation = self.invocation(&program_path, args);
        info!(command = %invocation.join(" "), "Executing");

        let output = self
            .command(&program_path, args)
            .output()
            .await
            .map_err(|e| Error::process(e.to_string()))?;

        let (exit_code, stdout, stderr) = decode_output(output);
        let verdict = infer_verdict(exit_code, &stdout, &stderr, || {
            verdict_output_candidate(command)
                .map(|arg| self.resolve_output(arg).exists())
                .unwrap_or(false)
        });

        if verdict.is_success() {
            debug!(exit_code, ?verdict, "Run accepted");
        } else {
            warn!(exit_code, stderr = %stderr.trim_end(), "Run failed");
        }

        Ok(ExecutionResult {
            exit_code,
            stdout,
            stderr,
            verdict,
        })
    }

    /// Run a program bare (or with one sub-command) to capture its usage text.
    #[instrument(level = "debug", skip(self))]
    pub async fn probe_usage(&self, program: &str, subprogram: Option<&str>) -> UsageProbe {
        self.probe_usage_within(program, subprogram, Duration::from_secs(USAGE_PROBE_TIMEOUT_SECS))
            .await
    }

    pub(crate) async fn probe_usage_within(
        &self,
        program: &str,
        subprogram: Option<&str>,
        limit: Duration,
    ) -> UsageProbe {
        let program_path = match self.locate(program) {
            Ok(path) => path,
            Err(e) => return UsageProbe::NotFound(e.to_string()),
        };
        let args: Vec<String> = subprogram.map(str::to_string).into_iter().collect();

        // Dropping the future on timeout kills the child (kill_on_drop)
        match tokio::time::timeout(limit, self.command(&program_path, &args).output()).await {
            Ok(Ok(output)) => {
                let (exit_code, stdout, stderr) = decode_output(output);
                debug!(exit_code, stdout_len = stdout.len(), stderr_len = stderr.len(), "Usage probe finished");
                UsageProbe::Completed {
                    exit_code,
                    stdout,
                    stderr,
                }
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Usage probe could not start");
                UsageProbe::SpawnFailed(format!("Failed to execute: {}", e))
            }
            Err(_) => {
                warn!(timeout_secs = limit.as_secs_f64(), "Usage probe timed out");
                UsageProbe::TimedOut
            }
        }
    }
}

fn decode_output(output: Output) -> (i32, String, String) {
    (
        exit_code_of(output.status),
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
    )
}

/// Exit code, or the negated signal number for a signalled process on Unix.
fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    NO_EXIT_CODE
}
