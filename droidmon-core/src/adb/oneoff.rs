//! One-shot command execution
//!
//! Spawns a single `adb` invocation per call and captures both streams. Used
//! for explicit actions (connect, install, uninstall) and as the fallback
//! transport for telemetry commands when no persistent session is available.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::cancel::CancellationToken;
use super::transport::ShellTransport;

/// Default timeout for one-off commands (seconds)
pub const DEFAULT_ONE_OFF_TIMEOUT_SECS: u64 = 10;

/// Captured result of one external command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Whether the command is considered successful (see [`OneOffRunner::execute`])
    pub success: bool,
    /// Process exit code, `None` when the process never ran to completion
    pub exit_code: Option<i32>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error (or the spawn/timeout message)
    pub stderr: String,
}

impl CommandOutput {
    fn not_run(message: String) -> Self {
        Self {
            success: false,
            exit_code: None,
            stdout: String::new(),
            stderr: message,
        }
    }

    /// Returns true when the process ran and exited, whatever its exit code
    #[must_use]
    pub const fn completed(&self) -> bool {
        self.exit_code.is_some()
    }
}

/// Returns true if `stdout` contains `error` or `failed` (case-insensitive).
///
/// `adb` subcommands such as `connect` exit 0 while printing a human-readable
/// failure, so strict mode treats these words as failure. This misclassifies
/// legitimate output that happens to contain either word.
#[must_use]
pub fn looks_like_failure(stdout: &str) -> bool {
    let lower = stdout.to_lowercase();
    lower.contains("error") || lower.contains("failed")
}

/// Spawns one external process per call
#[derive(Debug, Clone)]
pub struct OneOffRunner {
    program: String,
    base_args: Vec<String>,
    timeout: Duration,
}

impl OneOffRunner {
    /// Creates a runner for an arbitrary program
    #[must_use]
    pub fn new(program: impl Into<String>, base_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            base_args,
            timeout: Duration::from_secs(DEFAULT_ONE_OFF_TIMEOUT_SECS),
        }
    }

    /// Creates a runner for `adb`, targeting `serial` when given
    #[must_use]
    pub fn adb(adb_path: impl Into<String>, serial: Option<&str>) -> Self {
        let base_args = serial
            .map(|s| vec!["-s".to_string(), s.to_string()])
            .unwrap_or_default();
        Self::new(adb_path, base_args)
    }

    /// Sets the per-call timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the program this runner spawns
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Returns a runner for the same program without the device-selecting
    /// base arguments (needed for `adb connect`)
    #[must_use]
    pub fn without_base_args(&self) -> Self {
        Self {
            program: self.program.clone(),
            base_args: Vec::new(),
            timeout: self.timeout,
        }
    }

    /// Runs the program with `args` appended to the base arguments.
    ///
    /// `success` is `exit_code == 0`; with `strict` it additionally requires
    /// that stdout passes [`looks_like_failure`].
    pub async fn execute(&self, args: &[&str], strict: bool) -> CommandOutput {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.base_args)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(program = %self.program, ?args, "Running one-off command");

        match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
                let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
                let exited_ok = output.status.success();
                let success = exited_ok && !(strict && looks_like_failure(&stdout));
                if exited_ok && !success {
                    tracing::debug!(
                        program = %self.program,
                        "Exit code 0 but output reports failure"
                    );
                }
                CommandOutput {
                    success,
                    exit_code: output.status.code(),
                    stdout,
                    stderr,
                }
            }
            Ok(Err(e)) => {
                tracing::debug!(program = %self.program, error = %e, "Failed to spawn");
                CommandOutput::not_run(format!("Failed to spawn {}: {e}", self.program))
            }
            Err(_) => CommandOutput::not_run(format!(
                "{} timed out after {}s",
                self.program,
                self.timeout.as_secs()
            )),
        }
    }
}

/// Runs shell command text through a fresh [`OneOffRunner`] process per call
///
/// For `adb` the prefix is `["shell"]`, producing `adb -s <serial> shell <cmd>`.
#[derive(Debug, Clone)]
pub struct OneOffShell {
    runner: OneOffRunner,
    shell_prefix: Vec<String>,
}

impl OneOffShell {
    /// Creates a shell transport that prefixes every command with `shell_prefix`
    #[must_use]
    pub const fn new(runner: OneOffRunner, shell_prefix: Vec<String>) -> Self {
        Self {
            runner,
            shell_prefix,
        }
    }

    /// Creates the `adb ... shell <command>` transport
    #[must_use]
    pub fn adb(runner: OneOffRunner) -> Self {
        Self::new(runner, vec!["shell".to_string()])
    }
}

#[async_trait]
impl ShellTransport for OneOffShell {
    async fn run(&self, command: &str, cancel: &CancellationToken) -> Option<String> {
        if cancel.is_cancelled() {
            return None;
        }
        let mut args: Vec<&str> = self.shell_prefix.iter().map(String::as_str).collect();
        args.push(command);

        let output = tokio::select! {
            () = cancel.cancelled() => return None,
            output = self.runner.execute(&args, false) => output,
        };

        // Globs over /proc race with exiting processes, so a non-zero exit
        // still carries usable output
        if output.completed() && (output.success || !output.stdout.is_empty()) {
            Some(output.stdout)
        } else {
            tracing::debug!(stderr = %output.stderr.trim(), "One-off shell command failed");
            None
        }
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "one-off"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_looks_like_failure_is_case_insensitive() {
        assert!(looks_like_failure("failed to connect to 10.0.0.2:5555"));
        assert!(looks_like_failure("Failure [DELETE_FAILED_INTERNAL_ERROR]"));
        assert!(looks_like_failure("ERROR: no devices"));
        assert!(!looks_like_failure("connected to 10.0.0.2:5555"));
        assert!(!looks_like_failure("Success"));
    }

    #[test]
    fn test_adb_runner_base_args() {
        let runner = OneOffRunner::adb("adb", Some("emulator-5554"));
        assert_eq!(runner.base_args, vec!["-s", "emulator-5554"]);
        assert!(runner.without_base_args().base_args.is_empty());

        let runner = OneOffRunner::adb("/opt/sdk/adb", None);
        assert!(runner.base_args.is_empty());
        assert_eq!(runner.program(), "/opt/sdk/adb");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_captures_streams() {
        let runner = OneOffRunner::new("sh", Vec::new());
        let output = runner
            .execute(&["-c", "echo out; echo err >&2"], false)
            .await;
        assert!(output.success);
        assert_eq!(output.exit_code, Some(0));
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_strict_flags_error_text() {
        let runner = OneOffRunner::new("sh", Vec::new());
        let lenient = runner
            .execute(&["-c", "echo 'failed to connect'"], false)
            .await;
        assert!(lenient.success);

        let strict = runner
            .execute(&["-c", "echo 'failed to connect'"], true)
            .await;
        assert!(!strict.success);
        assert_eq!(strict.exit_code, Some(0));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_nonzero_exit() {
        let runner = OneOffRunner::new("sh", Vec::new());
        let output = runner.execute(&["-c", "exit 3"], false).await;
        assert!(!output.success);
        assert_eq!(output.exit_code, Some(3));
    }

    #[tokio::test]
    async fn test_execute_missing_program() {
        let runner = OneOffRunner::new("droidmon-definitely-not-a-program", Vec::new());
        let output = runner.execute(&["devices"], false).await;
        assert!(!output.success);
        assert!(!output.completed());
        assert!(output.stderr.contains("Failed to spawn"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_times_out() {
        let runner =
            OneOffRunner::new("sh", Vec::new()).with_timeout(Duration::from_millis(100));
        let output = runner.execute(&["-c", "sleep 5"], false).await;
        assert!(!output.success);
        assert!(output.stderr.contains("timed out"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_one_off_shell_runs_command_text() {
        let shell = OneOffShell::new(OneOffRunner::new("sh", Vec::new()), vec!["-c".into()]);
        let out = shell
            .run("echo a; echo b", &CancellationToken::new())
            .await;
        assert_eq!(out.as_deref(), Some("a\nb\n"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_one_off_shell_keeps_output_of_failing_glob() {
        let shell = OneOffShell::new(OneOffRunner::new("sh", Vec::new()), vec!["-c".into()]);
        let out = shell
            .run("echo partial; exit 1", &CancellationToken::new())
            .await;
        assert_eq!(out.as_deref(), Some("partial\n"));

        let out = shell.run("exit 1", &CancellationToken::new()).await;
        assert!(out.is_none());
    }
}
