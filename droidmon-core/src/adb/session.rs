//! Persistent remote shell session
//!
//! Keeps one `adb shell` child process alive and feeds it command text over
//! stdin. Each command is bracketed by echoed begin/end markers so the output
//! of one call can be cut out of the shared stdout stream. Calls are
//! serialized through an async mutex: a single pipe has no way to attribute
//! output lines to concurrent requests.
//!
//! A session that loses its output stream becomes [`SessionState::Dead`] and
//! is transparently respawned by the next [`RemoteShellSession::run`].

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::Instrument;

use super::cancel::CancellationToken;
use super::transport::ShellTransport;
use crate::error::{ShellError, ShellResult};

/// Default time a single command may take before the session is torn down
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 10;

/// Prefix of the echoed marker lines. The sequence number and suffix make
/// every marker unique per call.
const MARKER_PREFIX: &str = "__DROIDMON_7f3a9c_";

/// Lifecycle state of the shell child process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    /// No child process; `open` or `run` will spawn one
    Closed = 0,
    /// Child process is being spawned
    Starting = 1,
    /// Child process is running and accepting commands
    Open = 2,
    /// Output stream closed unexpectedly; respawned on next `run`
    Dead = 3,
}

impl SessionState {
    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Starting,
            2 => Self::Open,
            3 => Self::Dead,
            _ => Self::Closed,
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Starting => write!(f, "starting"),
            Self::Open => write!(f, "open"),
            Self::Dead => write!(f, "dead"),
        }
    }
}

/// How to spawn the interactive shell process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellLauncher {
    program: String,
    args: Vec<String>,
}

impl ShellLauncher {
    /// Creates a launcher for an arbitrary program reading commands on stdin
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Creates the `adb [-s serial] shell` launcher
    #[must_use]
    pub fn adb(adb_path: impl Into<String>, serial: Option<&str>) -> Self {
        let mut args = Vec::new();
        if let Some(serial) = serial {
            args.push("-s".to_string());
            args.push(serial.to_string());
        }
        args.push("shell".to_string());
        Self::new(adb_path, args)
    }

    /// Returns the program name
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Returns the arguments passed to the program
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl std::fmt::Display for ShellLauncher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

struct ShellProcess {
    child: Child,
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
}

/// Outcome of scanning the output stream for a command's end marker
#[derive(Debug, PartialEq, Eq)]
enum ReadOutcome {
    Complete(String),
    Cancelled,
    Closed,
}

/// A persistent shell child process with serialized command execution
pub struct RemoteShellSession {
    launcher: ShellLauncher,
    command_timeout: Duration,
    process: Mutex<Option<ShellProcess>>,
    state: AtomicU8,
    disposed: AtomicBool,
    sequence: AtomicU64,
}

impl RemoteShellSession {
    /// Creates a closed session; nothing is spawned until `open` or `run`
    #[must_use]
    pub fn new(launcher: ShellLauncher) -> Self {
        Self {
            launcher,
            command_timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS),
            process: Mutex::new(None),
            state: AtomicU8::new(SessionState::Closed as u8),
            disposed: AtomicBool::new(false),
            sequence: AtomicU64::new(0),
        }
    }

    /// Sets how long one command may run before the session is torn down
    #[must_use]
    pub const fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Returns the launcher used to spawn the shell
    #[must_use]
    pub const fn launcher(&self) -> &ShellLauncher {
        &self.launcher
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Whether the child process is running
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.state() == SessionState::Open
    }

    /// Whether `dispose` has been called
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    fn set_state(&self, state: SessionState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    /// Spawns the shell process if it is not already running.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::Disposed`] after `dispose`, or a spawn error if
    /// the process could not be started.
    pub async fn open(&self) -> ShellResult<()> {
        if self.is_disposed() {
            return Err(ShellError::Disposed);
        }
        let mut guard = self.process.lock().await;
        if guard.is_some() && self.is_alive() {
            return Ok(());
        }
        self.spawn_into(&mut guard)
    }

    fn spawn_into(&self, slot: &mut Option<ShellProcess>) -> ShellResult<()> {
        Self::teardown(slot);
        self.set_state(SessionState::Starting);
        let _span = tracing::debug_span!(
            crate::tracing::span_names::SESSION_OPEN,
            launcher = %self.launcher
        )
        .entered();

        let mut child = Command::new(&self.launcher.program)
            .args(&self.launcher.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| {
                self.set_state(SessionState::Closed);
                ShellError::Spawn {
                    program: self.launcher.program.clone(),
                    source,
                }
            })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.start_kill();
            self.set_state(SessionState::Closed);
            return Err(ShellError::MissingPipe("stdin/stdout"));
        };

        *slot = Some(ShellProcess {
            child,
            stdin,
            lines: BufReader::new(stdout).lines(),
        });
        self.set_state(SessionState::Open);
        tracing::debug!("Shell session opened");
        Ok(())
    }

    fn teardown(slot: &mut Option<ShellProcess>) {
        if let Some(mut process) = slot.take() {
            let _ = process.child.start_kill();
        }
    }

    fn mark_dead(&self, slot: &mut Option<ShellProcess>, error: &ShellError) {
        Self::teardown(slot);
        self.set_state(SessionState::Dead);
        tracing::warn!(error = %error, "Shell session died, will restart on next command");
    }

    /// Runs `command` and returns everything it printed to stdout.
    ///
    /// Returns `None` when the session is disposed, when `cancel` fires, or
    /// when the shell dies or times out; the next call respawns a dead shell.
    /// Concurrent callers queue on an internal lock.
    pub async fn run(&self, command: &str, cancel: &CancellationToken) -> Option<String> {
        if self.is_disposed() || cancel.is_cancelled() {
            return None;
        }

        let mut guard = tokio::select! {
            () = cancel.cancelled() => return None,
            guard = self.process.lock() => guard,
        };
        if self.is_disposed() {
            return None;
        }

        if guard.is_none() || !self.is_alive() {
            if self.state() == SessionState::Dead {
                tracing::debug!("Restarting dead shell session");
            }
            if let Err(e) = self.spawn_into(&mut guard) {
                tracing::warn!(error = %e, "Failed to open shell session");
                return None;
            }
        }

        let seq = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let span = tracing::debug_span!(crate::tracing::span_names::SESSION_RUN, seq);
        self.exchange(&mut guard, seq, command, cancel)
            .instrument(span)
            .await
    }

    async fn exchange(
        &self,
        slot: &mut Option<ShellProcess>,
        seq: u64,
        command: &str,
        cancel: &CancellationToken,
    ) -> Option<String> {
        let begin = format!("{MARKER_PREFIX}{seq}_BEGIN__");
        let end = format!("{MARKER_PREFIX}{seq}_END__");
        let script = format!("echo {begin}\n{command}\necho {end}\n");

        let process = slot.as_mut()?;
        let written = async {
            process.stdin.write_all(script.as_bytes()).await?;
            process.stdin.flush().await
        }
        .await;
        if let Err(e) = written {
            self.mark_dead(slot, &ShellError::Write(e));
            return None;
        }

        let outcome = tokio::time::timeout(
            self.command_timeout,
            read_until_marker(&mut process.lines, &begin, &end, cancel),
        )
        .await;

        match outcome {
            Ok(ReadOutcome::Complete(output)) => {
                tracing::trace!(bytes = output.len(), "Command completed");
                Some(output)
            }
            Ok(ReadOutcome::Cancelled) => {
                tracing::debug!("Command cancelled, session kept open");
                None
            }
            Ok(ReadOutcome::Closed) => {
                self.mark_dead(slot, &ShellError::Closed);
                None
            }
            Err(_) => {
                let secs = self.command_timeout.as_secs();
                self.mark_dead(slot, &ShellError::Timeout(secs));
                None
            }
        }
    }

    /// Kills the child process. A later `run` opens a fresh one.
    pub async fn close(&self) {
        let mut guard = self.process.lock().await;
        let _span = tracing::debug_span!(crate::tracing::span_names::SESSION_CLOSE).entered();
        Self::teardown(&mut guard);
        self.set_state(SessionState::Closed);
        tracing::debug!("Shell session closed");
    }

    /// Closes the session permanently; every later `run` returns `None`
    pub async fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        self.close().await;
    }
}

impl std::fmt::Debug for RemoteShellSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteShellSession")
            .field("launcher", &self.launcher)
            .field("state", &self.state())
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ShellTransport for RemoteShellSession {
    async fn run(&self, command: &str, cancel: &CancellationToken) -> Option<String> {
        Self::run(self, command, cancel).await
    }

    fn is_available(&self) -> bool {
        !self.is_disposed()
    }

    fn name(&self) -> &'static str {
        "session"
    }
}

/// Reads lines until `end` is seen, keeping only lines after `begin`.
///
/// Lines before `begin` belong to an earlier call that was cancelled and are
/// dropped. `Lines::next_line` is cancel-safe, so losing the race against
/// `cancel` leaves the stream at a line boundary.
async fn read_until_marker<R>(
    lines: &mut Lines<R>,
    begin: &str,
    end: &str,
    cancel: &CancellationToken,
) -> ReadOutcome
where
    R: AsyncBufRead + Unpin,
{
    let mut started = false;
    let mut output = String::new();
    loop {
        let line = tokio::select! {
            biased;
            () = cancel.cancelled() => return ReadOutcome::Cancelled,
            line = lines.next_line() => line,
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) | Err(_) => return ReadOutcome::Closed,
        };
        let line = line.trim_end_matches('\r');
        if !started {
            started = line == begin;
            continue;
        }
        if line == end {
            return ReadOutcome::Complete(output);
        }
        output.push_str(line);
        output.push('\n');
    }
}
