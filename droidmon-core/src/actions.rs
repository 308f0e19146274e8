//! User-initiated actions
//!
//! Each action is a single one-off `adb` invocation whose outcome, including
//! captured output, goes straight back to the caller.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::Serialize;
use tracing::Instrument;

use crate::adb::{CommandOutput, OneOffRunner};
use crate::client::DeviceClient;
use crate::error::ActionError;
use crate::tracing::span_names;

/// Installs can take minutes on slow storage
pub const INSTALL_TIMEOUT_SECS: u64 = 300;

/// Output of a successful action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionOutcome {
    /// Short action name
    pub action: String,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

/// Result of an action
pub type ActionResult = Result<ActionOutcome, ActionError>;

/// Dot-separated Java identifiers, e.g. `com.example.app`
static PACKAGE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_]*(\.[A-Za-z][A-Za-z0-9_]*)*$")
        .expect("PACKAGE_NAME is a valid regex pattern")
});

/// Whether `name` is a plausible Android package name
#[must_use]
pub fn is_valid_package_name(name: &str) -> bool {
    PACKAGE_NAME.is_match(name)
}

fn rejected(action: &str, message: String) -> ActionError {
    ActionError {
        action: action.to_string(),
        stdout: String::new(),
        stderr: message,
    }
}

fn into_result(action: &str, output: CommandOutput) -> ActionResult {
    if output.success {
        Ok(ActionOutcome {
            action: action.to_string(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    } else {
        Err(ActionError {
            action: action.to_string(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

async fn run_action(
    action: &str,
    runner: &OneOffRunner,
    args: &[&str],
    strict: bool,
) -> ActionResult {
    let span = crate::trace_operation!(span_names::ACTION_EXECUTE, action);
    async {
        let output = runner.execute(args, strict).await;
        let result = into_result(action, output);
        match &result {
            Ok(_) => tracing::info!("Action succeeded"),
            Err(e) => tracing::warn!(error = %e, "Action failed"),
        }
        result
    }
    .instrument(span)
    .await
}

/// `adb connect <address>`
///
/// Always strict: `adb connect` exits 0 when it fails to connect.
///
/// # Errors
///
/// Returns [`ActionError`] with the captured output when the address is
/// empty or adb reports failure.
pub async fn connect(client: &DeviceClient, address: &str) -> ActionResult {
    let address = address.trim();
    if address.is_empty() || address.contains(char::is_whitespace) {
        return Err(rejected("connect", format!("invalid address: {address:?}")));
    }
    let runner = client.runner().without_base_args();
    run_action("connect", &runner, &["connect", address], true).await
}

/// `adb install -r <apk>`
///
/// # Errors
///
/// Returns [`ActionError`] when the file is missing or adb reports failure.
pub async fn install(client: &DeviceClient, apk_path: &std::path::Path) -> ActionResult {
    if !apk_path.is_file() {
        return Err(rejected(
            "install",
            format!("no such file: {}", apk_path.display()),
        ));
    }
    let path = apk_path.to_string_lossy();
    let runner = client
        .runner()
        .clone()
        .with_timeout(Duration::from_secs(INSTALL_TIMEOUT_SECS));
    run_action("install", &runner, &["install", "-r", &path], client.strict_success()).await
}

/// `adb uninstall <package>`
///
/// # Errors
///
/// Returns [`ActionError`] for an invalid package name or when adb reports
/// failure.
pub async fn uninstall(client: &DeviceClient, package: &str) -> ActionResult {
    if !is_valid_package_name(package) {
        return Err(rejected("uninstall", format!("invalid package name: {package:?}")));
    }
    run_action(
        "uninstall",
        client.runner(),
        &["uninstall", package],
        client.strict_success(),
    )
    .await
}

/// `adb shell kill <pid>`
///
/// # Errors
///
/// Returns [`ActionError`] for a kernel bookkeeping PID or when the kill
/// fails (typically "Operation not permitted" without root).
pub async fn kill(client: &DeviceClient, pid: u32) -> ActionResult {
    if pid <= 2 {
        return Err(rejected("kill", format!("refusing to kill pid {pid}")));
    }
    let pid = pid.to_string();
    run_action(
        "kill",
        client.runner(),
        &["shell", "kill", &pid],
        client.strict_success(),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adb::{FixedTransport, ShellTransport};
    use std::sync::Arc;

    fn client(program: &str) -> DeviceClient {
        DeviceClient::with_transports(
            None,
            Arc::new(FixedTransport::new(None)) as Arc<dyn ShellTransport>,
            OneOffRunner::new(program, Vec::new()),
        )
    }

    #[test]
    fn test_package_name_validation() {
        assert!(is_valid_package_name("com.example.app"));
        assert!(is_valid_package_name("org.foo_bar.Baz2"));
        assert!(!is_valid_package_name(""));
        assert!(!is_valid_package_name("com.example;reboot"));
        assert!(!is_valid_package_name(".hidden"));
        assert!(!is_valid_package_name("com example"));
        assert!(!is_valid_package_name("com..example"));
        assert!(!is_valid_package_name("com.example."));
        assert!(!is_valid_package_name("com.1example"));
    }

    #[tokio::test]
    async fn test_uninstall_rejects_bad_name_without_running() {
        let err = uninstall(&client("false"), "a b").await.unwrap_err();
        assert_eq!(err.action, "uninstall");
        assert!(err.stderr.contains("invalid package name"));
    }

    #[tokio::test]
    async fn test_kill_refuses_bookkeeping_pids() {
        assert!(kill(&client("true"), 1).await.is_err());
    }

    #[tokio::test]
    async fn test_install_missing_file() {
        let err = install(&client("true"), std::path::Path::new("/nonexistent/app.apk"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no such file"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_connect_strict_detects_failure_text() {
        // `echo` exits 0 while printing "failed", as `adb connect` does
        let err = connect(&client("echo"), "failed-host:5555").await.unwrap_err();
        assert_eq!(err.action, "connect");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_uninstall_success_passes_output_through() {
        let outcome = uninstall(&client("echo"), "com.example.app")
            .await
            .expect("echo exits 0");
        assert_eq!(outcome.stdout.trim(), "uninstall com.example.app");
    }
}
