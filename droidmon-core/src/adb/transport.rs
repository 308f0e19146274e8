//! Transport strategy shared by the persistent session and one-off runner

use async_trait::async_trait;

use super::cancel::CancellationToken;

/// A way of running shell command text on the device and collecting its output
///
/// Implementations never return errors: a transport failure is reported as
/// `None` and the caller retries on its next cycle.
#[async_trait]
pub trait ShellTransport: Send + Sync {
    /// Runs `command` and returns its standard output, or `None` on failure
    /// or cancellation
    async fn run(&self, command: &str, cancel: &CancellationToken) -> Option<String>;

    /// Whether this transport can accept work right now
    fn is_available(&self) -> bool;

    /// Short name for log output
    fn name(&self) -> &'static str;
}

/// Tries `primary` when it exists and is available, otherwise (or when it
/// fails without being cancelled) runs `command` through `fallback`.
pub async fn run_with_fallback(
    primary: Option<&dyn ShellTransport>,
    fallback: &dyn ShellTransport,
    command: &str,
    cancel: &CancellationToken,
) -> Option<String> {
    if let Some(primary) = primary
        && primary.is_available()
    {
        if let Some(output) = primary.run(command, cancel).await {
            return Some(output);
        }
        if cancel.is_cancelled() {
            return None;
        }
        tracing::debug!(
            primary = primary.name(),
            fallback = fallback.name(),
            "Primary transport failed, falling back"
        );
    }
    fallback.run(command, cancel).await
}
