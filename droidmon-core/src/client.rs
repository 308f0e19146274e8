//! Device client
//!
//! Owns everything needed to talk to one device: the persistent session,
//! the one-off fallback transport, the runner for explicit actions, and the
//! gate that keeps expensive measurements from overlapping.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::Instrument;

use crate::adb::{
    CancellationToken, OneOffRunner, OneOffShell, RemoteShellSession, ShellLauncher,
    ShellTransport, run_with_fallback,
};
use crate::batch::{CommandBatch, SectionMap};
use crate::config::AdbSettings;
use crate::error::ShellResult;
use crate::tracing::span_names;

/// Concurrent expensive measurements allowed per device
pub const MEASUREMENT_PERMITS: usize = 1;

/// Handle to one device
pub struct DeviceClient {
    serial: Option<String>,
    session: Option<Arc<RemoteShellSession>>,
    fallback: Arc<dyn ShellTransport>,
    runner: OneOffRunner,
    strict_success: bool,
    measurement_gate: Arc<Semaphore>,
}

impl DeviceClient {
    /// Builds a client from settings. No process is spawned until the first
    /// command or [`DeviceClient::open_session`].
    #[must_use]
    pub fn new(settings: &AdbSettings) -> Self {
        let serial = settings.serial.as_deref();
        let timeout = Duration::from_secs(settings.command_timeout_secs.max(1));

        let runner = OneOffRunner::adb(&settings.adb_path, serial).with_timeout(timeout);
        let session = RemoteShellSession::new(ShellLauncher::adb(&settings.adb_path, serial))
            .with_command_timeout(timeout);

        Self {
            serial: settings.serial.clone(),
            session: Some(Arc::new(session)),
            fallback: Arc::new(OneOffShell::adb(runner.clone())),
            runner,
            strict_success: settings.strict_success,
            measurement_gate: Arc::new(Semaphore::new(MEASUREMENT_PERMITS)),
        }
    }

    /// Builds a client from explicit parts
    #[must_use]
    pub fn with_transports(
        session: Option<Arc<RemoteShellSession>>,
        fallback: Arc<dyn ShellTransport>,
        runner: OneOffRunner,
    ) -> Self {
        Self {
            serial: None,
            session,
            fallback,
            runner,
            strict_success: true,
            measurement_gate: Arc::new(Semaphore::new(MEASUREMENT_PERMITS)),
        }
    }

    /// Device serial, if one was configured
    #[must_use]
    pub fn serial(&self) -> Option<&str> {
        self.serial.as_deref()
    }

    /// The persistent session, if this client has one
    #[must_use]
    pub fn session(&self) -> Option<&Arc<RemoteShellSession>> {
        self.session.as_ref()
    }

    /// Runner for explicit one-shot actions
    #[must_use]
    pub const fn runner(&self) -> &OneOffRunner {
        &self.runner
    }

    /// Whether actions apply the output-based failure heuristic
    #[must_use]
    pub const fn strict_success(&self) -> bool {
        self.strict_success
    }

    /// Gate shared by expensive measurements on this device
    #[must_use]
    pub fn measurement_gate(&self) -> Arc<Semaphore> {
        Arc::clone(&self.measurement_gate)
    }

    /// Spawns the persistent shell eagerly.
    ///
    /// Not required: the session opens itself on first use. Calling this
    /// surfaces spawn errors up front.
    ///
    /// # Errors
    ///
    /// Returns the spawn error; a client without a session succeeds trivially.
    pub async fn open_session(&self) -> ShellResult<()> {
        match &self.session {
            Some(session) => session.open().await,
            None => Ok(()),
        }
    }

    /// Runs shell text through the session, falling back to a one-off
    /// process. `None` means both failed or the call was cancelled.
    pub async fn run_shell(&self, command: &str, cancel: &CancellationToken) -> Option<String> {
        let primary = self
            .session
            .as_deref()
            .map(|s| s as &dyn ShellTransport);
        run_with_fallback(primary, self.fallback.as_ref(), command, cancel).await
    }

    /// Runs shell text in its own one-off process, bypassing the session so
    /// it can overlap a session command
    pub async fn run_one_off(&self, command: &str, cancel: &CancellationToken) -> Option<String> {
        self.fallback.run(command, cancel).await
    }

    /// Runs a batch in one round trip and splits the response.
    ///
    /// `None` only for transport failure; missing sections are left to the
    /// caller's defaults.
    pub async fn run_batch(
        &self,
        batch: &CommandBatch,
        cancel: &CancellationToken,
    ) -> Option<SectionMap> {
        let span = crate::trace_operation_debug!(
            span_names::BATCH_EXECUTE,
            batch = %batch.name(),
            queries = batch.len()
        );
        async {
            let output = self.run_shell(&batch.render(), cancel).await?;
            let sections = batch.demux(&output);
            tracing::debug!(sections = sections.len(), "Batch demultiplexed");
            Some(sections)
        }
        .instrument(span)
        .await
    }

    /// Closes the persistent session. It reopens on the next command.
    pub async fn close(&self) {
        if let Some(session) = &self.session {
            session.close().await;
        }
    }

    /// Closes the session for good; later commands use the one-off transport
    pub async fn dispose(&self) {
        if let Some(session) = &self.session {
            session.dispose().await;
        }
    }
}

impl std::fmt::Debug for DeviceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceClient")
            .field("serial", &self.serial)
            .field("session", &self.session)
            .field("fallback", &self.fallback.name())
            .field("runner", &self.runner)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adb::FixedTransport;

    fn client_with(reply: Option<&str>) -> (DeviceClient, Arc<FixedTransport>) {
        let fallback = Arc::new(FixedTransport::new(reply));
        let client = DeviceClient::with_transports(
            None,
            Arc::clone(&fallback) as Arc<dyn ShellTransport>,
            OneOffRunner::new("true", Vec::new()),
        );
        (client, fallback)
    }

    #[tokio::test]
    async fn test_run_batch_without_session_uses_fallback() {
        let (client, fallback) = client_with(Some("____a____\n1\n____b____\n2\n"));
        let batch = CommandBatch::new("t")
            .with_command("a", "echo 1")
            .and_then(|b| b.with_command("b", "echo 2"))
            .expect("valid batch");

        let sections = client
            .run_batch(&batch, &CancellationToken::new())
            .await
            .expect("fallback replies");
        assert_eq!(sections.text("a"), "1\n");
        assert_eq!(sections.text("b"), "2\n");
        assert_eq!(fallback.calls(), 1);
        let seen = fallback.seen.lock().expect("seen lock").clone();
        assert_eq!(seen, [batch.render()]);
    }

    #[tokio::test]
    async fn test_run_batch_transport_failure() {
        let (client, _) = client_with(None);
        let batch = CommandBatch::new("t").with_command("a", "true").expect("valid batch");
        assert!(client.run_batch(&batch, &CancellationToken::new()).await.is_none());
    }

    #[test]
    fn test_new_from_settings() {
        let settings = AdbSettings {
            serial: Some("emulator-5554".into()),
            ..AdbSettings::default()
        };
        let client = DeviceClient::new(&settings);
        assert_eq!(client.serial(), Some("emulator-5554"));
        assert!(client.session().is_some());
        assert!(client.strict_success());
        assert_eq!(client.measurement_gate().available_permits(), 1);
    }
}
