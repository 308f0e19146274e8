//! Device transports
//!
//! Two ways of running shell command text on the device share the
//! [`ShellTransport`] strategy: a persistent [`RemoteShellSession`] (one
//! long-lived `adb shell` process, commands serialized) and [`OneOffShell`]
//! (a fresh `adb shell <cmd>` per call). [`run_with_fallback`] encodes the
//! "try the session, else one-off" policy.

mod cancel;
mod oneoff;
mod session;
mod transport;

pub use cancel::CancellationToken;
pub use oneoff::{
    CommandOutput, DEFAULT_ONE_OFF_TIMEOUT_SECS, OneOffRunner, OneOffShell, looks_like_failure,
};
pub use session::{
    DEFAULT_COMMAND_TIMEOUT_SECS, RemoteShellSession, SessionState, ShellLauncher,
};
pub use transport::{ShellTransport, run_with_fallback};

#[cfg(test)]
pub(crate) use transport::tests::FixedTransport;
