//! Integration test modules

#[cfg(unix)]
mod session_tests;

#[cfg(target_os = "linux")]
mod telemetry_tests;
