//! Logging and tracing wrapper.
//!
//! `Telemetry` is the narrow surface the rest of the service logs through:
//! interaction events get a span plus a structured log line, errors get a
//! span marked errored plus an error line. Neither call can fail.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{error, info, info_span};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// Respects `RUST_LOG`; defaults to `info`. When `MAIL_ASSIST_LOG_DIR` is
/// set, output goes to a daily-rolling file in that directory instead of
/// stderr.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match std::env::var("MAIL_ASSIST_LOG_DIR") {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "mail-assist.log");
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(appender)
                .with_ansi(false)
                .init();
        }
        Err(_) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .init();
        }
    }
}

/// Telemetry handle for interaction and error logging.
///
/// Holds no state beyond an error counter (exposed for tests asserting the
/// log-then-propagate contract).
#[derive(Debug, Default)]
pub struct Telemetry {
    errors_logged: AtomicU64,
}

impl Telemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an interaction event. Never fails.
    pub fn log_interaction(&self, kind: &str, details: &serde_json::Value) {
        let span = info_span!("interaction", kind = kind);
        let _guard = span.enter();
        info!(kind = kind, "Email interaction");
        tracing::debug!(details = %details, "Interaction details");
    }

    /// Record an error. Never fails.
    ///
    /// The orchestrator calls this exactly once before propagating a step
    /// failure.
    pub fn log_error(&self, message: &str, error: &str) {
        self.errors_logged.fetch_add(1, Ordering::Relaxed);
        let span = info_span!("error", error.message = message);
        let _guard = span.enter();
        error!(error = error, "{message}");
    }

    /// Number of errors logged so far on this handle.
    pub fn errors_logged(&self) -> u64 {
        self.errors_logged.load(Ordering::Relaxed)
    }
}
