//! ## parkzone-telemetry::logging
//! **Structured logging with `tracing`**
//!
//! Every lifecycle transition that reaches a terminal or allocating state is
//! reported through [`EventLogger::log_event`], so the log doubles as the
//! operator activity feed. Metadata travels as OpenTelemetry key/value pairs.

use opentelemetry::KeyValue;
use tracing::info_span;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

pub type InitError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Install the global fmt subscriber. `RUST_LOG` wins over `default_level`.
    ///
    /// Fails if a global subscriber is already installed.
    pub fn init(default_level: &str) -> Result<(), InitError> {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
            )
            .with_target(false)
            .with_span_events(FmtSpan::NONE)
            .try_init()
    }

    /// Emit one activity record.
    #[inline]
    pub fn log_event(event_type: &str, metadata: &[KeyValue]) {
        let span = info_span!(
            "lifecycle_event",
            event_type = event_type,
            otel.kind = "INTERNAL"
        );
        let _entered = span.enter();

        tracing::info!(metadata = ?metadata, "Lifecycle event recorded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[traced_test]
    #[test]
    fn test_logging() {
        EventLogger::log_event("allocated", &[KeyValue::new("request_id", 7_i64)]);
        assert!(logs_contain("Lifecycle event recorded"));
        assert!(logs_contain("request_id"));
    }
}
