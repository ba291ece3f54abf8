//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Provide the `Logger` collaborator handed to components
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured filter
//! - Logging is best-effort: `Logger::logf` has no failure mode

use std::fmt;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when neither `RUST_LOG` nor config sets one.
pub const DEFAULT_FILTER: &str = "di_bootstrap=debug,tower_http=debug";

/// Format-and-values logger injected into components.
pub trait Logger: Send + Sync {
    fn logf(&self, args: fmt::Arguments<'_>);
}

/// Log through a [`Logger`] with `format!` syntax.
#[macro_export]
macro_rules! logf {
    ($logger:expr, $($arg:tt)+) => {
        $crate::observability::logging::Logger::logf(&*$logger, format_args!($($arg)+))
    };
}

/// Logger backed by the process-wide tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdLogger;

impl StdLogger {
    pub fn new() -> Self {
        Self
    }
}

impl Logger for StdLogger {
    fn logf(&self, args: fmt::Arguments<'_>) {
        tracing::info!(target: "di_bootstrap::app", "{}", args);
    }
}

/// Install the global subscriber.
///
/// Panics if a global subscriber is already set; call once from `main`.
pub fn init(filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Capture(Mutex<Vec<String>>);

    impl Logger for Capture {
        fn logf(&self, args: fmt::Arguments<'_>) {
            self.0.lock().unwrap().push(args.to_string());
        }
    }

    #[test]
    fn test_logf_macro_formats_values() {
        let capture = Arc::new(Capture::default());
        let logger: Arc<dyn Logger> = capture.clone();

        crate::logf!(logger, "listening on {}:{}", "0.0.0.0", 8080);
        crate::logf!(logger, "ready");

        assert_eq!(
            *capture.0.lock().unwrap(),
            vec!["listening on 0.0.0.0:8080".to_string(), "ready".to_string()]
        );
    }
}
