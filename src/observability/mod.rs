//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Container and leaf components produce:
//!     → logging.rs (structured tracing events, Logger collaborator)
//!     → metrics.rs (construction, cleanup and request counters)
//!
//! Consumers:
//!     → stdout via tracing-subscriber fmt layer
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Structured fields rather than formatted strings in core code
//! - Counter updates are no-ops until a recorder is installed
//! - The Logger trait is what components depend on; tracing is its backend

pub mod logging;
pub mod metrics;
