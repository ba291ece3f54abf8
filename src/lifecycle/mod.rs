//! Process lifecycle: composition root, cancellation and signals.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     ServiceConfig → register providers → invoke start_server
//!     → resolve Shutdown token → container Running
//!
//! Shutdown (shutdown.rs):
//!     token triggered → wait() returns → begin_shutdown → cleanup (LIFO)
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger the Shutdown token
//! ```
//!
//! # Design Decisions
//! - Fail fast: any build error aborts startup after releasing what was built
//! - The token is permanent once triggered; late waiters return immediately
//! - Signal capture is an adapter owned by the token's provider

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
