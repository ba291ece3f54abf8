//! Dependency composition and lifecycle engine.
//!
//! # Data Flow
//! ```text
//! Registration (Building):
//!     Provide<T> / Invoke directives
//!     → registry.rs (identity + capability offers, duplicate check)
//!
//! Resolution (on demand, depth-first):
//!     Key requested by an Inject parameter or Container::resolve
//!     → registry.rs lookup (zero / one / many offers)
//!     → resolver.rs graph walk (Unvisited → InProgress → Resolved)
//!     → provider constructor runs once, instance cached
//!     → release object pushed onto cleanup.rs
//!
//! Teardown:
//!     Container::cleanup
//!     → cleanup.rs pops releases LIFO, failures collected not fatal
//! ```
//!
//! # Design Decisions
//! - Capabilities are explicit keys with caster closures, no reflection
//! - Singleton scope only; the container owns every instance
//! - Cycles are detected while resolving, never at registration
//! - No global container: each `Container` is an independent value

pub mod cleanup;
pub mod error;
pub mod facade;
pub mod inject;
pub mod invoke;
pub mod key;
pub mod lifecycle;
pub mod provider;
pub mod registry;
pub mod resolver;

pub use cleanup::{CleanupFailure, CleanupReport};
pub use error::{BoxError, BuildError, Error};
pub use facade::{Container, ContainerBuilder, Slot};
pub use inject::{Constructor, Dependency, DependencyKind, Inject};
pub use invoke::Invoke;
pub use key::Key;
pub use lifecycle::Phase;
pub use provider::{release_fn, Provide, Release, ReleaseFn};
pub use resolver::Resolver;
