//! Error taxonomy of the container.

use thiserror::Error;

use crate::container::facade::Container;
use crate::container::key::Key;

/// Boxed error returned by fallible constructors, actions and releases.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while registering, resolving or invoking.
///
/// Every variant is a build-phase failure: the composition root is expected
/// to abort startup when it sees one.
#[derive(Debug, Error)]
pub enum Error {
    /// A provider with the same type and name is already registered.
    #[error("duplicate provider: {key} is already registered")]
    DuplicateProvider { key: String },

    /// A single-value dependency has no provider.
    #[error("unresolved type: {key} required by {requester} has no provider")]
    UnresolvedType { key: String, requester: String },

    /// A single-value dependency names a capability bound by several providers.
    #[error("ambiguous dependency: {key} required by {requester} has {} candidates ({})", .candidates.len(), .candidates.join(", "))]
    AmbiguousDependency {
        key: String,
        requester: String,
        candidates: Vec<String>,
    },

    /// The provider graph contains a cycle.
    #[error("circular dependency: {}", .path.join(" -> "))]
    CyclicDependency { path: Vec<String> },

    /// A constructor returned an error.
    #[error("failed to construct {provider}: {source}")]
    ProviderConstruction {
        provider: String,
        #[source]
        source: BoxError,
    },

    /// A bootstrap action returned an error.
    #[error("invoke of {action} failed: {source}")]
    InvokeFailed {
        action: String,
        #[source]
        source: BoxError,
    },

    /// Resolution nested deeper than the supported limit.
    #[error("maximum resolution depth {0} exceeded")]
    MaxDepthExceeded(usize),

    /// A cached instance did not have the type its key promised.
    #[error("type mismatch: instance registered for {key} is not a {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    /// The operation is not allowed in the current lifecycle phase.
    #[error("{operation} is not allowed while the container is {phase}")]
    InvalidPhase {
        operation: &'static str,
        phase: &'static str,
    },
}

impl Error {
    pub(crate) fn unresolved(key: &Key, requester: impl Into<String>) -> Self {
        Error::UnresolvedType {
            key: key.to_string(),
            requester: requester.into(),
        }
    }
}

/// A failed `ContainerBuilder::build`.
///
/// Carries the partially built container so whatever was constructed before
/// the failure can still be released with [`Container::cleanup`].
#[derive(Debug, Error)]
#[error("container build failed: {error}")]
pub struct BuildError {
    #[source]
    error: Error,
    container: Container,
}

impl BuildError {
    pub(crate) fn new(error: Error, container: Container) -> Self {
        Self { error, container }
    }

    /// The error that stopped the build.
    pub fn error(&self) -> &Error {
        &self.error
    }

    /// The partially built container.
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Split into the error and the partially built container.
    pub fn into_parts(self) -> (Error, Container) {
        (self.error, self.container)
    }
}
