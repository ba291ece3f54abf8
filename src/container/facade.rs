//! Container facade: the public surface of the engine.
//!
//! # Responsibilities
//! - Accept provide / invoke / resolve directives
//! - Run them in phase order: registrations, then invokes, then resolves
//! - Expose direct resolution and the single teardown entry point
//!
//! # Design Decisions
//! - A failed build hands back the partial container so it can be cleaned up
//! - `cleanup` works from any phase and is idempotent

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::container::cleanup::{CleanupReport, CleanupStack};
use crate::container::error::{BuildError, Error};
use crate::container::invoke::Invoke;
use crate::container::key::Key;
use crate::container::lifecycle::Phase;
use crate::container::provider::{Provide, Provider};
use crate::container::registry::Registry;
use crate::container::resolver::{Graph, Resolver};

/// Owns providers, the instance cache and the cleanup stack.
pub struct Container {
    registry: Registry,
    graph: Graph,
    cleanup: CleanupStack,
    phase: Phase,
}

impl Container {
    /// An empty container in the `Building` phase.
    pub fn new() -> Self {
        Self {
            registry: Registry::default(),
            graph: Graph::default(),
            cleanup: CleanupStack::default(),
            phase: Phase::Building,
        }
    }

    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Register a provider. Nothing is constructed yet.
    pub fn provide<T: Send + Sync + 'static>(&mut self, provide: Provide<T>) -> Result<(), Error> {
        self.register(provide.into_provider())
    }

    fn register(&mut self, provider: Provider) -> Result<(), Error> {
        self.phase.require("provide", &[Phase::Building])?;
        self.registry.register(provider).map(|_| ())
    }

    /// Resolve the action's arguments and run it.
    pub fn invoke(&mut self, action: Invoke) -> Result<(), Error> {
        self.phase.require("invoke", &[Phase::Building])?;
        let origin = action.name().to_string();
        let mut resolver = Resolver::new(
            &self.registry,
            &mut self.graph,
            &mut self.cleanup,
            &origin,
        );
        action.run(&mut resolver)
    }

    /// Leave `Building`: bootstrap is complete.
    pub fn start(&mut self) -> Result<(), Error> {
        self.phase.require("start", &[Phase::Building])?;
        self.phase.advance(Phase::Running)
    }

    /// Resolve the single value offered for `T`, constructing it if needed.
    pub fn resolve<T: ?Sized + Send + Sync + 'static>(&mut self) -> Result<Arc<T>, Error> {
        self.with_resolver("resolve", |resolver| resolver.get::<T>())
    }

    /// Resolve the provider of `T` registered under `name`.
    pub fn resolve_named<T: ?Sized + Send + Sync + 'static>(
        &mut self,
        name: &'static str,
    ) -> Result<Arc<T>, Error> {
        self.with_resolver("resolve", |resolver| resolver.get_named::<T>(name))
    }

    /// Resolve every provider bound to capability `T`, in registration order.
    pub fn resolve_all<T: ?Sized + Send + Sync + 'static>(&mut self) -> Result<Vec<Arc<T>>, Error> {
        self.with_resolver("resolve", |resolver| resolver.get_all::<T>())
    }

    fn with_resolver<R>(
        &mut self,
        operation: &'static str,
        f: impl FnOnce(&mut Resolver<'_>) -> Result<R, Error>,
    ) -> Result<R, Error> {
        self.phase
            .require(operation, &[Phase::Building, Phase::Running])?;
        let mut resolver = Resolver::new(
            &self.registry,
            &mut self.graph,
            &mut self.cleanup,
            operation,
        );
        f(&mut resolver)
    }

    /// The cached instance of `T`, without constructing anything.
    ///
    /// Works in every phase, including after a failed build.
    pub fn cached<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        let id = self.registry.identity(&Key::of::<T>())?;
        self.graph
            .cached(id)
            .and_then(|instance| instance.downcast_ref::<Arc<T>>().cloned())
    }

    /// Whether the unnamed provider of `T` has been constructed.
    pub fn is_resolved<T: Send + Sync + 'static>(&self) -> bool {
        self.cached::<T>().is_some()
    }

    /// Whether the last attempt to construct the unnamed `T` failed.
    ///
    /// Cleared once a later request constructs it successfully.
    pub fn has_failed<T: Send + Sync + 'static>(&self) -> bool {
        self.registry
            .identity(&Key::of::<T>())
            .is_some_and(|id| self.graph.failed(id))
    }

    pub fn provider_count(&self) -> usize {
        self.registry.len()
    }

    /// Number of successful constructions so far.
    pub fn constructed_count(&self) -> u64 {
        self.graph.constructed()
    }

    /// Release objects waiting for teardown.
    pub fn pending_releases(&self) -> usize {
        self.cleanup.len()
    }

    /// Record that the cancellation token fired.
    pub fn begin_shutdown(&mut self) -> Result<(), Error> {
        self.phase.require("begin_shutdown", &[Phase::Running])?;
        self.phase.advance(Phase::ShuttingDown)
    }

    /// Run every release in reverse construction order and close.
    ///
    /// Safe after a partial build. Calling it again is a no-op.
    pub fn cleanup(&mut self) -> CleanupReport {
        if self.phase == Phase::Closed {
            return CleanupReport::default();
        }

        let report = self.cleanup.run();
        if let Err(e) = self.phase.advance(Phase::Closed) {
            tracing::warn!(error = %e, "Unexpected phase during cleanup");
        }
        tracing::info!(
            released = report.released,
            failures = report.failures.len(),
            "Container closed"
        );
        report
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        if self.cleanup.len() > 0 {
            tracing::warn!(
                pending = self.cleanup.len(),
                "Container dropped without cleanup, releases skipped"
            );
        }
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("phase", &self.phase)
            .field("providers", &self.registry.len())
            .field("constructed", &self.graph.constructed())
            .field("pending_releases", &self.cleanup.len())
            .finish()
    }
}

/// A caller-held output filled by a resolve directive.
pub struct Slot<T: ?Sized> {
    cell: Arc<OnceLock<Arc<T>>>,
}

impl<T: ?Sized> Slot<T> {
    pub fn new() -> Self {
        Self {
            cell: Arc::new(OnceLock::new()),
        }
    }

    /// The resolved value, once the build has filled it.
    pub fn get(&self) -> Option<Arc<T>> {
        self.cell.get().cloned()
    }

    pub fn is_filled(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<T: ?Sized> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T: ?Sized> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}

trait FillSlot: Send {
    fn fill(&self, container: &mut Container) -> Result<(), Error>;
}

impl<T: ?Sized + Send + Sync + 'static> FillSlot for Slot<T> {
    fn fill(&self, container: &mut Container) -> Result<(), Error> {
        let value = container.resolve::<T>()?;
        if self.cell.set(value).is_err() {
            tracing::debug!(slot = %Key::of::<T>(), "Slot already filled, keeping first value");
        }
        Ok(())
    }
}

enum Directive {
    Provide(Provider),
    Invoke(Invoke),
    Resolve(Box<dyn FillSlot>),
}

/// Accumulates directives and applies them in phase order.
///
/// ```rust,ignore
/// let ctx = Slot::<Shutdown>::new();
/// let container = Container::builder()
///     .provide(Provide::new(StdLogger::new).as_capability(|l| l as Arc<dyn Logger>))
///     .provide(Provide::new(new_shutdown))
///     .invoke(Invoke::fallible(start_server))
///     .resolve(&ctx)
///     .build()?;
/// ```
#[derive(Default)]
pub struct ContainerBuilder {
    directives: Vec<Directive>,
}

impl ContainerBuilder {
    pub fn provide<T: Send + Sync + 'static>(mut self, provide: Provide<T>) -> Self {
        self.directives
            .push(Directive::Provide(provide.into_provider()));
        self
    }

    pub fn invoke(mut self, action: Invoke) -> Self {
        self.directives.push(Directive::Invoke(action));
        self
    }

    /// Copy the resolved `T` into `slot` once the build succeeds.
    pub fn resolve<T: ?Sized + Send + Sync + 'static>(mut self, slot: &Slot<T>) -> Self {
        self.directives
            .push(Directive::Resolve(Box::new(slot.clone())));
        self
    }

    /// Register every provider, run invokes, then fill resolve slots.
    ///
    /// Stops at the first failure. The returned error carries the partial
    /// container; whatever it constructed can still be cleaned up.
    pub fn build(self) -> Result<Container, BuildError> {
        let mut container = Container::new();
        let mut invokes = Vec::new();
        let mut resolves = Vec::new();

        let mut registrations = Vec::new();
        for directive in self.directives {
            match directive {
                Directive::Provide(provider) => registrations.push(provider),
                Directive::Invoke(action) => invokes.push(action),
                Directive::Resolve(slot) => resolves.push(slot),
            }
        }

        tracing::debug!(
            providers = registrations.len(),
            invokes = invokes.len(),
            resolves = resolves.len(),
            "Building container"
        );

        for provider in registrations {
            if let Err(e) = container.register(provider) {
                return Err(BuildError::new(e, container));
            }
        }

        for action in invokes {
            if let Err(e) = container.invoke(action) {
                return Err(BuildError::new(e, container));
            }
        }

        if let Err(e) = container.start() {
            return Err(BuildError::new(e, container));
        }

        for slot in resolves {
            if let Err(e) = slot.fill(&mut container) {
                return Err(BuildError::new(e, container));
            }
        }

        Ok(container)
    }
}
