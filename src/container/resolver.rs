//! Dependency resolver and construction graph.
//!
//! # Responsibilities
//! - Walk the provider graph depth-first, parameters before constructors
//! - Construct each provider at most once and cache its instance
//! - Fail fast on cycles, reporting the full cycle path
//! - Push release objects onto the cleanup stack in construction order
//!
//! # Design Decisions
//! - Node state is `Unvisited → InProgress → Resolved`; meeting an
//!   `InProgress` node is a cycle
//! - A failing constructor marks its node `Failed` and caches nothing;
//!   dependencies built before the failure stay cached
//! - Errors from nested parameters propagate unchanged

use std::collections::HashMap;
use std::sync::Arc;

use crate::container::cleanup::CleanupStack;
use crate::container::error::Error;
use crate::container::key::Key;
use crate::container::provider::{ConstructError, Constructed, Instance};
use crate::container::registry::{Offer, ProviderId, Registry};
use crate::observability::metrics;

/// Maximum construction depth before resolution gives up.
pub const MAX_RESOLUTION_DEPTH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeState {
    InProgress,
    Resolved,
    Failed,
}

/// Per-container construction state: node states, the instance cache and
/// the path currently being built.
#[derive(Default)]
pub(crate) struct Graph {
    states: HashMap<ProviderId, NodeState>,
    instances: HashMap<ProviderId, Instance>,
    path: Vec<ProviderId>,
    sequence: u64,
}

impl Graph {
    pub fn state(&self, id: ProviderId) -> Option<NodeState> {
        self.states.get(&id).copied()
    }

    /// Whether the last construction attempt of `id` returned an error.
    pub fn failed(&self, id: ProviderId) -> bool {
        self.state(id) == Some(NodeState::Failed)
    }

    pub fn cached(&self, id: ProviderId) -> Option<&Instance> {
        self.instances.get(&id)
    }

    /// Number of providers constructed so far.
    pub fn constructed(&self) -> u64 {
        self.sequence
    }
}

/// Resolves keys against the registry, constructing on demand.
///
/// Handed to constructors through [`Inject`](crate::container::Inject); user
/// code rarely touches it directly.
pub struct Resolver<'a> {
    registry: &'a Registry,
    graph: &'a mut Graph,
    cleanup: &'a mut CleanupStack,
    origin: &'a str,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(
        registry: &'a Registry,
        graph: &'a mut Graph,
        cleanup: &'a mut CleanupStack,
        origin: &'a str,
    ) -> Self {
        Self {
            registry,
            graph,
            cleanup,
            origin,
        }
    }

    /// Resolve the single value offered for `T`.
    pub fn get<T: ?Sized + Send + Sync + 'static>(&mut self) -> Result<Arc<T>, Error> {
        self.get_key(Key::of::<T>())
    }

    /// Resolve the single value offered for `T` under `name`.
    pub fn get_named<T: ?Sized + Send + Sync + 'static>(
        &mut self,
        name: &'static str,
    ) -> Result<Arc<T>, Error> {
        self.get_key(Key::named::<T>(name))
    }

    /// Resolve `T` if anything offers it.
    pub fn get_optional<T: ?Sized + Send + Sync + 'static>(
        &mut self,
    ) -> Result<Option<Arc<T>>, Error> {
        let key = Key::of::<T>();
        if self.registry.lookup(&key).is_empty() {
            return Ok(None);
        }
        self.get_key(key).map(Some)
    }

    /// Resolve every provider bound to `T`, in registration order.
    pub fn get_all<T: ?Sized + Send + Sync + 'static>(&mut self) -> Result<Vec<Arc<T>>, Error> {
        let key = Key::of::<T>();
        let registry = self.registry;
        registry
            .lookup(&key)
            .iter()
            .map(|offer| self.resolve_offer::<T>(&key, offer))
            .collect()
    }

    fn get_key<T: ?Sized + Send + Sync + 'static>(&mut self, key: Key) -> Result<Arc<T>, Error> {
        let registry = self.registry;
        match registry.lookup(&key) {
            [] => Err(Error::unresolved(&key, self.requester())),
            [offer] => self.resolve_offer::<T>(&key, offer),
            offers => Err(Error::AmbiguousDependency {
                key: key.to_string(),
                requester: self.requester(),
                candidates: offers
                    .iter()
                    .map(|o| registry.provider(o.provider).key.to_string())
                    .collect(),
            }),
        }
    }

    fn resolve_offer<T: ?Sized + Send + Sync + 'static>(
        &mut self,
        key: &Key,
        offer: &Offer,
    ) -> Result<Arc<T>, Error> {
        let instance = self.resolve_provider(offer.provider)?;
        (offer.cast)(&instance)
            .and_then(|cast| cast.downcast_ref::<Arc<T>>().cloned())
            .ok_or_else(|| Error::TypeMismatch {
                key: key.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Construct a provider, or return its cached instance.
    pub(crate) fn resolve_provider(&mut self, id: ProviderId) -> Result<Instance, Error> {
        match self.graph.state(id) {
            Some(NodeState::Resolved) => {
                if let Some(instance) = self.graph.cached(id) {
                    return Ok(instance.clone());
                }
            }
            Some(NodeState::InProgress) => return Err(self.cycle_error(id)),
            Some(NodeState::Failed) => {
                tracing::debug!(
                    provider = %self.registry.provider(id).key,
                    "Retrying provider after earlier failure"
                );
            }
            None => {}
        }

        if self.graph.path.len() >= MAX_RESOLUTION_DEPTH {
            return Err(Error::MaxDepthExceeded(MAX_RESOLUTION_DEPTH));
        }

        let registry = self.registry;
        let provider = registry.provider(id);

        self.graph.states.insert(id, NodeState::InProgress);
        self.graph.path.push(id);
        let result = (provider.construct)(self);
        self.graph.path.pop();

        match result {
            Ok(Constructed { instance, release }) => {
                self.graph.sequence += 1;
                let sequence = self.graph.sequence;
                self.graph.states.insert(id, NodeState::Resolved);
                self.graph.instances.insert(id, instance.clone());
                if let Some(release) = release {
                    self.cleanup.push(sequence, provider.key.to_string(), release);
                }

                tracing::debug!(
                    provider = %provider.key,
                    sequence,
                    "Provider constructed"
                );
                metrics::record_construction(&provider.key.to_string());
                Ok(instance)
            }
            Err(ConstructError::Dependency(e)) => {
                self.graph.states.insert(id, NodeState::Failed);
                Err(e)
            }
            Err(ConstructError::Failed(source)) => {
                self.graph.states.insert(id, NodeState::Failed);
                tracing::error!(
                    provider = %provider.key,
                    constructor = %provider.label,
                    error = %source,
                    "Provider constructor failed"
                );
                Err(Error::ProviderConstruction {
                    provider: provider.key.to_string(),
                    source,
                })
            }
        }
    }

    fn cycle_error(&self, id: ProviderId) -> Error {
        let start = self
            .graph
            .path
            .iter()
            .position(|p| *p == id)
            .unwrap_or(0);
        let path = self.graph.path[start..]
            .iter()
            .chain(std::iter::once(&id))
            .map(|p| self.registry.provider(*p).key.to_string())
            .collect();
        Error::CyclicDependency { path }
    }

    /// Name of whatever is asking for the current dependency.
    fn requester(&self) -> String {
        match self.graph.path.last() {
            Some(id) => self.registry.provider(*id).key.to_string(),
            None => self.origin.to_string(),
        }
    }
}
