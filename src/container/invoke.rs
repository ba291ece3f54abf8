//! Bootstrap actions run against the built graph.

use std::any::type_name;
use std::fmt;

use crate::container::error::{BoxError, Error};
use crate::container::inject::{Constructor, Dependency};
use crate::container::key::short_type_name;
use crate::container::provider::ConstructError;
use crate::container::resolver::Resolver;

type ActionFn = Box<dyn FnOnce(&mut Resolver<'_>) -> Result<(), ConstructError> + Send>;

/// A side-effecting call whose arguments come from the container.
///
/// Used for steps like starting a listener: the action produces no
/// registered value, it only consumes resolved ones.
pub struct Invoke {
    name: String,
    dependencies: Vec<Dependency>,
    action: ActionFn,
}

impl Invoke {
    /// An action that cannot fail.
    pub fn new<F, Args>(action: F) -> Self
    where
        F: Constructor<Args, Output = ()>,
        Args: 'static,
    {
        Self::from_parts(
            type_name::<F>(),
            F::dependencies(),
            erase(move |resolver| action.call_with(resolver).map_err(ConstructError::Dependency)),
        )
    }

    /// An action returning `Result<(), E>`; its error is surfaced, never retried.
    pub fn fallible<F, Args, E>(action: F) -> Self
    where
        F: Constructor<Args, Output = Result<(), E>>,
        Args: 'static,
        E: Into<BoxError> + 'static,
    {
        Self::from_parts(
            type_name::<F>(),
            F::dependencies(),
            erase(move |resolver| {
                action
                    .call_with(resolver)
                    .map_err(ConstructError::Dependency)?
                    .map_err(|e| ConstructError::Failed(e.into()))
            }),
        )
    }

    fn from_parts(name: &'static str, dependencies: Vec<Dependency>, action: ActionFn) -> Self {
        Self {
            name: short_type_name(name),
            dependencies,
            action,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Resolve the arguments, then run the action.
    pub(crate) fn run(self, resolver: &mut Resolver<'_>) -> Result<(), Error> {
        tracing::debug!(action = %self.name, "Invoking");
        match (self.action)(resolver) {
            Ok(()) => Ok(()),
            Err(ConstructError::Dependency(e)) => Err(e),
            Err(ConstructError::Failed(source)) => Err(Error::InvokeFailed {
                action: self.name,
                source,
            }),
        }
    }
}

impl fmt::Debug for Invoke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invoke")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

fn erase<F>(action: F) -> ActionFn
where
    F: FnOnce(&mut Resolver<'_>) -> Result<(), ConstructError> + Send + 'static,
{
    Box::new(action)
}
