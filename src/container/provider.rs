//! Provider definitions: constructors, capability bindings and release objects.

use std::any::{type_name, Any};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::container::error::{BoxError, Error};
use crate::container::inject::{Constructor, Dependency};
use crate::container::key::{short_type_name, Key};
use crate::container::resolver::Resolver;

/// A type-erased cached instance. The concrete value is always an `Arc<T>`.
pub(crate) type Instance = Arc<dyn Any + Send + Sync>;

pub(crate) type ConstructFn =
    Box<dyn Fn(&mut Resolver<'_>) -> Result<Constructed, ConstructError> + Send + Sync>;

/// Converts a provider's own instance into the instance offered for a key.
pub(crate) type CastFn = Arc<dyn Fn(&Instance) -> Option<Instance> + Send + Sync>;

/// Releases a resource acquired by a provider.
///
/// Returned by a constructor next to its value and run once at teardown, in
/// reverse construction order.
pub trait Release: Send {
    fn release(self: Box<Self>) -> Result<(), BoxError>;
}

/// A [`Release`] backed by a closure.
pub struct ReleaseFn<F>(F);

impl<F> Release for ReleaseFn<F>
where
    F: FnOnce() -> Result<(), BoxError> + Send,
{
    fn release(self: Box<Self>) -> Result<(), BoxError> {
        (self.0)()
    }
}

/// Wrap a closure as a [`Release`].
pub fn release_fn<F>(f: F) -> ReleaseFn<F>
where
    F: FnOnce() -> Result<(), BoxError> + Send,
{
    ReleaseFn(f)
}

/// Output of a successful constructor call.
pub(crate) struct Constructed {
    pub instance: Instance,
    pub release: Option<Box<dyn Release>>,
}

/// Why a constructor did not produce a value.
pub(crate) enum ConstructError {
    /// One of its parameters failed to resolve; propagated unchanged.
    Dependency(Error),
    /// The constructor itself returned an error.
    Failed(BoxError),
}

/// A capability bound by a provider.
pub(crate) struct Binding {
    pub capability: Key,
    pub cast: CastFn,
}

/// Registration request for a provider of `T`.
///
/// ```rust,ignore
/// Provide::new(StdLogger::new).as_capability(|l| l as Arc<dyn Logger>)
/// ```
pub struct Provide<T> {
    key: Key,
    label: String,
    dependencies: Vec<Dependency>,
    construct: ConstructFn,
    bindings: Vec<Binding>,
    _output: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Provide<T> {
    /// Provider whose constructor cannot fail.
    pub fn new<F, Args>(constructor: F) -> Self
    where
        F: Constructor<Args, Output = T>,
        Args: 'static,
    {
        Self::from_parts(
            F::dependencies(),
            type_name::<F>(),
            erase(move |resolver| {
                let value = constructor.call_with(resolver).map_err(ConstructError::Dependency)?;
                Ok(Constructed {
                    instance: Arc::new(Arc::new(value)),
                    release: None,
                })
            }),
        )
    }

    /// Provider whose constructor returns `Result<T, E>`.
    pub fn fallible<F, Args, E>(constructor: F) -> Self
    where
        F: Constructor<Args, Output = Result<T, E>>,
        Args: 'static,
        E: Into<BoxError> + 'static,
    {
        Self::from_parts(
            F::dependencies(),
            type_name::<F>(),
            erase(move |resolver| {
                let value = constructor
                    .call_with(resolver)
                    .map_err(ConstructError::Dependency)?
                    .map_err(|e| ConstructError::Failed(e.into()))?;
                Ok(Constructed {
                    instance: Arc::new(Arc::new(value)),
                    release: None,
                })
            }),
        )
    }

    /// Provider whose constructor also returns a release object.
    pub fn with_release<F, Args, R, E>(constructor: F) -> Self
    where
        F: Constructor<Args, Output = Result<(T, R), E>>,
        Args: 'static,
        R: Release + 'static,
        E: Into<BoxError> + 'static,
    {
        Self::from_parts(
            F::dependencies(),
            type_name::<F>(),
            erase(move |resolver| {
                let (value, release) = constructor
                    .call_with(resolver)
                    .map_err(ConstructError::Dependency)?
                    .map_err(|e| ConstructError::Failed(e.into()))?;
                Ok(Constructed {
                    instance: Arc::new(Arc::new(value)),
                    release: Some(Box::new(release)),
                })
            }),
        )
    }

    fn from_parts(
        dependencies: Vec<Dependency>,
        constructor_name: &'static str,
        construct: ConstructFn,
    ) -> Self {
        Self {
            key: Key::of::<T>(),
            label: short_type_name(constructor_name),
            dependencies,
            construct,
            bindings: Vec::new(),
            _output: PhantomData,
        }
    }

    /// Register under `(T, name)` instead of the bare type.
    pub fn named(mut self, name: &'static str) -> Self {
        self.key = self.key.with_name(name);
        self
    }

    /// Also offer the instance as capability `C`.
    ///
    /// `cast` performs the unsizing, typically `|v| v as Arc<dyn Trait>`.
    /// A provider may bind any number of capabilities.
    pub fn as_capability<C, F>(mut self, cast: F) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<C> + Send + Sync + 'static,
    {
        self.bindings.push(Binding {
            capability: Key::of::<C>(),
            cast: Arc::new(move |instance: &Instance| {
                let concrete = instance.downcast_ref::<Arc<T>>()?.clone();
                Some(Arc::new(cast(concrete)) as Instance)
            }),
        });
        self
    }

    pub(crate) fn into_provider(self) -> Provider {
        Provider {
            key: self.key,
            label: self.label,
            dependencies: self.dependencies,
            construct: self.construct,
            bindings: self.bindings,
        }
    }
}

impl<T> fmt::Debug for Provide<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provide")
            .field("key", &self.key)
            .field("dependencies", &self.dependencies)
            .field(
                "capabilities",
                &self.bindings.iter().map(|b| b.capability).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// A registered provider. Immutable once in the registry.
pub(crate) struct Provider {
    pub key: Key,
    pub label: String,
    pub dependencies: Vec<Dependency>,
    pub construct: ConstructFn,
    pub bindings: Vec<Binding>,
}

fn erase<F>(construct: F) -> ConstructFn
where
    F: Fn(&mut Resolver<'_>) -> Result<Constructed, ConstructError> + Send + Sync + 'static,
{
    Box::new(construct)
}

/// Caster for a provider's own identity.
pub(crate) fn identity_cast() -> CastFn {
    Arc::new(|instance: &Instance| Some(instance.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> &'static str;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> &'static str {
            "hello"
        }
    }

    #[test]
    fn test_capability_cast() {
        let provide = Provide::new(|| English).as_capability(|e| e as Arc<dyn Greeter>);
        let provider = provide.into_provider();
        assert_eq!(provider.key, Key::of::<English>());
        assert_eq!(provider.bindings.len(), 1);
        assert_eq!(provider.bindings[0].capability, Key::of::<dyn Greeter>());

        let instance: Instance = Arc::new(Arc::new(English));
        let cast = (provider.bindings[0].cast)(&instance).unwrap();
        let greeter = cast.downcast_ref::<Arc<dyn Greeter>>().unwrap();
        assert_eq!(greeter.greet(), "hello");
    }

    #[test]
    fn test_cast_rejects_foreign_instance() {
        let provider = Provide::new(|| English)
            .as_capability(|e| e as Arc<dyn Greeter>)
            .into_provider();
        let foreign: Instance = Arc::new(Arc::new(42u32));
        assert!((provider.bindings[0].cast)(&foreign).is_none());
    }

    #[test]
    fn test_named_key() {
        let provider = Provide::new(|| English).named("en").into_provider();
        assert_eq!(provider.key, Key::named::<English>("en"));
    }

    #[test]
    fn test_release_fn_runs_closure() {
        let release: Box<dyn Release> = Box::new(release_fn(|| Err("boom".into())));
        let err = release.release().unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
