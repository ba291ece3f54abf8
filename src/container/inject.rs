//! Constructor parameters and how they are pulled from the graph.
//!
//! A constructor is any `Fn` whose arguments all implement [`Inject`]. The
//! argument types double as the declared parameter list: `Arc<T>` is a
//! single-value dependency, `Option<Arc<T>>` an optional one and
//! `Vec<Arc<T>>` a capability collection.

use std::fmt;
use std::sync::Arc;

use crate::container::error::Error;
use crate::container::key::Key;
use crate::container::resolver::Resolver;

/// How a parameter consumes the offers registered for its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
    /// Exactly one offer is required.
    Single,
    /// Zero offers yield `None`.
    Optional,
    /// Every offer, in registration order.
    Collection,
}

/// One entry of a provider's declared parameter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    pub key: Key,
    pub kind: DependencyKind,
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DependencyKind::Single => write!(f, "{}", self.key),
            DependencyKind::Optional => write!(f, "Option<{}>", self.key),
            DependencyKind::Collection => write!(f, "[{}]", self.key),
        }
    }
}

/// A value that can be produced from the construction graph.
pub trait Inject: Sized {
    /// The declared dependency this parameter represents.
    fn dependency() -> Dependency;

    /// Resolve the parameter, constructing providers as needed.
    fn inject(resolver: &mut Resolver<'_>) -> Result<Self, Error>;
}

impl<T: ?Sized + Send + Sync + 'static> Inject for Arc<T> {
    fn dependency() -> Dependency {
        Dependency {
            key: Key::of::<T>(),
            kind: DependencyKind::Single,
        }
    }

    fn inject(resolver: &mut Resolver<'_>) -> Result<Self, Error> {
        resolver.get::<T>()
    }
}

impl<T: ?Sized + Send + Sync + 'static> Inject for Option<Arc<T>> {
    fn dependency() -> Dependency {
        Dependency {
            key: Key::of::<T>(),
            kind: DependencyKind::Optional,
        }
    }

    fn inject(resolver: &mut Resolver<'_>) -> Result<Self, Error> {
        resolver.get_optional::<T>()
    }
}

impl<T: ?Sized + Send + Sync + 'static> Inject for Vec<Arc<T>> {
    fn dependency() -> Dependency {
        Dependency {
            key: Key::of::<T>(),
            kind: DependencyKind::Collection,
        }
    }

    fn inject(resolver: &mut Resolver<'_>) -> Result<Self, Error> {
        resolver.get_all::<T>()
    }
}

/// A function whose arguments are resolved from the graph before it runs.
///
/// Implemented for every `Fn` of up to eight [`Inject`] arguments. `Args` is
/// the argument tuple and only exists to keep the impls apart.
pub trait Constructor<Args>: Send + Sync + 'static {
    type Output;

    /// Declared parameter list, in argument order.
    fn dependencies() -> Vec<Dependency>;

    /// Resolve every argument depth-first, then call the function.
    fn call_with(&self, resolver: &mut Resolver<'_>) -> Result<Self::Output, Error>;
}

macro_rules! impl_constructor {
    ($($arg:ident),*) => {
        impl<F, R, $($arg,)*> Constructor<($($arg,)*)> for F
        where
            F: Fn($($arg),*) -> R + Send + Sync + 'static,
            $($arg: Inject,)*
        {
            type Output = R;

            fn dependencies() -> Vec<Dependency> {
                vec![$($arg::dependency()),*]
            }

            #[allow(non_snake_case, unused_variables)]
            fn call_with(&self, resolver: &mut Resolver<'_>) -> Result<R, Error> {
                $(let $arg = $arg::inject(resolver)?;)*
                Ok((self)($($arg),*))
            }
        }
    };
}

impl_constructor!();
impl_constructor!(A1);
impl_constructor!(A1, A2);
impl_constructor!(A1, A2, A3);
impl_constructor!(A1, A2, A3, A4);
impl_constructor!(A1, A2, A3, A4, A5);
impl_constructor!(A1, A2, A3, A4, A5, A6);
impl_constructor!(A1, A2, A3, A4, A5, A6, A7);
impl_constructor!(A1, A2, A3, A4, A5, A6, A7, A8);

#[cfg(test)]
mod tests {
    use super::*;

    trait Handler: Send + Sync {}
    struct Config;

    fn needs_everything(
        _config: Arc<Config>,
        _fallback: Option<Arc<dyn Handler>>,
        _handlers: Vec<Arc<dyn Handler>>,
    ) -> u8 {
        0
    }

    fn declared<Args, F: Constructor<Args>>(_: &F) -> Vec<Dependency> {
        F::dependencies()
    }

    #[test]
    fn test_declared_parameter_list() {
        let deps = declared(&needs_everything);
        assert_eq!(
            deps,
            vec![
                Dependency { key: Key::of::<Config>(), kind: DependencyKind::Single },
                Dependency { key: Key::of::<dyn Handler>(), kind: DependencyKind::Optional },
                Dependency { key: Key::of::<dyn Handler>(), kind: DependencyKind::Collection },
            ]
        );
        let rendered: Vec<String> = deps.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["Config", "Option<dyn Handler>", "[dyn Handler]"]);
    }

    #[test]
    fn test_no_parameters() {
        assert!(declared(&|| 1u32).is_empty());
    }
}
