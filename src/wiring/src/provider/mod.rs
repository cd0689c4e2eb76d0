//! Recipes for constructing the values of a graph.
//!
//! A [`Provider`] pairs a [`Constructor`] with a strategy for supplying its
//! arguments:
//!
//! - [`Strategy::Manual`] names the token of each argument explicitly, so the
//!   resolution is fully deterministic.
//! - [`Strategy::Auto`] searches the graph by the type of each parameter,
//!   first for exact matches, then for values assignable through a declared
//!   [`Capability`], and finally for values convertible by the graph. It
//!   fails if a search is ambiguous.
//!
//! Providers are immutable once built and hold no state, so the same recipe
//! may be registered into several graphs.

mod auto;
mod capability;
mod constructor;
mod manual;

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::Error;
use crate::graph::{Managed, Resolver, SharedManaged};
use crate::token::AnyToken;
use crate::types::TypeInfo;

pub use capability::Capability;
pub use constructor::{Arguments, Constructor};

use constructor::{DynConstructor, Signature};

/// How a provider obtains its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Each argument is the value bound to the token at the same position.
    Manual { arguments: Vec<AnyToken> },
    /// Each argument is searched by its parameter type.
    Auto,
}

/// A typed recipe producing values of `T`.
pub struct Provider<T>
where
    T: Managed,
{
    core: ProviderCore,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Provider<T>
where
    T: Managed,
{
    /// Creates a provider whose arguments are the values bound to
    /// `arguments`, in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ArityMismatch`] if the number of tokens differs from
    /// the constructor's arity, or [`Error::KindMismatch`] if a token's type is
    /// structurally unrelated to the parameter at the same position. No policy
    /// sees these errors; use [`Graph::manual`] to report them through a
    /// graph's policy.
    ///
    /// [`Graph::manual`]: crate::graph::Graph::manual
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use std::convert::Infallible;
    /// # use std::sync::Arc;
    /// # use wiring::provider::Provider;
    /// # use wiring::token;
    /// let width = token::named::<u32>("width");
    /// let height = token::named::<u32>("height");
    /// let area = |w: Arc<u32>, h: Arc<u32>| Ok::<_, Infallible>(u64::from(*w * *h));
    /// let provider = Provider::manual(area, [width.erase(), height.erase()]).unwrap();
    /// ```
    pub fn manual<C, D, I>(constructor: C, arguments: I) -> Result<Self, Error>
    where
        C: Constructor<D, Constructed = T>,
        D: 'static,
        I: IntoIterator<Item = AnyToken>,
    {
        manual::build(constructor, arguments.into_iter().collect()).map(Self::from_core)
    }

    /// Creates a provider whose arguments are searched by type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use std::convert::Infallible;
    /// # use std::sync::Arc;
    /// # use wiring::provider::Provider;
    /// let provider = Provider::auto(|name: Arc<String>| Ok::<_, Infallible>(name.len()));
    /// ```
    pub fn auto<C, D>(constructor: C) -> Self
    where
        C: Constructor<D, Constructed = T>,
        D: 'static,
    {
        Self::from_core(auto::build(constructor))
    }

    /// Declares that the produced value may also be handed out as `Arc<U>`,
    /// which makes it a candidate for type searches on `U`.
    ///
    /// A later declaration for the same `U` replaces the earlier one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use std::convert::Infallible;
    /// # use std::fmt::Display;
    /// # use std::sync::Arc;
    /// # use wiring::provider::Provider;
    /// let provider = Provider::auto(|| Ok::<_, Infallible>(42u8))
    ///     .assignable_to(|value| value as Arc<dyn Display + Send + Sync>);
    /// ```
    pub fn assignable_to<U, F>(mut self, upcast: F) -> Self
    where
        U: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<U> + Send + Sync + 'static,
    {
        let capability = Capability::new::<T, U, F>(upcast);
        self.core
            .capabilities
            .retain(|declared| declared.target() != capability.target());
        self.core.capabilities.push(capability);
        self
    }

    pub fn return_type(&self) -> TypeInfo {
        self.core.output()
    }

    pub fn parameters(&self) -> &[TypeInfo] {
        self.core.parameters()
    }

    pub fn strategy(&self) -> &Strategy {
        &self.core.strategy
    }

    /// Lists the types this provider is assignable to besides its own.
    pub fn capabilities(&self) -> impl Iterator<Item = TypeInfo> + '_ {
        self.core.capabilities.iter().map(Capability::target)
    }

    pub(crate) fn into_core(self) -> ProviderCore {
        self.core
    }

    fn from_core(core: ProviderCore) -> Self {
        Self {
            core,
            _marker: PhantomData,
        }
    }
}

impl<T> Debug for Provider<T>
where
    T: Managed,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.core, f)
    }
}

impl<T> Display for Provider<T>
where
    T: Managed,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.core, f)
    }
}

/// The type-erased provider stored by a graph.
pub(crate) struct ProviderCore {
    constructor: Box<dyn DynConstructor>,
    strategy: Strategy,
    capabilities: Vec<Capability>,
}

impl ProviderCore {
    fn new(constructor: Box<dyn DynConstructor>, strategy: Strategy) -> Self {
        Self {
            constructor,
            strategy,
            capabilities: Vec::new(),
        }
    }

    pub fn output(&self) -> TypeInfo {
        self.constructor.output()
    }

    pub fn parameters(&self) -> &[TypeInfo] {
        self.constructor.parameters()
    }

    /// Returns true if the output is `target` or declares a capability for
    /// it.
    pub fn is_assignable_to(&self, target: &TypeInfo) -> bool {
        self.output() == *target || self.capability(target).is_some()
    }

    /// Hands out `value`, which must be this provider's output, as `target`.
    pub fn upcast(
        &self,
        value: &dyn SharedManaged,
        target: &TypeInfo,
    ) -> Option<Box<dyn SharedManaged>> {
        if self.output() == *target {
            Some(value.dyn_clone())
        } else {
            self.capability(target)?.apply(value)
        }
    }

    /// Resolves all arguments and runs the constructor.
    ///
    /// Failures raised here are reported through `resolver` before they're
    /// returned. Failures coming from nested resolutions are passed through.
    pub fn provide(&self, resolver: &dyn Resolver) -> Result<Box<dyn SharedManaged>, Error> {
        let arguments = match &self.strategy {
            Strategy::Manual { arguments } => manual::resolve_arguments(self, arguments, resolver)?,
            Strategy::Auto => auto::resolve_arguments(self, resolver)?,
        };

        self.constructor
            .dyn_construct(Arguments::new(arguments))
            .map_err(|source| {
                resolver.report(Error::Construction {
                    provider: self.to_string(),
                    source,
                })
            })
    }

    fn capability(&self, target: &TypeInfo) -> Option<&Capability> {
        self.capabilities
            .iter()
            .find(|capability| capability.target() == *target)
    }
}

impl Display for ProviderCore {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let signature = Signature::new(self.parameters(), self.output());
        match &self.strategy {
            Strategy::Manual { arguments } => {
                writeln!(f, "ManualProvider {{")?;
                writeln!(f, "    constructor: {signature},")?;
                if arguments.is_empty() {
                    writeln!(f, "    arguments: [],")?;
                } else {
                    writeln!(f, "    arguments: [")?;
                    for argument in arguments {
                        writeln!(f, "        {argument},")?;
                    }
                    writeln!(f, "    ],")?;
                }
                write!(f, "}}")
            }
            Strategy::Auto => {
                writeln!(f, "AutoProvider {{")?;
                writeln!(f, "    constructor: {signature},")?;
                write!(f, "}}")
            }
        }
    }
}
