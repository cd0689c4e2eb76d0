//! The resolution graph: bindings from tokens to providers, and the engine
//! which lazily constructs and memoizes their values.

mod binding;
mod conversion;
mod core;
mod registry;
mod resolver;
mod wait;

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::error::Error;
use crate::module::Module;
use crate::policy::{ErrorPolicy, LogPolicy};
use crate::provider::{Constructor, Provider};
use crate::token::{self, AnyToken, Token};
use crate::types::TypeInfo;
use crate::util::any::{AsAny, Downcast};

use self::core::GraphCore;

pub(crate) use resolver::Resolver;

#[cfg(test)]
pub(crate) use resolver::MockResolver;

/// Values a provider may produce.
pub trait Managed: Send + Sync + 'static {}

impl<T> Managed for T where T: Send + Sync + 'static {}

/// A type-erased `Arc` held by a graph.
pub trait SharedManaged: AsAny + Send + Sync {
    fn dyn_clone(&self) -> Box<dyn SharedManaged>;
}

impl<T> SharedManaged for Arc<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    fn dyn_clone(&self) -> Box<dyn SharedManaged> {
        Box::new(Arc::clone(self))
    }
}

/// The resolution state of a token in a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenState {
    /// No provider is bound to the token.
    Unregistered,
    /// The provider hasn't run yet.
    Unresolved,
    /// The provider is running.
    InFlight,
    /// The value is cached.
    Resolved,
    /// The provider failed, and the failure is kept.
    Failed,
}

/// A thread-safe graph of providers bound to tokens.
///
/// Each provider runs at most once per graph, the first time its token is
/// resolved directly or as a dependency. Its value is then shared by all
/// later requests. A failed provider stays failed and its error is returned
/// again on every later request.
///
/// If a provider panics instead of returning, its token goes back to
/// unresolved and the next request, possibly one that was waiting on the
/// panicking thread, runs the provider again.
///
/// Every failure raised by a graph is handed to its [`ErrorPolicy`] right
/// before it's returned. Cloning a graph yields another handle to the same
/// bindings.
///
/// # Examples
///
/// ```rust
/// # use std::convert::Infallible;
/// # use std::sync::Arc;
/// # use wiring::graph::Graph;
/// # use wiring::provider::Provider;
/// let graph = Graph::new();
/// let name = graph
///     .bind(Provider::auto(|| Ok::<_, Infallible>(String::from("wiring"))))
///     .unwrap();
/// let length = graph
///     .bind(Provider::manual(|name: Arc<String>| Ok::<_, Infallible>(name.len()), [name.erase()]).unwrap())
///     .unwrap();
///
/// assert_eq!(*graph.resolve(&length).unwrap(), 6);
/// ```
#[derive(Clone)]
pub struct Graph {
    core: Arc<GraphCore>,
}

impl Graph {
    /// Creates an empty graph which logs failures with [`LogPolicy`].
    pub fn new() -> Self {
        Self::with_policy(LogPolicy)
    }

    pub fn with_policy<P>(policy: P) -> Self
    where
        P: ErrorPolicy,
    {
        Self {
            core: Arc::new(GraphCore::new(Box::new(policy))),
        }
    }

    /// Creates a graph configured by `module`.
    pub fn from_module<M>(module: M) -> Result<Self, Error>
    where
        M: Module,
    {
        Self::from_module_with_policy(module, LogPolicy)
    }

    pub fn from_module_with_policy<M, P>(module: M, policy: P) -> Result<Self, Error>
    where
        M: Module,
        P: ErrorPolicy,
    {
        let graph = Self::with_policy(policy);
        graph.install(&module)?;
        Ok(graph)
    }

    /// Lets `module` register its bindings.
    ///
    /// # Errors
    ///
    /// Errors raised by the graph on behalf of the module are returned
    /// unchanged. Any other error of the module is wrapped in
    /// [`Error::ModuleSetup`].
    pub fn install(&self, module: &dyn Module) -> Result<(), Error> {
        let Err(err) = module.configure(self) else {
            return Ok(());
        };
        match err.downcast::<Error>() {
            Ok(err) => Err(*err),
            Err(source) => Err(self.core.report(Error::ModuleSetup {
                module: module.name(),
                source: Arc::from(source),
            })),
        }
    }

    /// Binds `token` to `provider`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateToken`] if `token` is already bound. A
    /// binding is never replaced.
    pub fn register<T>(&self, token: Token<T>, provider: Provider<T>) -> Result<(), Error>
    where
        T: Managed,
    {
        self.core.register(token.erase(), provider.into_core())
    }

    /// Binds `provider` to a freshly minted token and returns the token.
    pub fn bind<T>(&self, provider: Provider<T>) -> Result<Token<T>, Error>
    where
        T: Managed,
    {
        let token = token::mint();
        self.register(token, provider)?;
        Ok(token)
    }

    /// Creates a manual provider like [`Provider::manual`], handing an
    /// [`Error::ArityMismatch`] or [`Error::KindMismatch`] to this graph's
    /// policy before returning it.
    pub fn manual<T, C, D, I>(&self, constructor: C, arguments: I) -> Result<Provider<T>, Error>
    where
        T: Managed,
        C: Constructor<D, Constructed = T>,
        D: 'static,
        I: IntoIterator<Item = AnyToken>,
    {
        Provider::manual(constructor, arguments).map_err(|err| self.core.report(err))
    }

    /// Registers a conversion which lets values of `A` be passed where `B` is
    /// expected.
    ///
    /// Lossless numeric widenings, such as `u8` to `u32` or `f32` to `f64`,
    /// are always registered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateConversion`] if a conversion from `A` to `B`
    /// already exists.
    pub fn register_conversion<A, B, F>(&self, convert: F) -> Result<(), Error>
    where
        A: Managed,
        B: Managed,
        F: Fn(&A) -> B + Send + Sync + 'static,
    {
        self.core.register_conversion(convert)
    }

    /// Resolves the value bound to `token`, constructing it and its
    /// dependencies on first use.
    pub fn resolve<T>(&self, token: &Token<T>) -> Result<Arc<T>, Error>
    where
        T: Managed,
    {
        self.dyn_resolve(&token.erase()).map(unwrap_shared)
    }

    pub fn dyn_resolve(&self, token: &AnyToken) -> Result<Box<dyn SharedManaged>, Error> {
        self.core.resolve(token, None)
    }

    /// Resolves every binding whose provider produces exactly `T`, in
    /// registration order.
    ///
    /// Bindings which have already failed are skipped, while a binding which
    /// fails during this scan fails the whole call. Scanning again afterwards
    /// then succeeds without it, so the outcome of a scan, and of an automatic
    /// provider searching for `T`, depends on which bindings were resolved
    /// before.
    pub fn resolve_by_type<T>(&self) -> Result<Vec<Arc<T>>, Error>
    where
        T: Managed,
    {
        let values = self.core.resolve_by_type(&TypeInfo::of::<T>(), None)?;
        Ok(values.into_iter().map(unwrap_shared).collect())
    }

    /// Resolves every binding whose provider produces `U` or is declared
    /// assignable to `U`, in registration order.
    pub fn resolve_by_assignable_type<U>(&self) -> Result<Vec<Arc<U>>, Error>
    where
        U: ?Sized + Send + Sync + 'static,
    {
        let values = self
            .core
            .resolve_by_assignable_type(&TypeInfo::of::<U>(), None)?;
        Ok(values.into_iter().map(unwrap_shared).collect())
    }

    /// Resolves every binding whose value converts to `U`, in registration
    /// order. Each value is converted into a fresh `Arc`.
    pub fn resolve_by_convertible_type<U>(&self) -> Result<Vec<Arc<U>>, Error>
    where
        U: Managed,
    {
        let values = self
            .core
            .resolve_by_convertible_type(&TypeInfo::of::<U>(), None)?;
        Ok(values.into_iter().map(unwrap_shared).collect())
    }

    pub fn state(&self, token: &AnyToken) -> TokenState {
        self.core.state(token)
    }

    pub fn contains(&self, token: &AnyToken) -> bool {
        self.core.contains(token)
    }

    pub fn len(&self) -> usize {
        self.core.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lists the bound tokens in registration order.
    pub fn tokens(&self) -> Vec<AnyToken> {
        self.core.tokens()
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Graph {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Graph")
            .field("tokens", &self.tokens())
            .finish_non_exhaustive()
    }
}

fn unwrap_shared<T>(value: Box<dyn SharedManaged>) -> Arc<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    match value.downcast::<Arc<T>>() {
        Ok(value) => *value,
        Err(_) => unreachable!("the value's type should be `Arc<T>`"),
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::error::Error as StdError;
    use std::fmt::Display;

    use crate::error::ErrorKind;
    use crate::policy::SilentPolicy;

    use super::*;

    struct FailingModule;

    impl Module for FailingModule {
        fn configure(&self, _graph: &Graph) -> Result<(), Box<dyn StdError + Send + Sync>> {
            Err("missing setting".into())
        }
    }

    #[test]
    fn graph_operations_succeed() {
        let graph = Graph::with_policy(SilentPolicy);
        assert!(graph.is_empty());

        let number = graph
            .bind(
                Provider::auto(|| Ok::<_, Infallible>(42u8))
                    .assignable_to(|value| value as Arc<dyn Display + Send + Sync>),
            )
            .unwrap();
        let text = token::named::<String>("text");
        graph
            .register(
                text,
                Provider::manual(|n: Arc<u64>| Ok::<_, Infallible>(n.to_string()), [number.erase()])
                    .unwrap(),
            )
            .unwrap();

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.tokens(), vec![number.erase(), text.erase()]);
        assert!(graph.contains(&text.erase()));
        assert_eq!(graph.state(&text.erase()), TokenState::Unresolved);

        assert_eq!(*graph.resolve(&text).unwrap(), "42");
        assert_eq!(graph.state(&number.erase()), TokenState::Resolved);

        let displays = graph
            .resolve_by_assignable_type::<dyn Display + Send + Sync>()
            .unwrap();
        assert_eq!(displays.len(), 1);
        assert_eq!(displays[0].to_string(), "42");

        let widened = graph.resolve_by_convertible_type::<u32>().unwrap();
        assert_eq!(widened.iter().map(|v| **v).collect::<Vec<_>>(), vec![42]);
    }

    #[test]
    fn graph_register_fails_when_token_is_duplicated() {
        let graph = Graph::with_policy(SilentPolicy);
        let token = token::mint::<u8>();
        graph
            .register(token, Provider::auto(|| Ok::<_, Infallible>(1u8)))
            .unwrap();

        let err = graph
            .register(token, Provider::auto(|| Ok::<_, Infallible>(2u8)))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateToken { .. }));
        assert_eq!(*graph.resolve(&token).unwrap(), 1);
    }

    #[test]
    fn graph_install_wraps_module_errors() {
        let graph = Graph::with_policy(SilentPolicy);
        let err = graph.install(&FailingModule).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Configuration);
        let Error::ModuleSetup { module, .. } = &err else {
            panic!("should be a module setup error");
        };
        assert!(module.ends_with("FailingModule"));
        assert_eq!(
            err.source().map(ToString::to_string).as_deref(),
            Some("missing setting")
        );
    }

    #[test]
    fn graph_debug_lists_tokens() {
        let graph = Graph::with_policy(SilentPolicy);
        let token = graph
            .bind(Provider::auto(|| Ok::<_, Infallible>(1u8)))
            .unwrap();
        assert_eq!(format!("{graph:?}"), format!("Graph {{ tokens: [{token}], .. }}"));
    }
}
