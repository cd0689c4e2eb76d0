//! Grouped registrations.

use std::any;
use std::error::Error;

use crate::graph::Graph;

/// A unit of configuration which registers related bindings into a graph.
///
/// # Examples
///
/// ```rust
/// # use std::convert::Infallible;
/// # use std::error::Error;
/// # use wiring::graph::Graph;
/// # use wiring::module::Module;
/// # use wiring::provider::Provider;
/// struct Settings;
///
/// impl Module for Settings {
///     fn configure(&self, graph: &Graph) -> Result<(), Box<dyn Error + Send + Sync>> {
///         graph.bind(Provider::auto(|| Ok::<_, Infallible>(8080u16)))?;
///         Ok(())
///     }
/// }
///
/// let graph = Graph::from_module(Settings).unwrap();
/// assert_eq!(graph.len(), 1);
/// ```
pub trait Module: 'static {
    /// Names the module in [`Error::ModuleSetup`](crate::Error::ModuleSetup).
    fn name(&self) -> &'static str {
        any::type_name::<Self>()
    }

    fn configure(&self, graph: &Graph) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// A list of modules installed one after another.
#[derive(Default)]
pub struct Configuration {
    modules: Vec<Box<dyn Module>>,
}

impl Configuration {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with<M: Module>(mut self, module: M) -> Self {
        self.modules.push(Box::new(module));
        self
    }

    pub fn compose(mut self, mut other: Configuration) -> Self {
        self.modules.append(&mut other.modules);
        self
    }
}

impl Module for Configuration {
    fn configure(&self, graph: &Graph) -> Result<(), Box<dyn Error + Send + Sync>> {
        for module in &self.modules {
            graph.install(module.as_ref())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::sync::Arc;

    use parking_lot::Mutex;

    use crate::error::Error as WiringError;
    use crate::policy::SilentPolicy;
    use crate::provider::Provider;
    use crate::token::{self, Token};

    use super::*;

    struct Number(Token<u8>, u8);

    impl Module for Number {
        fn configure(&self, graph: &Graph) -> Result<(), Box<dyn Error + Send + Sync>> {
            let value = self.1;
            graph.register(self.0, Provider::auto(move || Ok::<_, Infallible>(value)))?;
            Ok(())
        }
    }

    #[test]
    fn configuration_installs_modules_in_order() {
        let (a, b, c) = (token::mint(), token::mint(), token::mint());
        let configuration = Configuration::new()
            .with(Number(a, 1))
            .compose(Configuration::new().with(Number(b, 2)).with(Number(c, 3)));

        let graph = Graph::from_module_with_policy(configuration, SilentPolicy).unwrap();
        assert_eq!(graph.tokens(), vec![a.erase(), b.erase(), c.erase()]);
        assert_eq!(*graph.resolve(&c).unwrap(), 3);
    }

    #[test]
    fn configuration_passes_graph_errors_through_once() {
        let reported = Arc::new(Mutex::new(Vec::new()));
        let policy = {
            let reported = Arc::clone(&reported);
            move |err: &WiringError| reported.lock().push(err.kind())
        };

        let a = token::mint();
        let configuration = Configuration::new().with(Number(a, 1)).with(Number(a, 2));

        let err = Graph::from_module_with_policy(configuration, policy).unwrap_err();
        assert!(matches!(err, WiringError::DuplicateToken { .. }));
        assert_eq!(reported.lock().len(), 1);
    }
}
