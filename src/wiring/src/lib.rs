//! A lazy, thread-safe dependency resolution graph.
//!
//! Values are described by [`Provider`](provider::Provider)s and bound to
//! [`Token`](token::Token)s in a [`Graph`](graph::Graph). A provider's
//! arguments are either named by token or searched by type, and each provider
//! runs at most once per graph.

#![allow(clippy::new_without_default)]

pub mod error;
pub mod graph;
pub mod module;
pub mod policy;
pub mod provider;
pub mod token;
pub mod types;
mod util;

pub use error::{Error, ErrorKind};
pub use util::any::{AsAny, Downcast, DowncastRef};

pub mod prelude {
    pub use crate::error::{Error, ErrorKind};
    pub use crate::graph::{Graph, TokenState};
    pub use crate::module::{Configuration, Module};
    pub use crate::policy::{ErrorPolicy, LogPolicy, SilentPolicy};
    pub use crate::provider::Provider;
    pub use crate::token::{self, AnyToken, Token};
    pub use crate::{Downcast, DowncastRef};
}
