use std::error::Error as StdError;
use std::sync::Arc;

use snafu::prelude::*;

use crate::token::{AnyToken, TokenChain};
use crate::types::TypeInfo;

/// The broad class of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A provider, binding or module is malformed.
    Configuration,
    /// A token or type query has no usable answer.
    Resolution,
    /// A token was re-entered while it was being resolved.
    CyclicDependency,
    /// A user constructor returned an error.
    Constructor,
}

#[derive(Debug, Clone, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("the constructor takes {expected} arguments but {found} tokens are given"))]
    #[non_exhaustive]
    ArityMismatch { expected: usize, found: usize },
    #[snafu(display("argument {index} is bound to {token} which cannot be passed as {expected}"))]
    #[non_exhaustive]
    KindMismatch {
        index: usize,
        token: AnyToken,
        expected: TypeInfo,
    },
    #[snafu(display("the token {token} is already bound to a provider"))]
    #[non_exhaustive]
    DuplicateToken { token: AnyToken },
    #[snafu(display("a conversion from {from} to {to} is already registered"))]
    #[non_exhaustive]
    DuplicateConversion { from: TypeInfo, to: TypeInfo },
    #[snafu(display("module {module} fails to configure the graph"))]
    #[non_exhaustive]
    ModuleSetup {
        module: &'static str,
        source: Arc<dyn StdError + Send + Sync>,
    },
    #[snafu(display("no provider is bound to the token {token}"))]
    #[non_exhaustive]
    NotBound { token: AnyToken },
    #[snafu(display(
        "no candidate is assignable to argument {index} of type {ty} for provider {provider}"
    ))]
    #[non_exhaustive]
    NoCandidate {
        index: usize,
        ty: TypeInfo,
        provider: String,
    },
    #[snafu(display(
        "ambiguous: {count} candidates are assignable to argument {index} of type {ty} for provider {provider}"
    ))]
    #[non_exhaustive]
    Ambiguous {
        index: usize,
        ty: TypeInfo,
        count: usize,
        provider: String,
    },
    #[snafu(display(
        "argument {index} of type {from} can be neither assigned nor converted to {to} for provider {provider}"
    ))]
    #[non_exhaustive]
    Incompatible {
        index: usize,
        from: TypeInfo,
        to: TypeInfo,
        provider: String,
    },
    #[snafu(display("could not resolve a value which depends on itself: {chain}"))]
    #[non_exhaustive]
    CyclicDependency { chain: TokenChain },
    #[snafu(display("error calling the constructor of provider {provider}"))]
    #[non_exhaustive]
    Construction {
        provider: String,
        source: Arc<dyn StdError + Send + Sync>,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ArityMismatch { .. }
            | Self::KindMismatch { .. }
            | Self::DuplicateToken { .. }
            | Self::DuplicateConversion { .. }
            | Self::ModuleSetup { .. } => ErrorKind::Configuration,
            Self::NotBound { .. }
            | Self::NoCandidate { .. }
            | Self::Ambiguous { .. }
            | Self::Incompatible { .. } => ErrorKind::Resolution,
            Self::CyclicDependency { .. } => ErrorKind::CyclicDependency,
            Self::Construction { .. } => ErrorKind::Constructor,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::token;

    use super::*;

    #[test]
    fn error_kind_follows_the_taxonomy() {
        let token = token::mint::<u8>().erase();

        let err = Error::DuplicateToken { token };
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = Error::NotBound { token };
        assert_eq!(err.kind(), ErrorKind::Resolution);

        let err = Error::CyclicDependency {
            chain: TokenChain::new(vec![token, token]),
        };
        assert_eq!(err.kind(), ErrorKind::CyclicDependency);

        let err = Error::Construction {
            provider: String::from("p"),
            source: Arc::from(Box::<dyn StdError + Send + Sync>::from("boom")),
        };
        assert_eq!(err.kind(), ErrorKind::Constructor);
    }

    #[test]
    fn construction_error_exposes_its_source() {
        let err = Error::Construction {
            provider: String::from("p"),
            source: Arc::from(Box::<dyn StdError + Send + Sync>::from("boom")),
        };

        assert_eq!(err.source().map(ToString::to_string).as_deref(), Some("boom"));
    }
}
