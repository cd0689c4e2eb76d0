use std::iter;

use crate::error::Error;
use crate::graph::core::GraphCore;
use crate::graph::SharedManaged;
use crate::token::{AnyToken, TokenChain};
use crate::types::TypeInfo;

/// The view of a graph a provider resolves its arguments through.
#[cfg_attr(test, mockall::automock)]
pub(crate) trait Resolver: Send + Sync {
    fn resolve_token(&self, token: &AnyToken) -> Result<Box<dyn SharedManaged>, Error>;

    fn resolve_by_type(&self, ty: &TypeInfo) -> Result<Vec<Box<dyn SharedManaged>>, Error>;

    fn resolve_by_assignable_type(
        &self,
        ty: &TypeInfo,
    ) -> Result<Vec<Box<dyn SharedManaged>>, Error>;

    fn resolve_by_convertible_type(
        &self,
        ty: &TypeInfo,
    ) -> Result<Vec<Box<dyn SharedManaged>>, Error>;

    /// Hands out `value`, resolved from `token`, as `target` through the
    /// token's capabilities or the graph's conversions.
    fn coerce(
        &self,
        token: &AnyToken,
        value: Box<dyn SharedManaged>,
        target: &TypeInfo,
    ) -> Option<Box<dyn SharedManaged>>;

    /// Finds a binding further up the current chain which could satisfy `ty`
    /// through any tier, and returns the cycle a dependency on it would
    /// close.
    fn cycle_through(&self, ty: &TypeInfo) -> Option<TokenChain>;

    /// Notifies the error policy of a failure raised by the caller and gives
    /// it back.
    fn report(&self, error: Error) -> Error;
}

/// The chain of tokens being resolved on the current thread, innermost
/// first.
#[derive(Clone, Copy)]
pub(crate) struct CallContext<'a> {
    token: &'a AnyToken,
    previous: Option<&'a CallContext<'a>>,
}

impl<'a> CallContext<'a> {
    pub fn new(token: &'a AnyToken) -> Self {
        Self {
            token,
            previous: None,
        }
    }

    pub fn append<'b>(&'b self, token: &'b AnyToken) -> CallContext<'b> {
        CallContext {
            token,
            previous: Some(self),
        }
    }

    /// Appends `token` to `previous`, or starts a new chain.
    pub fn extend<'b>(previous: Option<&'b CallContext<'b>>, token: &'b AnyToken) -> CallContext<'b> {
        match previous {
            Some(previous) => previous.append(token),
            None => CallContext::new(token),
        }
    }

    /// Iterates the tokens below the current one, innermost first.
    pub fn ancestors(&self) -> impl Iterator<Item = &'a AnyToken> + 'a {
        let mut this = self.previous;
        iter::from_fn(move || {
            let context = this?;
            this = context.previous;
            Some(context.token)
        })
    }

    pub fn contains(&self, token: &AnyToken) -> bool {
        let mut this = Some(self);
        while let Some(context) = this {
            if context.token == token {
                return true;
            }
            this = context.previous;
        }
        false
    }

    /// Returns true if the current token already appears earlier in the
    /// chain.
    pub fn is_reentrant(&self) -> bool {
        self.previous
            .is_some_and(|previous| previous.contains(self.token))
    }

    /// Lists the tokens from the earlier occurrence of the current token up
    /// to the current one, or the whole chain if there's none.
    pub fn cycle(&self) -> TokenChain {
        let mut tokens = vec![*self.token];
        let mut this = self.previous;
        while let Some(context) = this {
            tokens.push(*context.token);
            if context.token == self.token {
                break;
            }
            this = context.previous;
        }
        tokens.reverse();
        TokenChain::new(tokens)
    }
}

/// A [`Resolver`] which resolves dependencies on behalf of the provider at
/// the head of `context`.
pub(super) struct ChainResolver<'a> {
    core: &'a GraphCore,
    context: &'a CallContext<'a>,
}

impl<'a> ChainResolver<'a> {
    pub fn new(core: &'a GraphCore, context: &'a CallContext<'a>) -> Self {
        Self { core, context }
    }
}

impl Resolver for ChainResolver<'_> {
    fn resolve_token(&self, token: &AnyToken) -> Result<Box<dyn SharedManaged>, Error> {
        self.core.resolve(token, Some(self.context))
    }

    fn resolve_by_type(&self, ty: &TypeInfo) -> Result<Vec<Box<dyn SharedManaged>>, Error> {
        self.core.resolve_by_type(ty, Some(self.context))
    }

    fn resolve_by_assignable_type(
        &self,
        ty: &TypeInfo,
    ) -> Result<Vec<Box<dyn SharedManaged>>, Error> {
        self.core.resolve_by_assignable_type(ty, Some(self.context))
    }

    fn resolve_by_convertible_type(
        &self,
        ty: &TypeInfo,
    ) -> Result<Vec<Box<dyn SharedManaged>>, Error> {
        self.core.resolve_by_convertible_type(ty, Some(self.context))
    }

    fn coerce(
        &self,
        token: &AnyToken,
        value: Box<dyn SharedManaged>,
        target: &TypeInfo,
    ) -> Option<Box<dyn SharedManaged>> {
        self.core.coerce(token, value, target)
    }

    fn cycle_through(&self, ty: &TypeInfo) -> Option<TokenChain> {
        self.core.cycle_through(ty, self.context)
    }

    fn report(&self, error: Error) -> Error {
        self.core.report(error)
    }
}

#[cfg(test)]
mod tests {
    use crate::token;

    use super::*;

    #[test]
    fn call_context_detects_reentrance() {
        let a = token::named::<u8>("a").erase();
        let b = token::named::<u8>("b").erase();
        let c = token::named::<u8>("c").erase();

        let root = CallContext::new(&a);
        let second = root.append(&b);
        let third = second.append(&c);
        assert!(!third.is_reentrant());
        assert!(third.contains(&a));
        assert!(!CallContext::new(&c).contains(&a));

        let again = third.append(&b);
        assert!(again.is_reentrant());
        assert_eq!(again.cycle().tokens(), &[b, c, b]);
    }

    #[test]
    fn call_context_ancestors_exclude_the_current_token() {
        let a = token::named::<u8>("a").erase();
        let b = token::named::<u8>("b").erase();
        let c = token::named::<u8>("c").erase();

        let root = CallContext::new(&a);
        let second = root.append(&b);
        let third = second.append(&c);
        assert_eq!(third.ancestors().copied().collect::<Vec<_>>(), vec![b, a]);
        assert_eq!(root.ancestors().count(), 0);

        assert_eq!(third.append(&a).cycle().tokens(), &[a, b, c, a]);
    }

    #[test]
    fn call_context_cycle_without_reentrance_lists_whole_chain() {
        let a = token::named::<u8>("a").erase();
        let b = token::named::<u8>("b").erase();

        let root = CallContext::new(&a);
        let second = CallContext::extend(Some(&root), &b);
        assert!(second.contains(&b));
        assert_eq!(second.cycle().tokens(), &[a, b]);
    }
}
