use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Error;
use crate::graph::binding::Binding;
use crate::provider::ProviderCore;
use crate::token::{AnyToken, TokenId};

/// Bindings in registration order, indexed by token.
#[derive(Default)]
pub(super) struct Registry {
    bindings: Vec<Arc<Binding>>,
    index: HashMap<TokenId, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, token: AnyToken, provider: ProviderCore) -> Result<(), Error> {
        if self.index.contains_key(&token.id()) {
            return Err(Error::DuplicateToken { token });
        }
        self.index.insert(token.id(), self.bindings.len());
        self.bindings.push(Arc::new(Binding::new(token, provider)));
        Ok(())
    }

    pub fn get(&self, token: &AnyToken) -> Option<Arc<Binding>> {
        self.index
            .get(&token.id())
            .map(|&position| Arc::clone(&self.bindings[position]))
    }

    /// Collects the bindings accepted by `predicate`, in registration order.
    pub fn select<P>(&self, mut predicate: P) -> Vec<Arc<Binding>>
    where
        P: FnMut(&Binding) -> bool,
    {
        self.bindings
            .iter()
            .filter(|binding| predicate(binding))
            .cloned()
            .collect()
    }

    pub fn tokens(&self) -> Vec<AnyToken> {
        self.bindings.iter().map(|binding| binding.token).collect()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use crate::provider::Provider;
    use crate::token;

    use super::*;

    fn provider() -> ProviderCore {
        Provider::auto(|| Ok::<_, Infallible>(0u8)).into_core()
    }

    #[test]
    fn registry_keeps_registration_order() {
        let tokens: Vec<_> = (0..4).map(|_| token::mint::<u8>().erase()).collect();

        let mut registry = Registry::new();
        for token in tokens.iter().rev() {
            registry.insert(*token, provider()).unwrap();
        }

        let expected: Vec<_> = tokens.iter().rev().copied().collect();
        assert_eq!(registry.tokens(), expected);
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.get(&tokens[2]).unwrap().token, tokens[2]);
    }

    #[test]
    fn registry_insert_fails_when_token_is_duplicated() {
        let token = token::mint::<u8>().erase();

        let mut registry = Registry::new();
        registry.insert(token, provider()).unwrap();
        assert!(matches!(
            registry.insert(token, provider()),
            Err(Error::DuplicateToken { .. })
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn registry_select_filters_bindings() {
        let a = token::mint::<u8>().erase();
        let b = token::mint::<u8>().erase();

        let mut registry = Registry::new();
        registry.insert(a, provider()).unwrap();
        registry.insert(b, provider()).unwrap();

        let selected = registry.select(|binding| binding.token == b);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].token, b);
        assert!(registry.get(&token::mint::<u8>().erase()).is_none());
    }
}
