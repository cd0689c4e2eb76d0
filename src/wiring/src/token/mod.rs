mod typed;

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::graph::Managed;
use crate::types::TypeInfo;

pub use typed::Token;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// The process-unique identity of a minted token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenId(u64);

impl TokenId {
    fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Display for TokenId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "#{}", self.0)
    }
}

/// Mints a fresh token for values of `T`.
pub fn mint<T>() -> Token<T>
where
    T: Managed,
{
    Token::new(None)
}

/// Mints a fresh token for values of `T`, labelled for diagnostics.
///
/// The label takes no part in equality: two tokens minted with the same label
/// are still distinct.
pub fn named<T>(label: &'static str) -> Token<T>
where
    T: Managed,
{
    Token::new(Some(label))
}

/// A type-erased [`Token`].
#[derive(Clone, Copy)]
pub struct AnyToken {
    id: TokenId,
    label: Option<&'static str>,
    ty: TypeInfo,
}

impl AnyToken {
    pub fn id(&self) -> TokenId {
        self.id
    }

    pub fn label(&self) -> Option<&'static str> {
        self.label
    }

    pub fn type_info(&self) -> TypeInfo {
        self.ty
    }
}

impl PartialEq for AnyToken {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for AnyToken {}

impl Hash for AnyToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Debug for AnyToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(self, f)
    }
}

impl Display for AnyToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self.label {
            Some(label) => write!(f, "{}@{:?}{}", self.ty, label, self.id),
            None => write!(f, "{}{}", self.ty, self.id),
        }
    }
}

/// The tokens of a resolution chain which loops back to its first element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenChain {
    tokens: Vec<AnyToken>,
}

impl TokenChain {
    pub(crate) fn new(tokens: Vec<AnyToken>) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &[AnyToken] {
        &self.tokens
    }

    pub fn head(&self) -> Option<&AnyToken> {
        self.tokens.first()
    }
}

impl Display for TokenChain {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{token}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_tokens_are_distinct() {
        let a = mint::<i32>();
        let b = mint::<i32>();
        let c = named::<i32>("c");
        let d = named::<i32>("c");

        assert_ne!(a, b);
        assert_ne!(c, d);
        assert_eq!(a, a);
        assert_ne!(a.erase(), b.erase());
        assert_eq!(c.erase(), AnyToken::from(c));
    }

    #[test]
    fn token_display_names_type_label_and_id() {
        let token = named::<u8>("port");
        let id = token.id();

        assert_eq!(token.to_string(), format!("u8@\"port\"{id}"));
        assert_eq!(mint::<u8>().erase().label(), None);
    }

    #[test]
    fn token_chain_display_joins_tokens() {
        let a = named::<u8>("a").erase();
        let b = named::<u16>("b").erase();
        let chain = TokenChain::new(vec![a, b, a]);

        assert_eq!(chain.head(), Some(&a));
        assert_eq!(chain.to_string(), format!("{a} -> {b} -> {a}"));
    }
}
