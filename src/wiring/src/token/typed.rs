use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::graph::Managed;
use crate::token::{AnyToken, TokenId};
use crate::types::TypeInfo;

/// An opaque handle naming one binding of a value of type `T`.
///
/// Tokens are cheap to copy. Equality is identity of the mint, never of the
/// type or the label.
pub struct Token<T>
where
    T: Managed,
{
    id: TokenId,
    label: Option<&'static str>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Token<T>
where
    T: Managed,
{
    pub(super) fn new(label: Option<&'static str>) -> Self {
        Self {
            id: TokenId::next(),
            label,
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> TokenId {
        self.id
    }

    pub fn label(&self) -> Option<&'static str> {
        self.label
    }

    pub fn type_info(&self) -> TypeInfo {
        TypeInfo::of::<T>()
    }

    /// Forgets the static type, keeping it as a [`TypeInfo`].
    pub fn erase(&self) -> AnyToken {
        AnyToken {
            id: self.id,
            label: self.label,
            ty: self.type_info(),
        }
    }
}

impl<T> Clone for Token<T>
where
    T: Managed,
{
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Token<T> where T: Managed {}

impl<T> PartialEq for Token<T>
where
    T: Managed,
{
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Token<T> where T: Managed {}

impl<T> Hash for Token<T>
where
    T: Managed,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> Debug for Token<T>
where
    T: Managed,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(self, f)
    }
}

impl<T> Display for Token<T>
where
    T: Managed,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.erase(), f)
    }
}

impl<T> From<Token<T>> for AnyToken
where
    T: Managed,
{
    fn from(token: Token<T>) -> Self {
        token.erase()
    }
}

impl<T> From<&Token<T>> for AnyToken
where
    T: Managed,
{
    fn from(token: &Token<T>) -> Self {
        token.erase()
    }
}
