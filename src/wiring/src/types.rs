//! Runtime descriptors of the types flowing through a graph.

use std::any::{self, TypeId};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::hash::{Hash, Hasher};
use std::mem;

/// A coarse structural classification of a type.
///
/// Kinds are only used to reject obviously incompatible manual bindings early,
/// e.g. passing a token of `i32` where a `String` is expected. Anything finer
/// is decided when the value is actually resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    Signed,
    Unsigned,
    Float,
    Char,
    Text,
    /// An unsized target such as `dyn Trait`, reached through capabilities.
    Dynamic,
    /// Any other sized type.
    Value,
}

impl Kind {
    /// Classifies `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        // A reference to an unsized type is a fat pointer.
        if mem::size_of::<&T>() != mem::size_of::<&()>() {
            return Self::Dynamic;
        }

        let id = TypeId::of::<T>();

        macro_rules! classify {
            ($($kind:ident => [$($ty:ty),*]),* $(,)?) => {
                $(
                    if [$(TypeId::of::<$ty>()),*].contains(&id) {
                        return Self::$kind;
                    }
                )*
            };
        }

        classify! {
            Bool => [bool],
            Signed => [i8, i16, i32, i64, i128, isize],
            Unsigned => [u8, u16, u32, u64, u128, usize],
            Float => [f32, f64],
            Char => [char],
            Text => [String, &'static str],
        }

        Self::Value
    }

    /// Returns true if a value of kind `self` may be passed where `target` is
    /// expected.
    ///
    /// Opaque values and dynamic targets always pass, since only the graph
    /// knows which capabilities and conversions exist.
    pub fn matches(self, target: Kind) -> bool {
        self == target || target == Self::Dynamic || self == Self::Value || target == Self::Value
    }
}

/// The identity, name and kind of a type, computed once.
#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
    kind: Kind,
}

impl TypeInfo {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: any::type_name::<T>(),
            kind: Kind::of::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Display for TypeInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::Debug;

    use super::*;

    struct Port(#[allow(dead_code)] u16);

    #[test]
    fn kind_of_classifies_primitives() {
        assert_eq!(Kind::of::<bool>(), Kind::Bool);
        assert_eq!(Kind::of::<i64>(), Kind::Signed);
        assert_eq!(Kind::of::<u8>(), Kind::Unsigned);
        assert_eq!(Kind::of::<f32>(), Kind::Float);
        assert_eq!(Kind::of::<char>(), Kind::Char);
        assert_eq!(Kind::of::<String>(), Kind::Text);
        assert_eq!(Kind::of::<&'static str>(), Kind::Text);
    }

    #[test]
    fn kind_of_classifies_unsized_and_opaque_types() {
        assert_eq!(Kind::of::<dyn Debug + Send + Sync>(), Kind::Dynamic);
        assert_eq!(Kind::of::<str>(), Kind::Dynamic);
        assert_eq!(Kind::of::<Port>(), Kind::Value);
        assert_eq!(Kind::of::<Vec<u8>>(), Kind::Value);
    }

    #[test]
    fn kind_matches_is_coarse() {
        assert!(Kind::Unsigned.matches(Kind::Unsigned));
        assert!(Kind::Value.matches(Kind::Unsigned));
        assert!(Kind::Unsigned.matches(Kind::Value));
        assert!(Kind::Value.matches(Kind::Dynamic));
        assert!(!Kind::Signed.matches(Kind::Text));
        assert!(!Kind::Float.matches(Kind::Unsigned));
    }

    #[test]
    fn type_info_compares_by_type_id() {
        assert_eq!(TypeInfo::of::<u8>(), TypeInfo::of::<u8>());
        assert_ne!(TypeInfo::of::<u8>(), TypeInfo::of::<u16>());
        assert_eq!(TypeInfo::of::<u8>().to_string(), "u8");
    }
}
