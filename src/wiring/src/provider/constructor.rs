use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::marker::PhantomData;
use std::sync::Arc;
use std::vec;

use crate::graph::{Managed, SharedManaged};
use crate::types::TypeInfo;
use crate::util::any::Downcast;

/// A function which builds a value from already resolved dependencies.
///
/// Functions of `Fn(Arc<D1>, Arc<D2>, ...) -> Result<T, E> + Send + Sync +
/// 'static` are [`Constructor`]s, where each `Di` may be unsized (e.g. a
/// `dyn Trait`) and `T` is the produced value. Use [`Infallible`] as `E` for a
/// constructor which can't fail.
///
/// Due to the lack of variadic generics, [`Constructor`] is implemented for
/// functions whose arity is at most 12.
///
/// [`Infallible`]: std::convert::Infallible
pub trait Constructor<D>
where
    Self: Send + Sync + 'static,
{
    /// The successfully constructed value.
    type Constructed: Managed;

    /// The error reported by the constructor itself.
    type Error: Into<Box<dyn Error + Send + Sync>>;

    /// Describes the positional parameter types, i.e. each `Di`.
    fn parameters() -> Vec<TypeInfo>;

    /// Calls `self` with the resolved arguments.
    fn construct(&self, arguments: Arguments) -> Result<Self::Constructed, Self::Error>;
}

/// Resolved arguments handed to a [`Constructor`], one per parameter and in
/// order.
pub struct Arguments {
    values: vec::IntoIter<Box<dyn SharedManaged>>,
}

impl Arguments {
    pub(crate) fn new(values: Vec<Box<dyn SharedManaged>>) -> Self {
        Self {
            values: values.into_iter(),
        }
    }

    fn take<D>(&mut self) -> Arc<D>
    where
        D: ?Sized + Send + Sync + 'static,
    {
        let Some(value) = self.values.next() else {
            unreachable!("an argument should be supplied for each parameter")
        };
        match value.downcast::<Arc<D>>() {
            Ok(value) => *value,
            Err(_) => unreachable!("the argument should be coerced to `Arc<D>` before construction"),
        }
    }
}

impl<F, T, E> Constructor<()> for F
where
    F: Fn() -> Result<T, E> + Send + Sync + 'static,
    T: Managed,
    E: Into<Box<dyn Error + Send + Sync>>,
{
    type Constructed = T;

    type Error = E;

    fn parameters() -> Vec<TypeInfo> {
        Vec::new()
    }

    fn construct(&self, _arguments: Arguments) -> Result<Self::Constructed, Self::Error> {
        self()
    }
}

macro_rules! for_all_tuples {
    ($implementation:ident) => {
        $implementation!(D1);
        $implementation!(D1, D2);
        $implementation!(D1, D2, D3);
        $implementation!(D1, D2, D3, D4);
        $implementation!(D1, D2, D3, D4, D5);
        $implementation!(D1, D2, D3, D4, D5, D6);
        $implementation!(D1, D2, D3, D4, D5, D6, D7);
        $implementation!(D1, D2, D3, D4, D5, D6, D7, D8);
        $implementation!(D1, D2, D3, D4, D5, D6, D7, D8, D9);
        $implementation!(D1, D2, D3, D4, D5, D6, D7, D8, D9, D10);
        $implementation!(D1, D2, D3, D4, D5, D6, D7, D8, D9, D10, D11);
        $implementation!(D1, D2, D3, D4, D5, D6, D7, D8, D9, D10, D11, D12);
    };
}

macro_rules! impl_constructor {
    ($($dep:ident),*) => {
        #[allow(non_snake_case)]
        impl<F, T, E, $($dep,)*> Constructor<($(Arc<$dep>,)*)> for F
        where
            F: Fn($(Arc<$dep>,)*) -> Result<T, E> + Send + Sync + 'static,
            T: Managed,
            E: Into<Box<dyn Error + Send + Sync>>,
            $($dep: ?Sized + Send + Sync + 'static,)*
        {
            type Constructed = T;

            type Error = E;

            fn parameters() -> Vec<TypeInfo> {
                vec![$(TypeInfo::of::<$dep>(),)*]
            }

            fn construct(&self, mut arguments: Arguments) -> Result<Self::Constructed, Self::Error> {
                $(
                    let $dep = arguments.take::<$dep>();
                )*
                self($($dep,)*)
            }
        }
    };
}

for_all_tuples!(impl_constructor);

/// The object-safe face of a [`Constructor`], with its signature computed
/// once.
pub(crate) trait DynConstructor: Send + Sync + 'static {
    fn parameters(&self) -> &[TypeInfo];

    fn output(&self) -> TypeInfo;

    fn dyn_construct(
        &self,
        arguments: Arguments,
    ) -> Result<Box<dyn SharedManaged>, Arc<dyn Error + Send + Sync>>;
}

pub(crate) struct ConstructorWrapper<C, D>
where
    C: Constructor<D>,
    D: 'static,
{
    constructor: C,
    parameters: Vec<TypeInfo>,
    _marker: PhantomData<fn() -> D>,
}

impl<C, D> ConstructorWrapper<C, D>
where
    C: Constructor<D>,
    D: 'static,
{
    pub fn new(constructor: C) -> Self {
        Self {
            constructor,
            parameters: C::parameters(),
            _marker: PhantomData,
        }
    }
}

impl<C, D> DynConstructor for ConstructorWrapper<C, D>
where
    C: Constructor<D>,
    D: 'static,
{
    fn parameters(&self) -> &[TypeInfo] {
        &self.parameters
    }

    fn output(&self) -> TypeInfo {
        TypeInfo::of::<C::Constructed>()
    }

    fn dyn_construct(
        &self,
        arguments: Arguments,
    ) -> Result<Box<dyn SharedManaged>, Arc<dyn Error + Send + Sync>> {
        match self.constructor.construct(arguments) {
            Ok(value) => Ok(Box::new(Arc::new(value))),
            Err(err) => {
                let source: Box<dyn Error + Send + Sync> = err.into();
                Err(Arc::from(source))
            }
        }
    }
}

/// Displays a constructor as a function pointer type.
pub(crate) struct Signature<'a> {
    parameters: &'a [TypeInfo],
    output: TypeInfo,
}

impl<'a> Signature<'a> {
    pub fn new(parameters: &'a [TypeInfo], output: TypeInfo) -> Self {
        Self { parameters, output }
    }
}

impl Display for Signature<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("fn(")?;
        for (i, parameter) in self.parameters.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "Arc<{parameter}>")?;
        }
        write!(f, ") -> {}", self.output)
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::fmt::Debug;

    use super::*;

    fn arguments(values: Vec<Box<dyn SharedManaged>>) -> Arguments {
        Arguments::new(values)
    }

    #[test]
    fn constructor_reports_parameters_in_order() {
        fn parameters_of<C: Constructor<D>, D>(_: &C) -> Vec<TypeInfo> {
            C::parameters()
        }

        let constructor = |_: Arc<u8>, _: Arc<String>, _: Arc<dyn Debug + Send + Sync>| {
            Ok::<_, Infallible>(0i64)
        };

        assert_eq!(
            parameters_of(&constructor),
            vec![
                TypeInfo::of::<u8>(),
                TypeInfo::of::<String>(),
                TypeInfo::of::<dyn Debug + Send + Sync>(),
            ]
        );
    }

    #[test]
    fn constructor_construct_passes_arguments() {
        let constructor = |a: Arc<u8>, b: Arc<String>| Ok::<_, Infallible>(format!("{a}{b}"));
        let res = constructor.construct(arguments(vec![
            Box::new(Arc::new(4u8)),
            Box::new(Arc::new(String::from("2"))),
        ]));
        assert_eq!(res.unwrap(), "42");
    }

    #[test]
    fn constructor_wrapper_erases_value_and_error() {
        let wrapper = ConstructorWrapper::new(|| Err::<u8, _>("boom"));
        assert_eq!(wrapper.output(), TypeInfo::of::<u8>());
        assert!(wrapper.parameters().is_empty());

        let err = wrapper.dyn_construct(arguments(Vec::new())).err().unwrap();
        assert_eq!(err.to_string(), "boom");

        let wrapper = ConstructorWrapper::new(|| Ok::<_, Infallible>(7u8));
        let value = wrapper.dyn_construct(arguments(Vec::new())).ok().unwrap();
        let value = value.downcast::<Arc<u8>>().ok().unwrap();
        assert_eq!(**value, 7);
    }

    #[test]
    fn signature_display_looks_like_a_function_type() {
        let parameters = [TypeInfo::of::<u8>(), TypeInfo::of::<String>()];
        let signature = Signature::new(&parameters, TypeInfo::of::<i64>());
        assert_eq!(
            signature.to_string(),
            "fn(Arc<u8>, Arc<alloc::string::String>) -> i64"
        );
    }
}
