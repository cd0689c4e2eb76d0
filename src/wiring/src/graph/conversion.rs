use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Error;
use crate::graph::{Managed, SharedManaged};
use crate::types::TypeInfo;

type Convert = dyn Fn(&dyn SharedManaged) -> Option<Box<dyn SharedManaged>> + Send + Sync;

/// Value conversions between distinct types, keyed by `(from, to)`.
pub(super) struct ConversionTable {
    conversions: HashMap<(TypeInfo, TypeInfo), Arc<Convert>>,
}

impl ConversionTable {
    /// Creates a table holding the lossless numeric widenings.
    pub fn new() -> Self {
        let mut table = Self {
            conversions: HashMap::new(),
        };

        macro_rules! widen {
            ($($from:ty => [$($to:ty),*]),* $(,)?) => {
                $($(
                    table.put::<$from, $to, _>(|value| <$to>::from(*value));
                )*)*
            };
        }

        widen! {
            u8 => [u16, u32, u64, u128, usize],
            u16 => [u32, u64, u128, usize],
            u32 => [u64, u128],
            u64 => [u128],
            i8 => [i16, i32, i64, i128, isize],
            i16 => [i32, i64, i128, isize],
            i32 => [i64, i128],
            i64 => [i128],
            f32 => [f64],
        }

        table
    }

    pub fn insert<A, B, F>(&mut self, convert: F) -> Result<(), Error>
    where
        A: Managed,
        B: Managed,
        F: Fn(&A) -> B + Send + Sync + 'static,
    {
        let (from, to) = (TypeInfo::of::<A>(), TypeInfo::of::<B>());
        if self.conversions.contains_key(&(from, to)) {
            return Err(Error::DuplicateConversion { from, to });
        }
        self.put(convert);
        Ok(())
    }

    pub fn contains(&self, from: &TypeInfo, to: &TypeInfo) -> bool {
        self.conversions.contains_key(&(*from, *to))
    }

    /// Converts `value`, an `Arc` of `from`, into a fresh `Arc` of `to`.
    pub fn convert(
        &self,
        value: &dyn SharedManaged,
        from: &TypeInfo,
        to: &TypeInfo,
    ) -> Option<Box<dyn SharedManaged>> {
        let convert = self.conversions.get(&(*from, *to))?;
        convert(value)
    }

    fn put<A, B, F>(&mut self, convert: F)
    where
        A: Managed,
        B: Managed,
        F: Fn(&A) -> B + Send + Sync + 'static,
    {
        let key = (TypeInfo::of::<A>(), TypeInfo::of::<B>());
        let convert = move |value: &dyn SharedManaged| {
            let value = value.as_any().downcast_ref::<Arc<A>>()?;
            let converted: Box<dyn SharedManaged> = Box::new(Arc::new(convert(value)));
            Some(converted)
        };
        self.conversions.insert(key, Arc::new(convert));
    }
}
