use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::graph::{Managed, SharedManaged};
use crate::types::TypeInfo;

type Upcast = dyn Fn(&dyn SharedManaged) -> Option<Box<dyn SharedManaged>> + Send + Sync;

/// A declaration that a provider's output may be handed out as `Arc<U>`.
#[derive(Clone)]
pub struct Capability {
    target: TypeInfo,
    upcast: Arc<Upcast>,
}

impl Capability {
    pub(crate) fn new<P, U, F>(upcast: F) -> Self
    where
        P: Managed,
        U: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<P>) -> Arc<U> + Send + Sync + 'static,
    {
        Self {
            target: TypeInfo::of::<U>(),
            upcast: Arc::new(move |value: &dyn SharedManaged| {
                let value = value.as_any().downcast_ref::<Arc<P>>()?;
                let upcasted: Box<dyn SharedManaged> = Box::new(upcast(Arc::clone(value)));
                Some(upcasted)
            }),
        }
    }

    pub fn target(&self) -> TypeInfo {
        self.target
    }

    /// Turns a resolved `Arc<P>` into `Arc<U>`, or returns `None` if `value`
    /// isn't an `Arc<P>`.
    pub(crate) fn apply(&self, value: &dyn SharedManaged) -> Option<Box<dyn SharedManaged>> {
        (self.upcast)(value)
    }
}

impl Debug for Capability {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Capability")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::Display;

    use crate::util::any::DowncastRef;

    use super::*;

    #[test]
    fn capability_upcasts_to_trait_object() {
        let capability = Capability::new(|value: Arc<u8>| value as Arc<dyn Display + Send + Sync>);
        assert_eq!(capability.target(), TypeInfo::of::<dyn Display + Send + Sync>());

        let value: Box<dyn SharedManaged> = Box::new(Arc::new(42u8));
        let upcasted = capability.apply(value.as_ref()).unwrap();
        let upcasted = upcasted
            .downcast_ref::<Arc<dyn Display + Send + Sync>>()
            .unwrap();
        assert_eq!(upcasted.to_string(), "42");
    }

    #[test]
    fn capability_rejects_other_values() {
        let capability = Capability::new(|value: Arc<u8>| value as Arc<dyn Display + Send + Sync>);

        let value: Box<dyn SharedManaged> = Box::new(Arc::new(42u16));
        assert!(capability.apply(value.as_ref()).is_none());
    }
}
