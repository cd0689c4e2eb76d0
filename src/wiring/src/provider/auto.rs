use crate::error::Error;
use crate::graph::{Resolver, SharedManaged};
use crate::provider::constructor::{Constructor, ConstructorWrapper};
use crate::provider::{ProviderCore, Strategy};

pub(super) fn build<C, D>(constructor: C) -> ProviderCore
where
    C: Constructor<D>,
    D: 'static,
{
    ProviderCore::new(Box::new(ConstructorWrapper::new(constructor)), Strategy::Auto)
}

pub(super) fn resolve_arguments(
    provider: &ProviderCore,
    resolver: &dyn Resolver,
) -> Result<Vec<Box<dyn SharedManaged>>, Error> {
    provider
        .parameters()
        .iter()
        .enumerate()
        .map(|(index, ty)| {
            // Stop at the first tier which has any candidate.
            let mut candidates = resolver.resolve_by_type(ty)?;
            if candidates.is_empty() {
                candidates = resolver.resolve_by_assignable_type(ty)?;
            }
            if candidates.is_empty() {
                candidates = resolver.resolve_by_convertible_type(ty)?;
            }

            if candidates.is_empty() {
                if let Some(chain) = resolver.cycle_through(ty) {
                    return Err(resolver.report(Error::CyclicDependency { chain }));
                }
            }

            if candidates.len() > 1 {
                return Err(resolver.report(Error::Ambiguous {
                    index,
                    ty: *ty,
                    count: candidates.len(),
                    provider: provider.to_string(),
                }));
            }
            candidates.pop().ok_or_else(|| {
                resolver.report(Error::NoCandidate {
                    index,
                    ty: *ty,
                    provider: provider.to_string(),
                })
            })
        })
        .collect()
}
