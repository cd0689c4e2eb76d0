use crate::error::Error;
use crate::graph::{Resolver, SharedManaged};
use crate::provider::constructor::{Constructor, ConstructorWrapper, DynConstructor};
use crate::provider::{ProviderCore, Strategy};
use crate::token::AnyToken;

pub(super) fn build<C, D>(constructor: C, arguments: Vec<AnyToken>) -> Result<ProviderCore, Error>
where
    C: Constructor<D>,
    D: 'static,
{
    let constructor = ConstructorWrapper::new(constructor);
    let parameters = constructor.parameters();

    if parameters.len() != arguments.len() {
        return Err(Error::ArityMismatch {
            expected: parameters.len(),
            found: arguments.len(),
        });
    }

    for (index, (token, parameter)) in arguments.iter().zip(parameters).enumerate() {
        if !token.type_info().kind().matches(parameter.kind()) {
            return Err(Error::KindMismatch {
                index,
                token: *token,
                expected: *parameter,
            });
        }
    }

    Ok(ProviderCore::new(
        Box::new(constructor),
        Strategy::Manual { arguments },
    ))
}

pub(super) fn resolve_arguments(
    provider: &ProviderCore,
    arguments: &[AnyToken],
    resolver: &dyn Resolver,
) -> Result<Vec<Box<dyn SharedManaged>>, Error> {
    arguments
        .iter()
        .zip(provider.parameters())
        .enumerate()
        .map(|(index, (token, parameter))| {
            let value = resolver.resolve_token(token)?;
            if token.type_info() == *parameter {
                return Ok(value);
            }
            resolver.coerce(token, value, parameter).ok_or_else(|| {
                resolver.report(Error::Incompatible {
                    index,
                    from: token.type_info(),
                    to: *parameter,
                    provider: provider.to_string(),
                })
            })
        })
        .collect()
}
