use std::mem;
use std::sync::Arc;
use std::thread;

use parking_lot::{Mutex, MutexGuard, RwLock};
use tracing::{debug, trace};

use crate::error::Error;
use crate::graph::binding::{Binding, Construction, Slot, WaitResponse};
use crate::graph::conversion::ConversionTable;
use crate::graph::registry::Registry;
use crate::graph::resolver::{CallContext, ChainResolver};
use crate::graph::wait::WaitTable;
use crate::graph::{Managed, SharedManaged, TokenState};
use crate::policy::ErrorPolicy;
use crate::provider::ProviderCore;
use crate::token::{AnyToken, TokenChain};
use crate::types::TypeInfo;

pub(super) struct GraphCore {
    registry: RwLock<Registry>,
    conversions: RwLock<ConversionTable>,
    waits: Mutex<WaitTable>,
    policy: Box<dyn ErrorPolicy>,
}

impl GraphCore {
    pub fn new(policy: Box<dyn ErrorPolicy>) -> Self {
        Self {
            registry: RwLock::new(Registry::new()),
            conversions: RwLock::new(ConversionTable::new()),
            waits: Mutex::new(WaitTable::new()),
            policy,
        }
    }

    pub fn register(&self, token: AnyToken, provider: ProviderCore) -> Result<(), Error> {
        let res = self.registry.write().insert(token, provider);
        match res {
            Ok(()) => {
                debug!(%token, "registered a provider");
                Ok(())
            }
            Err(err) => Err(self.report(err)),
        }
    }

    pub fn register_conversion<A, B, F>(&self, convert: F) -> Result<(), Error>
    where
        A: Managed,
        B: Managed,
        F: Fn(&A) -> B + Send + Sync + 'static,
    {
        let res = self.conversions.write().insert(convert);
        match res {
            Ok(()) => {
                let (from, to) = (TypeInfo::of::<A>(), TypeInfo::of::<B>());
                debug!(%from, %to, "registered a conversion");
                Ok(())
            }
            Err(err) => Err(self.report(err)),
        }
    }

    pub fn state(&self, token: &AnyToken) -> TokenState {
        let binding = self.registry.read().get(token);
        binding.map_or(TokenState::Unregistered, |binding| binding.state())
    }

    pub fn contains(&self, token: &AnyToken) -> bool {
        self.registry.read().get(token).is_some()
    }

    pub fn len(&self) -> usize {
        self.registry.read().len()
    }

    pub fn tokens(&self) -> Vec<AnyToken> {
        self.registry.read().tokens()
    }

    /// Resolves the value bound to `token`, as a dependency of the chain
    /// `previous` if any.
    pub fn resolve(
        &self,
        token: &AnyToken,
        previous: Option<&CallContext<'_>>,
    ) -> Result<Box<dyn SharedManaged>, Error> {
        let binding = self.registry.read().get(token);
        let Some(binding) = binding else {
            return Err(self.report(Error::NotBound { token: *token }));
        };
        let context = CallContext::extend(previous, &binding.token);
        self.get_value(&binding, &context)
    }

    pub fn resolve_by_type(
        &self,
        ty: &TypeInfo,
        previous: Option<&CallContext<'_>>,
    ) -> Result<Vec<Box<dyn SharedManaged>>, Error> {
        let candidates = self
            .registry
            .read()
            .select(|binding| binding.provider.output() == *ty);
        let values = self.resolve_candidates(candidates, previous)?;
        Ok(values.into_iter().map(|(_, value)| value).collect())
    }

    pub fn resolve_by_assignable_type(
        &self,
        ty: &TypeInfo,
        previous: Option<&CallContext<'_>>,
    ) -> Result<Vec<Box<dyn SharedManaged>>, Error> {
        let candidates = self
            .registry
            .read()
            .select(|binding| binding.provider.is_assignable_to(ty));
        let values = self.resolve_candidates(candidates, previous)?;
        Ok(values
            .into_iter()
            .filter_map(|(binding, value)| binding.provider.upcast(&*value, ty))
            .collect())
    }

    pub fn resolve_by_convertible_type(
        &self,
        ty: &TypeInfo,
        previous: Option<&CallContext<'_>>,
    ) -> Result<Vec<Box<dyn SharedManaged>>, Error> {
        let candidates = {
            let conversions = self.conversions.read();
            self.registry
                .read()
                .select(|binding| conversions.contains(&binding.provider.output(), ty))
        };
        let values = self.resolve_candidates(candidates, previous)?;

        let conversions = self.conversions.read();
        Ok(values
            .into_iter()
            .filter_map(|(binding, value)| {
                conversions.convert(&*value, &binding.provider.output(), ty)
            })
            .collect())
    }

    pub fn coerce(
        &self,
        token: &AnyToken,
        value: Box<dyn SharedManaged>,
        target: &TypeInfo,
    ) -> Option<Box<dyn SharedManaged>> {
        if token.type_info() == *target {
            return Some(value);
        }
        let binding = self.registry.read().get(token)?;
        binding.provider.upcast(&*value, target).or_else(|| {
            self.conversions
                .read()
                .convert(&*value, &token.type_info(), target)
        })
    }

    /// Looks for a binding below the head of `context` which produces `ty`,
    /// is assignable to it or converts to it. Type scans skip such bindings,
    /// so a dependency on one can only be a cycle.
    pub fn cycle_through(&self, ty: &TypeInfo, context: &CallContext<'_>) -> Option<TokenChain> {
        let conversions = self.conversions.read();
        let registry = self.registry.read();
        let token = context.ancestors().find(|token| {
            registry.get(token).is_some_and(|binding| {
                binding.provider.is_assignable_to(ty)
                    || conversions.contains(&binding.provider.output(), ty)
            })
        })?;
        Some(context.append(token).cycle())
    }

    pub fn report(&self, error: Error) -> Error {
        self.policy.on_error(&error);
        error
    }

    fn resolve_candidates(
        &self,
        candidates: Vec<Arc<Binding>>,
        previous: Option<&CallContext<'_>>,
    ) -> Result<Vec<(Arc<Binding>, Box<dyn SharedManaged>)>, Error> {
        let mut values = Vec::with_capacity(candidates.len());
        for binding in candidates {
            // A binding on the current chain can't be its own dependency, and
            // a failed one has nothing to offer.
            let on_chain = previous.is_some_and(|context| context.contains(&binding.token));
            if on_chain || binding.state() == TokenState::Failed {
                continue;
            }
            let context = CallContext::extend(previous, &binding.token);
            let value = self.get_value(&binding, &context)?;
            values.push((binding, value));
        }
        Ok(values)
    }

    fn get_value(
        &self,
        binding: &Binding,
        context: &CallContext<'_>,
    ) -> Result<Box<dyn SharedManaged>, Error> {
        let current = thread::current().id();
        loop {
            let mut slot = binding.slot.lock();
            match &mut *slot {
                Slot::Unresolved => return self.construct(binding, context, slot),
                Slot::Resolved(value) => {
                    trace!(token = %binding.token, "returned the cached value");
                    return Ok(value.dyn_clone());
                }
                Slot::Failed(err) => return Err(err.clone()),
                Slot::InFlight(construction) => {
                    let cyclic = context.is_reentrant()
                        || construction.owner() == current
                        || !self.waits.lock().try_wait(current, binding.token.id());
                    if cyclic {
                        drop(slot);
                        return Err(self.report(Error::CyclicDependency {
                            chain: context.cycle(),
                        }));
                    }

                    let (sender, receiver) = oneshot::channel();
                    construction.register_waiter(sender);
                    drop(slot);

                    trace!(token = %binding.token, "waiting for another thread");
                    let response = receiver.recv();
                    self.waits.lock().stop_waiting(current);

                    match response {
                        Ok(WaitResponse::Resolved(value)) => return Ok(value),
                        Ok(WaitResponse::Failed(err)) => return Err(err),
                        // The constructor panicked and the slot is reset.
                        Err(_) => continue,
                    }
                }
            }
        }
    }

    fn construct(
        &self,
        binding: &Binding,
        context: &CallContext<'_>,
        mut slot: MutexGuard<'_, Slot>,
    ) -> Result<Box<dyn SharedManaged>, Error> {
        let current = thread::current().id();
        *slot = Slot::InFlight(Construction::new(current));
        self.waits.lock().start(binding.token.id(), current);
        drop(slot);

        let guard = InFlightGuard::new(self, binding);
        debug!(token = %binding.token, "constructing");
        let res = binding.provider.provide(&ChainResolver::new(self, context));
        guard.complete(&res);

        match &res {
            Ok(_) => debug!(token = %binding.token, "constructed"),
            Err(err) => debug!(token = %binding.token, %err, "failed to construct"),
        }
        res
    }
}

/// Settles an in-flight slot, even if the constructor unwinds.
struct InFlightGuard<'a> {
    core: &'a GraphCore,
    binding: &'a Binding,
    completed: bool,
}

impl<'a> InFlightGuard<'a> {
    fn new(core: &'a GraphCore, binding: &'a Binding) -> Self {
        Self {
            core,
            binding,
            completed: false,
        }
    }

    fn complete(mut self, res: &Result<Box<dyn SharedManaged>, Error>) {
        self.completed = true;
        let state = match res {
            Ok(value) => Slot::Resolved(value.dyn_clone()),
            Err(err) => Slot::Failed(err.clone()),
        };
        if let Some(construction) = self.settle(state) {
            construction.notify(res);
        }
    }

    fn settle(&self, state: Slot) -> Option<Construction> {
        let mut slot = self.binding.slot.lock();
        self.core.waits.lock().finish(self.binding.token.id());
        match mem::replace(&mut *slot, state) {
            Slot::InFlight(construction) => Some(construction),
            _ => None,
        }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.completed {
            // Dropping the construction closes the waiters' channels, so they
            // retry from the reset slot.
            let _ = self.settle(Slot::Unresolved);
        }
    }
}
