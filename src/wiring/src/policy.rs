//! Observation hooks for resolution failures.

use crate::error::Error;

/// Observes every failure raised by a [`Graph`] right before it's returned.
///
/// A policy is notified exactly once per failure, at the point where the
/// failure originates. Errors which are merely propagated from a nested
/// resolution, or replayed from a token that already failed, are not reported
/// again. A policy can't recover from or alter the failure.
///
/// Any `Fn(&Error) + Send + Sync + 'static` closure is a policy.
///
/// [`Graph`]: crate::graph::Graph
#[cfg_attr(test, mockall::automock)]
pub trait ErrorPolicy: Send + Sync + 'static {
    fn on_error(&self, error: &Error);
}

impl<F> ErrorPolicy for F
where
    F: Fn(&Error) + Send + Sync + 'static,
{
    fn on_error(&self, error: &Error) {
        self(error)
    }
}

/// The default policy, which logs each failure as a `tracing` error event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPolicy;

impl ErrorPolicy for LogPolicy {
    fn on_error(&self, error: &Error) {
        tracing::error!(kind = ?error.kind(), "{error}");
    }
}

/// A policy which ignores every failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentPolicy;

impl ErrorPolicy for SilentPolicy {
    fn on_error(&self, _error: &Error) {}
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use crate::token;

    use super::*;

    #[test]
    fn closure_policy_observes_errors() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let policy = {
            let seen = Arc::clone(&seen);
            move |error: &Error| seen.lock().push(error.to_string())
        };

        let token = token::mint::<u8>().erase();
        policy.on_error(&Error::NotBound { token });

        assert_eq!(seen.lock().len(), 1);
        assert!(seen.lock()[0].contains("no provider is bound"));
    }

    #[test]
    fn builtin_policies_accept_errors() {
        let token = token::mint::<u8>().erase();
        let error = Error::NotBound { token };

        LogPolicy.on_error(&error);
        SilentPolicy.on_error(&error);
    }
}
