use std::thread::ThreadId;

use oneshot::Sender;
use parking_lot::Mutex;

use crate::error::Error;
use crate::graph::{SharedManaged, TokenState};
use crate::provider::ProviderCore;
use crate::token::AnyToken;

/// A token bound to its provider, together with the token's resolution
/// state.
pub(super) struct Binding {
    pub token: AnyToken,
    pub provider: ProviderCore,
    pub slot: Mutex<Slot>,
}

impl Binding {
    pub fn new(token: AnyToken, provider: ProviderCore) -> Self {
        Self {
            token,
            provider,
            slot: Mutex::new(Slot::Unresolved),
        }
    }

    pub fn state(&self) -> TokenState {
        match &*self.slot.lock() {
            Slot::Unresolved => TokenState::Unresolved,
            Slot::InFlight(_) => TokenState::InFlight,
            Slot::Resolved(_) => TokenState::Resolved,
            Slot::Failed(_) => TokenState::Failed,
        }
    }
}

pub(super) enum Slot {
    Unresolved,
    InFlight(Construction),
    Resolved(Box<dyn SharedManaged>),
    Failed(Error),
}

/// The bookkeeping of a running constructor.
pub(super) struct Construction {
    owner: ThreadId,
    waiters: Vec<Sender<WaitResponse>>,
}

impl Construction {
    pub fn new(owner: ThreadId) -> Self {
        Self {
            owner,
            waiters: Vec::new(),
        }
    }

    pub fn owner(&self) -> ThreadId {
        self.owner
    }

    pub fn register_waiter(&mut self, sender: Sender<WaitResponse>) {
        self.waiters.push(sender);
    }

    pub fn notify(self, result: &Result<Box<dyn SharedManaged>, Error>) {
        for sender in self.waiters {
            let response = match result {
                Ok(value) => WaitResponse::Resolved(value.dyn_clone()),
                Err(err) => WaitResponse::Failed(err.clone()),
            };
            // A waiter which has gone away doesn't care about the result.
            let _ = sender.send(response);
        }
    }
}

pub(super) enum WaitResponse {
    Resolved(Box<dyn SharedManaged>),
    Failed(Error),
}
