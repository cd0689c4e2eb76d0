use std::collections::HashMap;
use std::thread::ThreadId;

use crate::token::TokenId;

/// The wait-for relation between threads blocked on each other's
/// constructions.
///
/// Every in-flight token has an owner thread, and every blocked thread waits
/// on exactly one token. Following owner and waiting edges from a token must
/// never lead back to the thread about to wait on it.
#[derive(Debug, Default)]
pub(super) struct WaitTable {
    owners: HashMap<TokenId, ThreadId>,
    waiting: HashMap<ThreadId, TokenId>,
}

impl WaitTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, token: TokenId, owner: ThreadId) {
        self.owners.insert(token, owner);
    }

    pub fn finish(&mut self, token: TokenId) {
        self.owners.remove(&token);
    }

    /// Records that `thread` waits on `token`, unless the wait would close a
    /// loop, in which case nothing is recorded and `false` is returned.
    pub fn try_wait(&mut self, thread: ThreadId, token: TokenId) -> bool {
        let mut current = token;
        while let Some(owner) = self.owners.get(&current) {
            if *owner == thread {
                return false;
            }
            match self.waiting.get(owner) {
                Some(next) => current = *next,
                None => break,
            }
        }
        self.waiting.insert(thread, token);
        true
    }

    pub fn stop_waiting(&mut self, thread: ThreadId) {
        self.waiting.remove(&thread);
    }
}
