//! Process-wide observable identity state.
//!
//! A single writer (the session controller) publishes snapshots over a
//! watch channel; any number of readers - route guards, UI surfaces -
//! subscribe and re-render on change.

use tokio::sync::watch;

use crate::claims::Identity;

/// What readers observe: the current identity, if any, and whether the
/// one-time startup pass is still running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentitySnapshot {
    pub identity: Option<Identity>,
    pub initializing: bool,
}

pub struct IdentityState {
    tx: watch::Sender<IdentitySnapshot>,
}

impl IdentityState {
    /// Starts with no identity and `initializing: true`; a guard must not
    /// show protected content until the startup pass flips it to false.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(IdentitySnapshot {
            identity: None,
            initializing: true,
        });
        Self { tx }
    }

    pub fn snapshot(&self) -> IdentitySnapshot {
        self.tx.borrow().clone()
    }

    /// Subscribe to state changes. The receiver yields the current value
    /// immediately and then on every write.
    pub fn subscribe(&self) -> watch::Receiver<IdentitySnapshot> {
        self.tx.subscribe()
    }

    pub fn is_logged_in(&self) -> bool {
        self.tx.borrow().identity.is_some()
    }

    pub(crate) fn set_identity(&self, identity: Identity) {
        self.tx.send_modify(|s| s.identity = Some(identity));
    }

    pub(crate) fn clear(&self) {
        self.tx.send_modify(|s| s.identity = None);
    }

    /// Mark the one-time startup pass as finished. Never reset.
    pub(crate) fn finish_initializing(&self) {
        self.tx.send_modify(|s| s.initializing = false);
    }
}

impl Default for IdentityState {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
