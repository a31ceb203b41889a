//! "Please confirm on your device" state.
//!
//! When the connected wallet signs on a hardware Ledger, the flag goes up right
//! before a submission starts and comes down once that submission has settled,
//! whatever the outcome.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use crate::state::StateContainer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SigningMethod {
    /// Browser extension or keystore file; signs without user hardware.
    #[default]
    Keystore,
    /// Hardware Ledger; every transaction needs a physical confirmation.
    Ledger,
}

impl SigningMethod {
    pub fn requires_device_confirmation(&self) -> bool {
        matches!(self, SigningMethod::Ledger)
    }
}

/// Shared "confirm on device" flag. It stays up while at least one Ledger
/// submission is in flight.
#[derive(Clone, Default)]
pub struct LedgerSignFlag {
    state: StateContainer<bool>,
    holders: Arc<Mutex<usize>>,
}

impl LedgerSignFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }

    /// Raise the flag for `method` and return a guard that releases it on drop.
    ///
    /// Hold the guard across the whole submission call. Keystore guards never
    /// touch the flag.
    pub fn begin(&self, method: SigningMethod) -> LedgerSignGuard {
        if !method.requires_device_confirmation() {
            return LedgerSignGuard { flag: None };
        }
        let mut holders = self.holders.lock().unwrap_or_else(|e| e.into_inner());
        *holders += 1;
        tracing::debug!("Waiting for Ledger confirmation ({} pending)", *holders);
        self.state.set(true);
        LedgerSignGuard {
            flag: Some(self.clone()),
        }
    }

    fn release(&self) {
        let mut holders = self.holders.lock().unwrap_or_else(|e| e.into_inner());
        *holders = holders.saturating_sub(1);
        if *holders == 0 {
            self.state.set(false);
        }
    }
}

#[must_use = "the flag is released as soon as the guard is dropped"]
pub struct LedgerSignGuard {
    flag: Option<LedgerSignFlag>,
}

impl Drop for LedgerSignGuard {
    fn drop(&mut self) {
        if let Some(flag) = self.flag.take() {
            flag.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_sets_and_clears() {
        let flag = LedgerSignFlag::new();
        {
            let _guard = flag.begin(SigningMethod::Ledger);
            assert!(flag.is_set());
        }
        assert!(!flag.is_set());
    }

    #[test]
    fn test_keystore_never_sets() {
        let flag = LedgerSignFlag::new();
        let _guard = flag.begin(SigningMethod::Keystore);
        assert!(!flag.is_set());
    }

    #[tokio::test]
    async fn test_cleared_when_future_errors() {
        let flag = LedgerSignFlag::new();
        let result: Result<(), &str> = async {
            let _guard = flag.begin(SigningMethod::Ledger);
            tokio::task::yield_now().await;
            assert!(flag.is_set());
            Err("denied on device")
        }
        .await;
        assert!(result.is_err());
        assert!(!flag.is_set());
    }

    #[test]
    fn test_keystore_guard_leaves_ledger_flag_up() {
        let flag = LedgerSignFlag::new();
        let ledger = flag.begin(SigningMethod::Ledger);
        drop(flag.begin(SigningMethod::Keystore));
        assert!(flag.is_set());
        drop(ledger);
        assert!(!flag.is_set());
    }

    #[test]
    fn test_flag_drops_with_last_ledger_holder() {
        let flag = LedgerSignFlag::new();
        let first = flag.begin(SigningMethod::Ledger);
        let second = flag.clone().begin(SigningMethod::Ledger);
        drop(first);
        assert!(flag.is_set());
        drop(second);
        assert!(!flag.is_set());
    }
}
