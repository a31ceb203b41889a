//! Observable state containers.
//!
//! Each slice of wallet state lives in its own container that is handed to the
//! components that need it. Views call [`StateContainer::subscribe`] and get
//! notified on every mutation.

use std::sync::Arc;
use tokio::sync::watch;

pub struct StateContainer<T> {
    tx: Arc<watch::Sender<T>>,
}

impl<T> Clone for StateContainer<T> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<T: Clone> StateContainer<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Snapshot of the current value.
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Read without cloning the whole value.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.tx.borrow())
    }

    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Mutate in place and notify subscribers.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.tx.send_modify(f);
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

impl<T: Clone + Default> Default for StateContainer<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
