//! Transaction submission and lifecycle tracking.
//!
//! One tracker follows one form's transaction at a time:
//! `None -> Pending -> {Success, Failure}`. A rejected submission leaves the
//! state where it was and hands the error back. When a transaction succeeds,
//! every registered [`Refetch`] hook runs exactly once.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::{oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::error::{NetworkError, ValidationError, WalletError};
use crate::ledger_sign::{LedgerSignFlag, SigningMethod};
use crate::network::{Refetch, StatusSource, SubmitResponse};
use crate::operation_log::OperationLog;
use crate::state::StateContainer;
use crate::transaction::{TransactionStatus, TransactionStore};

/// What observers of a tracker see.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackerState {
    pub status: TransactionStatus,
    pub hash: Option<String>,
    /// Last failure of this flow, kept until the next successful submission.
    pub last_error: Option<WalletError>,
}

struct Inner {
    state: StateContainer<TrackerState>,
    store: TransactionStore,
    status_source: Arc<dyn StatusSource>,
    ledger_flag: LedgerSignFlag,
    refetchers: StdMutex<Vec<Arc<dyn Refetch>>>,
    operation_log: Option<(OperationLog, u64)>,
    poll_lock: Mutex<()>,
    submitting: AtomicBool,
}

/// Marks a submission call as in flight; cleared on drop.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn claim(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Clone)]
pub struct TransactionTracker {
    inner: Arc<Inner>,
}

impl TransactionTracker {
    pub fn new(
        store: TransactionStore,
        status_source: Arc<dyn StatusSource>,
        ledger_flag: LedgerSignFlag,
    ) -> Self {
        Self::build(store, status_source, ledger_flag, None)
    }

    /// Same as [`new`](Self::new), also appending accepted submissions and
    /// settled transactions to `log`.
    pub fn with_operation_log(
        store: TransactionStore,
        status_source: Arc<dyn StatusSource>,
        ledger_flag: LedgerSignFlag,
        log: OperationLog,
        nid: u64,
    ) -> Self {
        Self::build(store, status_source, ledger_flag, Some((log, nid)))
    }

    fn build(
        store: TransactionStore,
        status_source: Arc<dyn StatusSource>,
        ledger_flag: LedgerSignFlag,
        operation_log: Option<(OperationLog, u64)>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: StateContainer::default(),
                store,
                status_source,
                ledger_flag,
                refetchers: StdMutex::new(Vec::new()),
                operation_log,
                poll_lock: Mutex::new(()),
                submitting: AtomicBool::new(false),
            }),
        }
    }

    /// Register something to reload after a successful transaction.
    pub fn add_refetch(&self, refetch: Arc<dyn Refetch>) {
        if let Ok(mut refetchers) = self.inner.refetchers.lock() {
            refetchers.push(refetch);
        }
    }

    pub fn state(&self) -> TrackerState {
        self.inner.state.get()
    }

    pub fn status(&self) -> TransactionStatus {
        self.inner.state.with(|s| s.status)
    }

    pub fn subscribe(&self) -> watch::Receiver<TrackerState> {
        self.inner.state.subscribe()
    }

    pub fn store(&self) -> &TransactionStore {
        &self.inner.store
    }

    pub fn ledger_flag(&self) -> &LedgerSignFlag {
        &self.inner.ledger_flag
    }

    /// Back to `None`, e.g. when the owning view goes away.
    pub fn reset(&self) {
        self.inner.state.set(TrackerState::default());
    }

    /// Run a submission call and start tracking its hash.
    ///
    /// Only one submission runs at a time: a call made while another is in
    /// flight, or while the last one is still `Pending`, is refused.
    ///
    /// The ledger flag is raised for `signing` before `call` is polled and
    /// lowered after it resolved, whatever the outcome. On acceptance the
    /// tracker is `Pending` when this returns, so callers can close their
    /// confirmation modal and clear their inputs right away.
    pub async fn submit<F>(
        &self,
        signing: SigningMethod,
        pending: &str,
        summary: &str,
        call: F,
    ) -> Result<String, WalletError>
    where
        F: Future<Output = Result<SubmitResponse, NetworkError>>,
    {
        let in_flight = match InFlight::claim(&self.inner.submitting) {
            Some(claim) => claim,
            None => return Err(ValidationError::SubmissionInProgress.into()),
        };
        if self.status() == TransactionStatus::Pending {
            return Err(ValidationError::SubmissionInProgress.into());
        }

        let outcome = {
            let _guard = self.inner.ledger_flag.begin(signing);
            call.await
        };

        match outcome.and_then(SubmitResponse::into_hash) {
            Ok(hash) => {
                info!("Transaction accepted: {} ({})", hash, pending);
                self.inner.store.add_transaction(&hash, pending, summary).await;
                self.log_operation("submit", &hash, summary);
                self.inner.state.set(TrackerState {
                    status: TransactionStatus::Pending,
                    hash: Some(hash.clone()),
                    last_error: None,
                });
                drop(in_flight);
                Ok(hash)
            }
            Err(e) => {
                error!("Transaction submission failed: {}", e);
                let err = WalletError::from(e);
                self.inner
                    .state
                    .update(|s| s.last_error = Some(err.clone()));
                Err(err)
            }
        }
    }

    /// Follow a transaction that was submitted elsewhere.
    pub async fn track(&self, hash: &str, pending: &str, summary: &str) {
        self.inner.store.add_transaction(hash, pending, summary).await;
        let status = self
            .inner
            .store
            .status(hash)
            .await
            .unwrap_or(TransactionStatus::Pending);
        self.inner.state.set(TrackerState {
            status,
            hash: Some(hash.to_string()),
            last_error: None,
        });
    }

    /// Ask the network once for the tracked transaction's status.
    ///
    /// Only a `Pending` tracker talks to the network; in any other state the
    /// current status is returned as is, so repeated calls after settlement are
    /// free and never re-run the refetch hooks.
    pub async fn poll(&self) -> Result<TransactionStatus, WalletError> {
        let _lock = self.inner.poll_lock.lock().await;

        let current = self.state();
        let hash = match (current.status, current.hash) {
            (TransactionStatus::Pending, Some(hash)) => hash,
            (status, _) => return Ok(status),
        };

        let status = self.inner.status_source.poll_status(&hash).await?;
        if status.is_terminal() {
            self.settle(&hash, status).await;
        }
        Ok(status)
    }

    async fn settle(&self, hash: &str, status: TransactionStatus) {
        let transitioned = self.inner.store.finalize(hash, status).await;
        if transitioned {
            let summary = self
                .inner
                .store
                .get(hash)
                .await
                .map(|r| r.summary)
                .unwrap_or_default();
            self.log_operation(status.label(), hash, &summary);
        }

        self.inner.state.update(|s| {
            if s.hash.as_deref() == Some(hash) {
                s.status = status;
                if status == TransactionStatus::Failure {
                    s.last_error = Some(NetworkError::ExecutionFailed(hash.to_string()).into());
                }
            }
        });

        match status {
            TransactionStatus::Success => {
                info!("Transaction {} confirmed", hash);
                if transitioned {
                    self.run_refetch().await;
                }
            }
            _ => error!("Transaction {} failed", hash),
        }
    }

    async fn run_refetch(&self) {
        let refetchers: Vec<Arc<dyn Refetch>> = match self.inner.refetchers.lock() {
            Ok(r) => r.clone(),
            Err(_) => return,
        };
        for refetch in refetchers {
            debug!("Refetching {}", refetch.name());
            if let Err(e) = refetch.refetch().await {
                warn!("Refetch of {} failed: {}", refetch.name(), e);
            }
        }
    }

    fn log_operation(&self, operation: &str, hash: &str, summary: &str) {
        if let Some((log, nid)) = &self.inner.operation_log {
            let details = format!("hash={}\nsummary={}", hash, summary);
            if let Err(e) = log.append(operation, *nid, details) {
                warn!("Failed to write operation log: {}", e);
            }
        }
    }

    /// Poll every `interval` in a background task until the transaction settles.
    ///
    /// Polling stops when a terminal state is seen, when a poll fails with a
    /// non-transient error, or when the returned handle is cancelled or dropped.
    /// Transient failures are logged and retried on the next tick.
    pub fn watch(&self, interval: Duration) -> PollHandle {
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
        let tracker = self.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = &mut cancel_rx => {
                        debug!("Status polling cancelled");
                        return PollOutcome::Cancelled;
                    }
                    _ = sleep(interval) => {}
                }

                match tracker.poll().await {
                    Ok(TransactionStatus::Pending) => {}
                    Ok(status) => return PollOutcome::Settled(status),
                    Err(e) => {
                        tracker
                            .inner
                            .state
                            .update(|s| s.last_error = Some(e.clone()));
                        if !e.is_transient() {
                            error!("Status polling stopped: {}", e);
                            return PollOutcome::Failed(e);
                        }
                        warn!("Status poll failed, retrying: {}", e);
                    }
                }
            }
        });

        PollHandle {
            cancel: Some(cancel_tx),
            handle: Some(handle),
        }
    }
}

/// How a background poller ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Settled(TransactionStatus),
    Cancelled,
    /// A poll failed in a way retrying will not fix.
    Failed(WalletError),
}

/// Handle to a background status poller. Dropping it stops the poller.
pub struct PollHandle {
    cancel: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<PollOutcome>>,
}

impl PollHandle {
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }

    /// Stop polling at the next tick.
    pub fn cancel(&mut self) {
        if let Some(tx) = self.cancel.take() {
            let _ = tx.send(());
        }
    }

    /// Wait for the poller to end.
    pub async fn finished(mut self) -> PollOutcome {
        match self.handle.take() {
            Some(handle) => handle.await.unwrap_or(PollOutcome::Cancelled),
            None => PollOutcome::Cancelled,
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
