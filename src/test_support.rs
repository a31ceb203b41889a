//! In-memory network doubles shared by the unit tests.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::amount::Amount;
use crate::currency::CurrencyKey;
use crate::error::NetworkError;
use crate::network::{
    AccountQueries, GovernanceQueries, Refetch, StatusSource, SubmitResponse, TransactionSubmitter,
};
use crate::transaction::TransactionStatus;
use crate::vote::ProposalInfo;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmittedCall {
    Transfer { from: String, to: String, amount: Amount },
    Vote { from: String, proposal: String, approve: bool },
}

#[derive(Default)]
struct MockState {
    balances: HashMap<CurrencyKey, Decimal>,
    deposits: HashMap<CurrencyKey, Decimal>,
    proposals: HashMap<u64, ProposalInfo>,
    statuses: HashMap<String, VecDeque<TransactionStatus>>,
    submit_responses: VecDeque<Result<SubmitResponse, NetworkError>>,
    submitted: Vec<SubmittedCall>,
    failing_polls: usize,
    status_error: Option<NetworkError>,
}

#[derive(Default)]
pub struct MockNetwork {
    state: Mutex<MockState>,
    status_calls: AtomicUsize,
    balance_calls: AtomicUsize,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(&self, currency: CurrencyKey, value: Decimal) {
        self.state.lock().unwrap().balances.insert(currency, value);
    }

    pub fn set_deposit(&self, currency: CurrencyKey, value: Decimal) {
        self.state.lock().unwrap().deposits.insert(currency, value);
    }

    pub fn set_proposal(&self, proposal: ProposalInfo) {
        self.state.lock().unwrap().proposals.insert(proposal.id, proposal);
    }

    /// Every poll of `hash` answers `status`.
    pub fn set_status(&self, hash: &str, status: TransactionStatus) {
        self.set_status_sequence(hash, vec![status]);
    }

    /// Polls of `hash` answer these in order; the last one repeats.
    pub fn set_status_sequence(&self, hash: &str, statuses: Vec<TransactionStatus>) {
        self.state
            .lock()
            .unwrap()
            .statuses
            .insert(hash.to_string(), statuses.into());
    }

    pub fn fail_next_status_polls(&self, count: usize) {
        self.state.lock().unwrap().failing_polls = count;
    }

    /// Every poll fails with `error` from now on.
    pub fn set_status_error(&self, error: NetworkError) {
        self.state.lock().unwrap().status_error = Some(error);
    }

    pub fn push_submit_response(&self, response: Result<SubmitResponse, NetworkError>) {
        self.state.lock().unwrap().submit_responses.push_back(response);
    }

    pub fn submitted(&self) -> Vec<SubmittedCall> {
        self.state.lock().unwrap().submitted.clone()
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn balance_calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }

    fn next_submit_response(&self, call: SubmittedCall) -> Result<SubmitResponse, NetworkError> {
        let mut state = self.state.lock().unwrap();
        state.submitted.push(call);
        state
            .submit_responses
            .pop_front()
            .unwrap_or_else(|| Ok(SubmitResponse::accepted("0xabc")))
    }
}

#[async_trait]
impl AccountQueries for MockNetwork {
    async fn get_balance(
        &self,
        _account: &str,
        currency: CurrencyKey,
    ) -> Result<Amount, NetworkError> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        let value = state.balances.get(&currency).copied().unwrap_or_default();
        Ok(Amount::new(value, currency))
    }

    async fn get_collateral_deposit(
        &self,
        _account: &str,
        collateral: CurrencyKey,
    ) -> Result<Amount, NetworkError> {
        let state = self.state.lock().unwrap();
        let value = state.deposits.get(&collateral).copied().unwrap_or_default();
        Ok(Amount::new(value, collateral))
    }
}

#[async_trait]
impl GovernanceQueries for MockNetwork {
    async fn get_proposal(&self, id: u64) -> Result<ProposalInfo, NetworkError> {
        let state = self.state.lock().unwrap();
        state
            .proposals
            .get(&id)
            .cloned()
            .ok_or_else(|| NetworkError::Rpc {
                code: -32000,
                message: format!("unknown proposal {}", id),
            })
    }
}

#[async_trait]
impl TransactionSubmitter for MockNetwork {
    async fn submit_transfer(
        &self,
        from: &str,
        to: &str,
        amount: &Amount,
    ) -> Result<SubmitResponse, NetworkError> {
        self.next_submit_response(SubmittedCall::Transfer {
            from: from.to_string(),
            to: to.to_string(),
            amount: *amount,
        })
    }

    async fn cast_vote(
        &self,
        from: &str,
        proposal_name: &str,
        approve: bool,
    ) -> Result<SubmitResponse, NetworkError> {
        self.next_submit_response(SubmittedCall::Vote {
            from: from.to_string(),
            proposal: proposal_name.to_string(),
            approve,
        })
    }
}

#[async_trait]
impl StatusSource for MockNetwork {
    async fn poll_status(&self, hash: &str) -> Result<TransactionStatus, NetworkError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if state.failing_polls > 0 {
            state.failing_polls -= 1;
            return Err(NetworkError::Transport("connection reset".into()));
        }
        if let Some(error) = &state.status_error {
            return Err(error.clone());
        }
        let queue = match state.statuses.get_mut(hash) {
            Some(queue) => queue,
            None => return Ok(TransactionStatus::Pending),
        };
        let status = if queue.len() > 1 {
            queue.pop_front().unwrap_or(TransactionStatus::Pending)
        } else {
            queue.front().copied().unwrap_or(TransactionStatus::Pending)
        };
        Ok(status)
    }
}

pub struct CountingRefetch {
    name: String,
    count: AtomicUsize,
    fail: bool,
}

impl CountingRefetch {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            count: AtomicUsize::new(0),
            fail: false,
        }
    }

    pub fn failing(name: &str) -> Self {
        Self {
            fail: true,
            ..Self::new(name)
        }
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Refetch for CountingRefetch {
    fn name(&self) -> &str {
        &self.name
    }

    async fn refetch(&self) -> anyhow::Result<()> {
        self.count.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("{} unavailable", self.name);
        }
        Ok(())
    }
}
