//! Contracts of the network collaborators.
//!
//! The wallet core never signs or serializes transactions itself; it is handed
//! implementations of these traits by whatever wallet connection is active.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::currency::CurrencyKey;
use crate::error::NetworkError;
use crate::transaction::TransactionStatus;
use crate::vote::ProposalInfo;

/// Error body of a rejected submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitErrorBody {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// Raw answer of a submission call: either `{result: hash}` or `{error}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub error: Option<SubmitErrorBody>,
}

impl SubmitResponse {
    pub fn accepted(hash: impl Into<String>) -> Self {
        Self {
            result: Some(hash.into()),
            error: None,
        }
    }

    pub fn rejected(code: i64, message: impl Into<String>) -> Self {
        Self {
            result: None,
            error: Some(SubmitErrorBody {
                code,
                message: message.into(),
            }),
        }
    }

    /// The transaction hash, or why there is none. An empty result counts as a
    /// rejection.
    pub fn into_hash(self) -> Result<String, NetworkError> {
        match self.result {
            Some(hash) if !hash.trim().is_empty() => Ok(hash),
            _ => Err(NetworkError::Rejected(
                self.error
                    .map(|e| format!("{} (code {})", e.message, e.code))
                    .unwrap_or_else(|| "empty result".to_string()),
            )),
        }
    }
}

#[async_trait]
pub trait AccountQueries: Send + Sync {
    async fn get_balance(
        &self,
        account: &str,
        currency: CurrencyKey,
    ) -> Result<Amount, NetworkError>;

    /// Collateral currently deposited in the loans contract.
    async fn get_collateral_deposit(
        &self,
        account: &str,
        collateral: CurrencyKey,
    ) -> Result<Amount, NetworkError>;
}

#[async_trait]
pub trait GovernanceQueries: Send + Sync {
    async fn get_proposal(&self, id: u64) -> Result<ProposalInfo, NetworkError>;
}

#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    async fn submit_transfer(
        &self,
        from: &str,
        to: &str,
        amount: &Amount,
    ) -> Result<SubmitResponse, NetworkError>;

    async fn cast_vote(
        &self,
        from: &str,
        proposal_name: &str,
        approve: bool,
    ) -> Result<SubmitResponse, NetworkError>;
}

#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Current lifecycle state of `hash`. Safe to call repeatedly.
    async fn poll_status(&self, hash: &str) -> Result<TransactionStatus, NetworkError>;
}

/// Something to reload once a transaction has been confirmed.
#[async_trait]
pub trait Refetch: Send + Sync {
    fn name(&self) -> &str;

    async fn refetch(&self) -> anyhow::Result<()>;
}
