//! Error taxonomy for wallet flows.
//!
//! Parse failures never show up here: typed amounts that do not parse are read as
//! zero. Validation errors stop a flow before it reaches the network, network errors
//! are handed back to whoever started the flow.

use rust_decimal::Decimal;
use thiserror::Error;

/// Why a form cannot be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid address: {0:?}")]
    InvalidAddress(String),
    #[error("amount must be greater than zero")]
    NonPositiveAmount,
    #[error("amount {requested} exceeds available {available}")]
    ExceedsAvailable { requested: Decimal, available: Decimal },
    #[error("a transaction from this form is still pending")]
    SubmissionInProgress,
    #[error("choose approve or reject first")]
    NoVoteSelected,
    #[error("proposal {0} is not loaded")]
    ProposalUnavailable(u64),
}

/// Failures reported by (or while talking to) the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("transaction rejected: {0}")]
    Rejected(String),
    #[error("transaction {0} failed on chain")]
    ExecutionFailed(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl NetworkError {
    /// Transport hiccups are worth another poll; everything else is final.
    pub fn is_transient(&self) -> bool {
        match self {
            NetworkError::Transport(_) => true,
            NetworkError::Rpc { message, .. } => {
                let message = message.to_lowercase();
                message.contains("timeout") || message.contains("rate limit")
            }
            _ => false,
        }
    }
}

impl From<ethers::providers::ProviderError> for NetworkError {
    fn from(err: ethers::providers::ProviderError) -> Self {
        use ethers::providers::RpcError;

        if let Some(resp) = err.as_error_response() {
            return NetworkError::Rpc {
                code: resp.code,
                message: resp.message.clone(),
            };
        }
        if let Some(serde_err) = err.as_serde_error() {
            return NetworkError::MalformedResponse(serde_err.to_string());
        }
        NetworkError::Transport(err.to_string())
    }
}

/// Top-level error surfaced to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error("amount conversion failed: {0}")]
    Conversion(String),
}

impl WalletError {
    pub fn is_transient(&self) -> bool {
        matches!(self, WalletError::Network(e) if e.is_transient())
    }

    /// Text suitable for a toast or inline error label.
    pub fn user_message(&self) -> String {
        match self {
            WalletError::Validation(e) => e.to_string(),
            WalletError::Network(NetworkError::Rejected(reason)) => {
                format!("The network rejected the transaction: {}", reason)
            }
            WalletError::Network(e) if e.is_transient() => {
                format!("Network unavailable, please try again ({})", e)
            }
            WalletError::Network(e) => format!("Transaction failed: {}", e),
            WalletError::Conversion(e) => format!("Invalid amount: {}", e),
        }
    }
}
