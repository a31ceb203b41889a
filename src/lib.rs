pub mod amount;
pub mod balances;
pub mod collateral;
pub mod config;
pub mod currency;
pub mod dependent_field;
pub mod error;
pub mod icon_rpc;
pub mod ledger_sign;
pub mod max_amount;
pub mod network;
pub mod operation_log;
pub mod send;
pub mod state;
pub mod tracker;
pub mod transaction;
pub mod user_settings;
pub mod utils;
pub mod vote;

#[cfg(test)]
mod test_support;

pub use amount::Amount;
pub use currency::CurrencyKey;
pub use error::{NetworkError, ValidationError, WalletError};
pub use tracker::{PollHandle, PollOutcome, TrackerState, TransactionTracker};
pub use transaction::TransactionStatus;
