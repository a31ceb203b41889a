//! Read side of the ICON JSON-RPC v3 API, spoken through an ethers provider.
//!
//! Only queries live here. Building and signing transactions belongs to the
//! wallet connection, which implements
//! [`TransactionSubmitter`](crate::network::TransactionSubmitter).

use async_trait::async_trait;
use ethers::providers::{Http, JsonRpcClient, Provider};
use ethers::types::U256;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use crate::amount::Amount;
use crate::config::{Config, ContractAddresses};
use crate::currency::CurrencyKey;
use crate::error::NetworkError;
use crate::network::{AccountQueries, GovernanceQueries, StatusSource};
use crate::transaction::TransactionStatus;
use crate::utils::{loop_to_decimal, parse_hex_quantity};
use crate::vote::ProposalInfo;

/// JSON-RPC error codes `icx_getTransactionResult` answers while a transaction
/// is not in a block yet.
const PENDING_ERROR_CODES: &[i64] = &[-31002, -31003, -31004, -32602];

pub struct IconRpc<P = Http> {
    provider: Arc<Provider<P>>,
    contracts: Option<ContractAddresses>,
}

impl IconRpc<Http> {
    pub async fn connect(config: &Config) -> anyhow::Result<Self> {
        let provider = config.get_provider().await?;
        Ok(Self::new(provider, config.contracts.clone()))
    }
}

impl<P: JsonRpcClient + 'static> IconRpc<P> {
    pub fn new(provider: Arc<Provider<P>>, contracts: Option<ContractAddresses>) -> Self {
        Self { provider, contracts }
    }

    fn contracts(&self) -> Result<&ContractAddresses, NetworkError> {
        self.contracts.as_ref().ok_or_else(|| {
            NetworkError::MalformedResponse("no contract addresses for this network".into())
        })
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, NetworkError> {
        debug!("{} {}", method, params);
        let result: Value = self.provider.request(method, params).await?;
        Ok(result)
    }

    /// Read-only call into a score.
    async fn score_call(
        &self,
        to: &str,
        method: &str,
        params: Value,
    ) -> Result<Value, NetworkError> {
        self.request(
            "icx_call",
            json!({
                "to": to,
                "dataType": "call",
                "data": { "method": method, "params": params },
            }),
        )
        .await
    }
}

fn as_str<'a>(value: &'a Value, what: &str) -> Result<&'a str, NetworkError> {
    value.as_str().ok_or_else(|| {
        NetworkError::MalformedResponse(format!("{} is not a string: {}", what, value))
    })
}

fn hex_quantity(value: &Value, what: &str) -> Result<U256, NetworkError> {
    parse_hex_quantity(as_str(value, what)?)
        .map_err(|e| NetworkError::MalformedResponse(format!("{}: {}", what, e)))
}

fn hex_u64(value: &Value, what: &str) -> Result<u64, NetworkError> {
    let quantity = hex_quantity(value, what)?;
    if quantity > U256::from(u64::MAX) {
        return Err(NetworkError::MalformedResponse(format!("{} out of range", what)));
    }
    Ok(quantity.as_u64())
}

fn loop_decimal(value: &Value, what: &str) -> Result<Decimal, NetworkError> {
    loop_to_decimal(hex_quantity(value, what)?)
        .map_err(|e| NetworkError::MalformedResponse(format!("{}: {}", what, e)))
}

/// `icx_getBalance` / `balanceOf` answer: a hex loop quantity.
pub fn parse_balance(value: &Value, currency: CurrencyKey) -> Result<Amount, NetworkError> {
    Ok(Amount::new(loop_decimal(value, "balance")?, currency))
}

/// Deposited `collateral` from a `getAccountPositions` answer. An account
/// without a position, or without that asset, has zero deposited.
pub fn parse_collateral(value: &Value, collateral: CurrencyKey) -> Result<Amount, NetworkError> {
    match value.get("assets").and_then(|a| a.get(collateral.symbol())) {
        Some(raw) => Ok(Amount::new(loop_decimal(raw, "collateral")?, collateral)),
        None => Ok(Amount::zero(collateral)),
    }
}

/// Governance `checkVote` answer. Vote shares come as loop fractions of one
/// and are turned into percentages.
pub fn parse_proposal(value: &Value) -> Result<ProposalInfo, NetworkError> {
    let field = |name: &str| {
        value
            .get(name)
            .ok_or_else(|| NetworkError::MalformedResponse(format!("proposal has no {}", name)))
    };
    let text = |name: &str| {
        value
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let percent = |name: &str| -> Result<Decimal, NetworkError> {
        match value.get(name) {
            Some(raw) => Ok((loop_decimal(raw, name)? * Decimal::ONE_HUNDRED).normalize()),
            None => Ok(Decimal::ZERO),
        }
    };
    let count = |name: &str| -> Result<u64, NetworkError> {
        match value.get(name) {
            Some(raw) => hex_u64(raw, name),
            None => Ok(0),
        }
    };

    Ok(ProposalInfo {
        id: hex_u64(field("id")?, "id")?,
        name: as_str(field("name")?, "name")?.to_string(),
        description: text("description"),
        status: text("status"),
        for_percent: percent("for")?,
        against_percent: percent("against")?,
        unique_approve_voters: count("for_voter_count")?,
        unique_reject_voters: count("against_voter_count")?,
        snapshot_day: count("vote snapshot")?,
        start_day: count("start day")?,
        end_day: count("end day")?,
    })
}

/// `icx_getTransactionResult` answer: `status` is `0x1` on success and `0x0`
/// when execution failed.
pub fn parse_transaction_status(value: &Value) -> Result<TransactionStatus, NetworkError> {
    let status = value
        .get("status")
        .ok_or_else(|| NetworkError::MalformedResponse("transaction result has no status".into()))?;
    match as_str(status, "status")? {
        "0x1" => Ok(TransactionStatus::Success),
        "0x0" => Ok(TransactionStatus::Failure),
        other => Err(NetworkError::MalformedResponse(format!("unknown status {}", other))),
    }
}

/// Errors meaning "not in a block yet" turn into `Pending`.
fn pending_or_error(err: NetworkError) -> Result<TransactionStatus, NetworkError> {
    match err {
        NetworkError::Rpc { code, .. } if PENDING_ERROR_CODES.contains(&code) => {
            Ok(TransactionStatus::Pending)
        }
        other => Err(other),
    }
}

#[async_trait]
impl<P: JsonRpcClient + 'static> AccountQueries for IconRpc<P> {
    async fn get_balance(
        &self,
        account: &str,
        currency: CurrencyKey,
    ) -> Result<Amount, NetworkError> {
        let value = if currency.is_reserve() {
            self.request("icx_getBalance", json!({ "address": account }))
                .await?
        } else {
            let token = self
                .contracts()?
                .token(currency)
                .map(str::to_string)
                .ok_or_else(|| {
                    NetworkError::MalformedResponse(format!("no score for {}", currency))
                })?;
            self.score_call(&token, "balanceOf", json!({ "_owner": account }))
                .await?
        };
        parse_balance(&value, currency)
    }

    async fn get_collateral_deposit(
        &self,
        account: &str,
        collateral: CurrencyKey,
    ) -> Result<Amount, NetworkError> {
        let loans = self.contracts()?.loans.clone();
        let value = self
            .score_call(&loans, "getAccountPositions", json!({ "_owner": account }))
            .await?;
        parse_collateral(&value, collateral)
    }
}

#[async_trait]
impl<P: JsonRpcClient + 'static> GovernanceQueries for IconRpc<P> {
    async fn get_proposal(&self, id: u64) -> Result<ProposalInfo, NetworkError> {
        let governance = self.contracts()?.governance.clone();
        let value = self
            .score_call(&governance, "checkVote", json!({ "_vote_index": format!("{:#x}", id) }))
            .await?;
        parse_proposal(&value)
    }
}

#[async_trait]
impl<P: JsonRpcClient + 'static> StatusSource for IconRpc<P> {
    async fn poll_status(&self, hash: &str) -> Result<TransactionStatus, NetworkError> {
        match self
            .request("icx_getTransactionResult", json!({ "txHash": hash }))
            .await
        {
            Ok(value) => parse_transaction_status(&value),
            Err(e) => pending_or_error(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::providers::{JsonRpcError, MockProvider, MockResponse};
    use rust_decimal_macros::dec;

    const ACCOUNT: &str = "hx0000000000000000000000000000000000000001";

    fn mocked() -> (IconRpc<MockProvider>, MockProvider) {
        let (provider, mock) = Provider::mocked();
        (IconRpc::new(Arc::new(provider), Some(ContractAddresses::mainnet())), mock)
    }

    // ===== parsing tests =====

    #[test]
    fn test_parse_balance() {
        // 1.5 * 10^18
        let amount = parse_balance(&json!("0x14d1120d7b160000"), CurrencyKey::Icx).unwrap();
        assert_eq!(amount.value, dec!(1.5));
        assert!(parse_balance(&json!(15), CurrencyKey::Icx).is_err());
        assert!(parse_balance(&json!("15"), CurrencyKey::Icx).is_err());
    }

    #[test]
    fn test_parse_collateral() {
        let positions = json!({ "assets": { "sICX": "0xde0b6b3a7640000" } });
        assert_eq!(parse_collateral(&positions, CurrencyKey::Sicx).unwrap().value, dec!(1));
        assert!(parse_collateral(&positions, CurrencyKey::Baln).unwrap().is_zero());
        assert!(parse_collateral(&json!({}), CurrencyKey::Sicx).unwrap().is_zero());
    }

    #[test]
    fn test_parse_proposal() {
        let raw = json!({
            "id": "0x3",
            "name": "Raise debt ceiling",
            "description": "More bnUSD",
            "status": "Active",
            "for": "0x5c2604d1dc98000",
            "against": "0x0",
            "for_voter_count": "0xa",
            "against_voter_count": "0x2",
            "vote snapshot": "0x64",
            "start day": "0x65",
            "end day": "0x6a"
        });
        let proposal = parse_proposal(&raw).unwrap();
        assert_eq!(proposal.id, 3);
        assert_eq!(proposal.for_percent, dec!(41.5));
        assert_eq!(proposal.against_percent, Decimal::ZERO);
        assert_eq!(proposal.voter_count(), 12);
        assert_eq!(proposal.snapshot_day, 100);
        assert_eq!(proposal.end_day, 106);
        assert!(proposal.is_active());
    }

    #[test]
    fn test_parse_proposal_requires_id_and_name() {
        assert!(parse_proposal(&json!({ "name": "x" })).is_err());
        assert!(parse_proposal(&json!({ "id": "0x1" })).is_err());
    }

    #[test]
    fn test_parse_transaction_status() {
        assert_eq!(
            parse_transaction_status(&json!({ "status": "0x1" })).unwrap(),
            TransactionStatus::Success
        );
        assert_eq!(
            parse_transaction_status(&json!({ "status": "0x0", "failure": {} })).unwrap(),
            TransactionStatus::Failure
        );
        assert!(parse_transaction_status(&json!({ "status": "0x2" })).is_err());
        assert!(parse_transaction_status(&json!({})).is_err());
    }

    #[test]
    fn test_pending_error_codes() {
        for code in PENDING_ERROR_CODES {
            let err = NetworkError::Rpc { code: *code, message: "Pending".into() };
            assert_eq!(pending_or_error(err).unwrap(), TransactionStatus::Pending);
        }
        let err = NetworkError::Rpc { code: -32000, message: "Server error".into() };
        assert!(pending_or_error(err).is_err());
    }

    // ===== provider tests =====

    #[tokio::test]
    async fn test_icx_balance_uses_get_balance() {
        let (rpc, mock) = mocked();
        mock.push::<Value, _>(json!("0x1bc16d674ec80000")).unwrap();

        let amount = rpc.get_balance(ACCOUNT, CurrencyKey::Icx).await.unwrap();
        assert_eq!(amount.value, dec!(2));
        mock.assert_request("icx_getBalance", json!({ "address": ACCOUNT }))
            .unwrap();
    }

    #[tokio::test]
    async fn test_token_balance_calls_balance_of() {
        let (rpc, mock) = mocked();
        mock.push::<Value, _>(json!("0x0")).unwrap();

        let amount = rpc.get_balance(ACCOUNT, CurrencyKey::BnUsd).await.unwrap();
        assert!(amount.is_zero());
        mock.assert_request(
            "icx_call",
            json!({
                "to": ContractAddresses::mainnet().bnusd,
                "dataType": "call",
                "data": { "method": "balanceOf", "params": { "_owner": ACCOUNT } },
            }),
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_poll_status_maps_pending_error() {
        let (rpc, mock) = mocked();
        mock.push_response(MockResponse::Error(JsonRpcError {
            code: -31002,
            message: "Pending".into(),
            data: None,
        }));

        assert_eq!(rpc.poll_status("0xabc").await.unwrap(), TransactionStatus::Pending);
    }

    #[tokio::test]
    async fn test_poll_status_keeps_other_errors() {
        let (rpc, mock) = mocked();
        mock.push_response(MockResponse::Error(JsonRpcError {
            code: -32000,
            message: "Server error".into(),
            data: None,
        }));

        let err = rpc.poll_status("0xabc").await.unwrap_err();
        assert_eq!(err, NetworkError::Rpc { code: -32000, message: "Server error".into() });
    }

    #[tokio::test]
    async fn test_queries_without_contracts_fail() {
        let (provider, _mock) = Provider::mocked();
        let rpc = IconRpc::new(Arc::new(provider), None);
        assert!(rpc.get_balance(ACCOUNT, CurrencyKey::Sicx).await.is_err());
        assert!(rpc.get_proposal(1).await.is_err());
    }
}
