use anyhow::{anyhow, Result};
use ethers::providers::{Http, Provider};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::currency::CurrencyKey;

/// ICX kept in the wallet so the account can always pay transaction fees.
pub const MINIMUM_ICX_AMOUNT_IN_WALLET: Decimal = dec!(2);

/// Default delay between two `icx_getTransactionResult` calls.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Environment variable that overrides the RPC endpoint of the selected network.
pub const RPC_URL_ENV: &str = "BALANCED_RPC_URL";

/// A predefined ICON network with label, network id (nid), default RPC and tracker.
#[derive(Clone, Debug)]
pub struct IconNetwork {
    pub label: &'static str,
    pub nid: u64,
    pub default_rpc: &'static str,
    pub tracker: &'static str,
    pub is_testnet: bool,
}

impl IconNetwork {
    pub const fn new(
        label: &'static str,
        nid: u64,
        default_rpc: &'static str,
        tracker: &'static str,
        is_testnet: bool,
    ) -> Self {
        Self {
            label,
            nid,
            default_rpc,
            tracker,
            is_testnet,
        }
    }
}

pub const NETWORKS: &[IconNetwork] = &[
    IconNetwork::new(
        "Mainnet",
        1,
        "https://ctz.solidwallet.io/api/v3",
        "https://tracker.icon.community",
        false,
    ),
    IconNetwork::new(
        "Lisbon",
        2,
        "https://lisbon.net.solidwallet.io/api/v3",
        "https://tracker.lisbon.icon.community",
        true,
    ),
    IconNetwork::new(
        "Berlin",
        7,
        "https://berlin.net.solidwallet.io/api/v3",
        "https://tracker.berlin.icon.community",
        true,
    ),
    IconNetwork::new(
        "Sejong",
        83,
        "https://sejong.net.solidwallet.io/api/v3",
        "https://sejong.tracker.solidwallet.io",
        true,
    ),
];

pub fn find_network_by_nid(nid: u64) -> Option<&'static IconNetwork> {
    NETWORKS.iter().find(|n| n.nid == nid)
}

/// Full URL to view a transaction on the tracker.
pub fn get_tx_tracker_url(nid: u64, tx_hash: &str) -> Option<String> {
    find_network_by_nid(nid).map(|n| format!("{}/transaction/{}", n.tracker, tx_hash))
}

/// Full URL to view an address on the tracker.
pub fn get_address_tracker_url(nid: u64, address: &str) -> Option<String> {
    find_network_by_nid(nid).map(|n| format!("{}/address/{}", n.tracker, address))
}

/// Score (contract) addresses the wallet talks to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAddresses {
    pub sicx: String,
    pub bnusd: String,
    pub baln: String,
    pub loans: String,
    pub governance: String,
}

impl ContractAddresses {
    pub fn mainnet() -> Self {
        Self {
            sicx: "cx2609b924e33ef00b648a409245c7ea394c467824".to_string(),
            bnusd: "cx88fd7df7ddff82f7cc735c871dc519838cb235bb".to_string(),
            baln: "cxf61cd5a45dc9f91c15aa65831a30a90d59a09619".to_string(),
            loans: "cx66d4d90f5f113eba575bf793570135f9b10cece1".to_string(),
            governance: "cx44250a12074799e26fdeee75648ae47e2cc84219".to_string(),
        }
    }

    /// Token score for a currency; `None` for native ICX.
    pub fn token(&self, currency: CurrencyKey) -> Option<&str> {
        match currency {
            CurrencyKey::Icx => None,
            CurrencyKey::Sicx => Some(&self.sicx),
            CurrencyKey::BnUsd => Some(&self.bnusd),
            CurrencyKey::Baln => Some(&self.baln),
        }
    }
}

pub fn default_contracts(nid: u64) -> Option<ContractAddresses> {
    match nid {
        1 => Some(ContractAddresses::mainnet()),
        _ => None,
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub rpc_url: String,
    pub nid: u64,
    pub contracts: Option<ContractAddresses>,
    pub poll_interval: Duration,
    /// ICX that `available` holds back.
    pub icx_reserve: Decimal,
}

impl Config {
    pub fn new(rpc_url: String, nid: u64) -> Self {
        let rpc_url = env::var(RPC_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(rpc_url);

        Self {
            rpc_url,
            nid,
            contracts: default_contracts(nid),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            icx_reserve: MINIMUM_ICX_AMOUNT_IN_WALLET,
        }
    }

    pub fn from_network(network: &IconNetwork) -> Self {
        Self::new(network.default_rpc.to_string(), network.nid)
    }

    /// Build the effective config from persisted settings.
    pub fn from_settings(settings: &crate::user_settings::UserSettings) -> Self {
        let mut config = match find_network_by_nid(settings.selected_nid) {
            Some(network) => Self::from_network(network),
            None => Self::new(String::new(), settings.selected_nid),
        };
        if let Some(rpc) = settings.get_custom_rpc(settings.selected_nid) {
            if env::var(RPC_URL_ENV).is_err() {
                config.rpc_url = rpc.clone();
            }
        }
        if let Some(contracts) = settings.custom_contracts.get(&settings.selected_nid) {
            config.contracts = Some(contracts.clone());
        }
        config.poll_interval = Duration::from_millis(settings.poll_interval_ms.max(100));
        config.icx_reserve = settings.icx_reserve;
        config
    }

    pub fn network_label(&self) -> &str {
        find_network_by_nid(self.nid)
            .map(|n| n.label)
            .unwrap_or("Unknown")
    }

    pub fn contracts(&self) -> Result<&ContractAddresses> {
        self.contracts
            .as_ref()
            .ok_or_else(|| anyhow!("No contract addresses configured for nid {}", self.nid))
    }

    pub async fn get_provider(&self) -> Result<Arc<Provider<Http>>> {
        let url = Url::parse(&self.rpc_url)?;
        let provider = Provider::<Http>::try_from(url.as_str())?;
        Ok(Arc::new(provider))
    }
}

impl Default for Config {
    fn default() -> Self {
        if let Some(mainnet) = find_network_by_nid(1) {
            Self::from_network(mainnet)
        } else {
            Self::new("https://ctz.solidwallet.io/api/v3".to_string(), 1)
        }
    }
}
