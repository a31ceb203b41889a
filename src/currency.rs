//! Currencies the wallet knows how to display and send.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// All ICON-side assets use 18 decimals ("loop" for ICX).
pub const TOKEN_DECIMALS: u32 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CurrencyKey {
    #[serde(rename = "ICX")]
    Icx,
    #[serde(rename = "sICX")]
    Sicx,
    #[serde(rename = "bnUSD")]
    BnUsd,
    #[serde(rename = "BALN")]
    Baln,
}

impl CurrencyKey {
    pub const ALL: [CurrencyKey; 4] = [
        CurrencyKey::Icx,
        CurrencyKey::Sicx,
        CurrencyKey::BnUsd,
        CurrencyKey::Baln,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            CurrencyKey::Icx => "ICX",
            CurrencyKey::Sicx => "sICX",
            CurrencyKey::BnUsd => "bnUSD",
            CurrencyKey::Baln => "BALN",
        }
    }

    /// The network's native gas currency. Its balance must never drop below
    /// the configured reserve.
    pub fn is_reserve(&self) -> bool {
        matches!(self, CurrencyKey::Icx)
    }

    pub fn decimals(&self) -> u32 {
        TOKEN_DECIMALS
    }
}

impl fmt::Display for CurrencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for CurrencyKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CurrencyKey::ALL
            .iter()
            .copied()
            .find(|c| c.symbol().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow::anyhow!("Unknown currency: {}", s))
    }
}
