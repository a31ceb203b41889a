//! Decimal amounts tagged with a currency.

use ethers::types::U256;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::currency::CurrencyKey;
use crate::error::WalletError;
use crate::utils;

/// Parse free-form user input as a decimal, reading anything unparsable as zero.
pub fn parse_or_zero(input: &str) -> Decimal {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .unwrap_or(Decimal::ZERO)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Amount {
    pub value: Decimal,
    pub currency: CurrencyKey,
}

impl Amount {
    pub fn new(value: Decimal, currency: CurrencyKey) -> Self {
        Self { value, currency }
    }

    pub fn zero(currency: CurrencyKey) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    /// Lenient parse used for typed input; invalid text becomes zero.
    pub fn parse_or_zero(input: &str, currency: CurrencyKey) -> Self {
        Self::new(parse_or_zero(input), currency)
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.value.is_sign_negative() && !self.value.is_zero()
    }

    /// `self - other`, saturating at the decimal range instead of panicking.
    pub fn saturating_sub(&self, other: Decimal) -> Self {
        Self::new(self.value.saturating_sub(other), self.currency)
    }

    /// Convert to on-chain integer units, truncating anything past the token's
    /// decimals.
    pub fn to_loop(&self) -> Result<U256, WalletError> {
        let truncated = self
            .value
            .round_dp_with_strategy(self.currency.decimals(), RoundingStrategy::ToZero);
        utils::parse_str_to_loop(&truncated.to_string())
            .map_err(|e| WalletError::Conversion(e.to_string()))
    }

    pub fn from_loop(value: U256, currency: CurrencyKey) -> Result<Self, WalletError> {
        utils::loop_to_decimal(value)
            .map(|d| Self::new(d, currency))
            .map_err(|e| WalletError::Conversion(e.to_string()))
    }

    /// Two-decimal grouped rendering, e.g. `1,234.5 sICX`.
    pub fn display(&self) -> String {
        format!("{} {}", utils::format_amount(self.value, 2), self.currency)
    }

    /// Plain decimal notation without grouping, suitable for refilling an input.
    pub fn to_input_string(&self) -> String {
        self.value.normalize().to_string()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value.normalize(), self.currency)
    }
}
