use anyhow::{anyhow, Result};
use ethers::types::U256;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use crate::currency::TOKEN_DECIMALS;

/// Format a loop value (10^-18 units) as a full-precision decimal string.
pub fn format_loop(value: U256) -> String {
    ethers::utils::format_units(value, TOKEN_DECIMALS).unwrap_or_else(|_| "0.0".to_string())
}

/// Parse a decimal string into loop.
///
/// Works on the string directly so no float rounding creeps into the integer
/// amount that ends up on chain.
///
/// # Errors
/// Returns an error for empty, negative or non-numeric input.
pub fn parse_str_to_loop(input: &str) -> Result<U256> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("Amount cannot be empty"));
    }
    if trimmed.starts_with('-') {
        return Err(anyhow!("Amount cannot be negative: {}", trimmed));
    }

    ethers::utils::parse_units(trimmed, TOKEN_DECIMALS)
        .map(|pu| pu.into())
        .map_err(|e| anyhow!("Invalid amount '{}': {}", trimmed, e))
}

/// Convert a loop value into a normalized `Decimal`.
pub fn loop_to_decimal(value: U256) -> Result<Decimal> {
    let text = format_loop(value);
    Decimal::from_str(&text)
        .map(|d| d.normalize())
        .map_err(|e| anyhow!("Loop value {} does not fit a decimal: {}", value, e))
}

/// Parse a `0x`-prefixed hex quantity as returned by ICON JSON-RPC.
pub fn parse_hex_quantity(input: &str) -> Result<U256> {
    let digits = input
        .strip_prefix("0x")
        .ok_or_else(|| anyhow!("Hex quantity without 0x prefix: {}", input))?;
    U256::from_str_radix(digits, 16).map_err(|e| anyhow!("Invalid hex quantity '{}': {}", input, e))
}

/// Render an amount for display: rounded half-up to `dp` places, trailing zeros
/// dropped, integer part grouped with commas.
pub fn format_amount(value: Decimal, dp: u32) -> String {
    let rounded = value
        .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let text = rounded.abs().to_string();
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

/// ICON addresses: `hx` (wallet) or `cx` (contract) followed by 40 hex chars,
/// either all lowercase or all uppercase.
pub fn is_valid_address(address: &str) -> bool {
    let body = match address
        .strip_prefix("hx")
        .or_else(|| address.strip_prefix("cx"))
    {
        Some(body) => body,
        None => return false,
    };
    let single_case = body == body.to_ascii_lowercase() || body == body.to_ascii_uppercase();
    body.len() == 40 && single_case && hex::decode(body).is_ok()
}
