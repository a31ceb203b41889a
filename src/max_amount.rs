//! How much of a currency the user may spend.

use rust_decimal::Decimal;

use crate::amount::Amount;
use crate::balances::WalletBalances;
use crate::config::MINIMUM_ICX_AMOUNT_IN_WALLET;
use crate::currency::CurrencyKey;

/// Spendable balance of `currency`, holding back the default ICX reserve.
pub fn available(currency: CurrencyKey, balances: &WalletBalances) -> Amount {
    available_with_reserve(currency, balances, MINIMUM_ICX_AMOUNT_IN_WALLET)
}

/// Spendable balance of `currency`: the reserve currency keeps `reserve` back,
/// other currencies are returned as is. Never negative.
pub fn available_with_reserve(
    currency: CurrencyKey,
    balances: &WalletBalances,
    reserve: Decimal,
) -> Amount {
    let balance = balances.get(currency);
    let spendable = if currency.is_reserve() {
        balance.saturating_sub(reserve)
    } else {
        balance
    };
    Amount::new(spendable.value.max(Decimal::ZERO), currency)
}
