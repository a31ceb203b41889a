//! Wallet balances and the store that refreshes them.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use crate::amount::Amount;
use crate::currency::CurrencyKey;
use crate::error::NetworkError;
use crate::network::{AccountQueries, Refetch};
use crate::state::StateContainer;

/// Balance per currency. Currencies never fetched read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletBalances {
    balances: HashMap<CurrencyKey, Decimal>,
}

impl WalletBalances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, currency: CurrencyKey) -> Amount {
        Amount::new(
            self.balances.get(&currency).copied().unwrap_or_default(),
            currency,
        )
    }

    pub fn set(&mut self, amount: Amount) {
        self.balances.insert(amount.currency, amount.value);
    }

    pub fn with(mut self, currency: CurrencyKey, value: Decimal) -> Self {
        self.balances.insert(currency, value);
        self
    }

    pub fn currencies(&self) -> impl Iterator<Item = CurrencyKey> + '_ {
        self.balances.keys().copied()
    }

    /// One line per currency, e.g. `ICX: 1,234.5`.
    pub fn formatted(&self) -> Vec<String> {
        CurrencyKey::ALL
            .iter()
            .filter(|c| self.balances.contains_key(c))
            .map(|c| format!("{}: {}", c, crate::utils::format_amount(self.get(*c).value, 2)))
            .collect()
    }
}

/// Holds the account's balances. [`refresh`](Self::refresh) is the only writer.
#[derive(Clone, Default)]
pub struct BalanceStore {
    state: StateContainer<WalletBalances>,
}

impl BalanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> WalletBalances {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<WalletBalances> {
        self.state.subscribe()
    }

    /// Fetch `currencies` for `account` and publish the new balances.
    ///
    /// Nothing is published if any lookup fails, so observers never see a
    /// half-updated set.
    pub async fn refresh(
        &self,
        queries: &dyn AccountQueries,
        account: &str,
        currencies: &[CurrencyKey],
    ) -> Result<WalletBalances, NetworkError> {
        let mut fetched = Vec::with_capacity(currencies.len());
        for &currency in currencies {
            fetched.push(queries.get_balance(account, currency).await?);
        }

        self.state.update(|balances| {
            for amount in fetched {
                balances.set(amount);
            }
        });
        info!("Refreshed {} balances for {}", currencies.len(), account);
        Ok(self.snapshot())
    }
}

/// Refetch hook reloading balances after a confirmed transaction.
pub struct BalanceRefetch {
    store: BalanceStore,
    queries: Arc<dyn AccountQueries>,
    account: String,
    currencies: Vec<CurrencyKey>,
}

impl BalanceRefetch {
    pub fn new(
        store: BalanceStore,
        queries: Arc<dyn AccountQueries>,
        account: impl Into<String>,
        currencies: Vec<CurrencyKey>,
    ) -> Self {
        Self {
            store,
            queries,
            account: account.into(),
            currencies,
        }
    }
}

#[async_trait]
impl Refetch for BalanceRefetch {
    fn name(&self) -> &str {
        "balances"
    }

    async fn refetch(&self) -> anyhow::Result<()> {
        self.store
            .refresh(self.queries.as_ref(), &self.account, &self.currencies)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockNetwork;
    use rust_decimal_macros::dec;

    #[test]
    fn test_missing_currency_is_zero() {
        let balances = WalletBalances::new();
        assert_eq!(balances.get(CurrencyKey::Baln), Amount::zero(CurrencyKey::Baln));
    }

    #[test]
    fn test_formatted_follows_currency_order() {
        let balances = WalletBalances::new()
            .with(CurrencyKey::BnUsd, dec!(1500.256))
            .with(CurrencyKey::Icx, dec!(3));
        assert_eq!(balances.formatted(), vec!["ICX: 3", "bnUSD: 1,500.26"]);
    }

    #[tokio::test]
    async fn test_refresh_publishes_to_subscribers() {
        let network = MockNetwork::new();
        network.set_balance(CurrencyKey::Icx, dec!(5));
        network.set_balance(CurrencyKey::Sicx, dec!(7));

        let store = BalanceStore::new();
        let mut rx = store.subscribe();
        store
            .refresh(&network, "hx01", &[CurrencyKey::Icx, CurrencyKey::Sicx])
            .await
            .unwrap();

        rx.changed().await.unwrap();
        let seen = rx.borrow().clone();
        assert_eq!(seen.get(CurrencyKey::Icx).value, dec!(5));
        assert_eq!(seen.get(CurrencyKey::Sicx).value, dec!(7));
    }

    #[tokio::test]
    async fn test_refetch_hook_refreshes_store() {
        let network = Arc::new(MockNetwork::new());
        network.set_balance(CurrencyKey::BnUsd, dec!(42));
        let store = BalanceStore::new();
        let hook =
            BalanceRefetch::new(store.clone(), network.clone(), "hx01", vec![CurrencyKey::BnUsd]);

        hook.refetch().await.unwrap();
        assert_eq!(store.snapshot().get(CurrencyKey::BnUsd).value, dec!(42));
        assert_eq!(network.balance_calls(), 1);
        assert_eq!(hook.name(), "balances");
    }
}
