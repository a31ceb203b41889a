//! Collateral panel state.
//!
//! The slider splits the user's total ICX (wallet ICX that may be spent plus
//! the collateral already deposited, valued in ICX) into "deposited" (left) and
//! "remaining in wallet" (right).

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use crate::amount::Amount;
use crate::balances::WalletBalances;
use crate::currency::CurrencyKey;
use crate::dependent_field::{Field, InputState, ParsedAmounts};
use crate::error::NetworkError;
use crate::max_amount::available_with_reserve;
use crate::network::{AccountQueries, Refetch};
use crate::state::StateContainer;

/// Exchange rates the panel needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ratio {
    /// ICX per sICX
    pub sicx_icx_ratio: Decimal,
    /// USD per ICX
    pub icx_usd_ratio: Decimal,
}

impl Default for Ratio {
    fn default() -> Self {
        Self {
            sicx_icx_ratio: Decimal::ONE,
            icx_usd_ratio: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollateralState {
    /// Deposited collateral, in sICX
    pub deposited_amount: Decimal,
    pub collateral_type: CurrencyKey,
    pub input: InputState,
    pub is_adjust: bool,
}

impl Default for CollateralState {
    fn default() -> Self {
        Self {
            deposited_amount: Decimal::ZERO,
            collateral_type: CurrencyKey::Sicx,
            input: InputState::default(),
            is_adjust: false,
        }
    }
}

#[derive(Clone)]
pub struct CollateralPanel {
    state: StateContainer<CollateralState>,
    reserve: Decimal,
}

impl Default for CollateralPanel {
    fn default() -> Self {
        Self::new(crate::config::MINIMUM_ICX_AMOUNT_IN_WALLET)
    }
}

impl CollateralPanel {
    pub fn new(reserve: Decimal) -> Self {
        Self {
            state: StateContainer::default(),
            reserve,
        }
    }

    pub fn state(&self) -> CollateralState {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<CollateralState> {
        self.state.subscribe()
    }

    pub fn change_deposited_amount(&self, deposited_amount: Decimal) {
        self.state.update(|s| s.deposited_amount = deposited_amount);
    }

    pub fn change_collateral_type(&self, collateral_type: CurrencyKey) {
        self.state.update(|s| s.collateral_type = collateral_type);
    }

    pub fn on_field_a_input(&self, value: &str) {
        self.state.update(|s| s.input = InputState::typed(Field::Left, value));
    }

    pub fn on_field_b_input(&self, value: &str) {
        self.state.update(|s| s.input = InputState::typed(Field::Right, value));
    }

    /// Slider drag; `handle` picks which of the slider's values moved.
    pub fn on_slide(&self, values: &[String], handle: usize) {
        let value = values.get(handle).cloned().unwrap_or_default();
        self.state.update(|s| s.input = InputState::slid(Field::Left, value));
    }

    /// Enter adjust mode, or cancel it and drop whatever was typed.
    pub fn on_adjust(&self, is_adjust: bool) {
        self.state.update(|s| {
            s.is_adjust = is_adjust;
            if !is_adjust {
                s.input.reset();
            }
        });
    }

    /// Back to defaults after a successful adjustment.
    pub fn reset_input(&self) {
        self.state.update(|s| {
            s.input.reset();
            s.is_adjust = false;
        });
    }

    /// Wallet ICX that may be moved into collateral.
    pub fn available_amount(&self, balances: &WalletBalances) -> Amount {
        available_with_reserve(CurrencyKey::Icx, balances, self.reserve)
    }

    pub fn deposited_amount_in_icx(&self, ratio: &Ratio) -> Amount {
        let deposited = self.state.with(|s| s.deposited_amount);
        Amount::new(deposited.saturating_mul(ratio.sicx_icx_ratio), CurrencyKey::Icx)
    }

    pub fn total_icx_amount(&self, balances: &WalletBalances, ratio: &Ratio) -> Amount {
        let staked = self.deposited_amount_in_icx(ratio);
        let available = self.available_amount(balances);
        Amount::new(staked.value.saturating_add(available.value), CurrencyKey::Icx)
    }

    pub fn input_amounts(&self, balances: &WalletBalances, ratio: &Ratio) -> ParsedAmounts {
        let total = self.total_icx_amount(balances, ratio);
        self.state.with(|s| s.input.compute(total))
    }

    /// Collateral the user is asking for, in ICX.
    pub fn input_amount(&self, balances: &WalletBalances, ratio: &Ratio) -> Amount {
        self.input_amounts(balances, ratio).left
    }

    pub fn input_amount_in_usd(&self, balances: &WalletBalances, ratio: &Ratio) -> Decimal {
        self.input_amount(balances, ratio)
            .value
            .saturating_mul(ratio.icx_usd_ratio)
    }

    /// ICX to deposit (positive) or withdraw (negative) to reach the input.
    pub fn adjustment(&self, balances: &WalletBalances, ratio: &Ratio) -> Amount {
        let target = self.input_amount(balances, ratio);
        target.saturating_sub(self.deposited_amount_in_icx(ratio).value)
    }

    /// Load the deposited collateral for `account`. Zero when the position
    /// holds none of the current collateral type.
    pub async fn fetch_info(
        &self,
        queries: &dyn AccountQueries,
        account: &str,
    ) -> Result<Amount, NetworkError> {
        let collateral_type = self.state.with(|s| s.collateral_type);
        let deposited = queries.get_collateral_deposit(account, collateral_type).await?;
        info!("Collateral for {}: {}", account, deposited);
        self.change_deposited_amount(deposited.value);
        Ok(deposited)
    }
}

/// Refetch hook reloading the collateral position.
pub struct CollateralRefetch {
    panel: CollateralPanel,
    queries: Arc<dyn AccountQueries>,
    account: String,
}

impl CollateralRefetch {
    pub fn new(
        panel: CollateralPanel,
        queries: Arc<dyn AccountQueries>,
        account: impl Into<String>,
    ) -> Self {
        Self {
            panel,
            queries,
            account: account.into(),
        }
    }
}

#[async_trait]
impl Refetch for CollateralRefetch {
    fn name(&self) -> &str {
        "collateral"
    }

    async fn refetch(&self) -> anyhow::Result<()> {
        self.panel
            .fetch_info(self.queries.as_ref(), &self.account)
            .await?;
        Ok(())
    }
}
