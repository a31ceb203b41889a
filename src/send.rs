//! "Send {currency}" panel: amount and address inputs, max button, confirmation
//! modal, and the transfer submission.

use rust_decimal::Decimal;

use crate::amount::Amount;
use crate::balances::WalletBalances;
use crate::currency::CurrencyKey;
use crate::error::{ValidationError, WalletError};
use crate::ledger_sign::SigningMethod;
use crate::max_amount::available_with_reserve;
use crate::network::TransactionSubmitter;
use crate::tracker::TransactionTracker;
use crate::utils::{format_amount, is_valid_address};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendForm {
    pub currency: CurrencyKey,
    pub value: String,
    pub address: String,
    pub modal_open: bool,
    reserve: Decimal,
}

impl SendForm {
    pub fn new(currency: CurrencyKey) -> Self {
        Self::with_reserve(currency, crate::config::MINIMUM_ICX_AMOUNT_IN_WALLET)
    }

    pub fn with_reserve(currency: CurrencyKey, reserve: Decimal) -> Self {
        Self {
            currency,
            value: String::new(),
            address: String::new(),
            modal_open: false,
            reserve,
        }
    }

    pub fn handle_currency_input(&mut self, value: &str) {
        self.value = value.to_string();
    }

    pub fn handle_address_input(&mut self, value: &str) {
        self.address = value.to_string();
    }

    pub fn max_amount(&self, balances: &WalletBalances) -> Amount {
        available_with_reserve(self.currency, balances, self.reserve)
    }

    /// Fill the amount input with everything that can be sent.
    pub fn handle_max(&mut self, balances: &WalletBalances) {
        self.value = self.max_amount(balances).to_input_string();
    }

    pub fn toggle_open(&mut self) {
        self.modal_open = !self.modal_open;
    }

    /// The typed amount; zero while the input is not a number.
    pub fn difference_amount(&self) -> Amount {
        Amount::parse_or_zero(&self.value, self.currency)
    }

    pub fn before_amount(&self, balances: &WalletBalances) -> Amount {
        balances.get(self.currency)
    }

    pub fn after_amount(&self, balances: &WalletBalances) -> Amount {
        self.before_amount(balances)
            .saturating_sub(self.difference_amount().value)
    }

    pub fn validate(&self, balances: &WalletBalances) -> Result<Amount, ValidationError> {
        if !is_valid_address(&self.address) {
            return Err(ValidationError::InvalidAddress(self.address.clone()));
        }
        let amount = self.difference_amount();
        if amount.is_negative() || amount.is_zero() {
            return Err(ValidationError::NonPositiveAmount);
        }
        let max = self.max_amount(balances);
        if amount.value > max.value {
            return Err(ValidationError::ExceedsAvailable {
                requested: amount.value,
                available: max.value,
            });
        }
        Ok(amount)
    }

    pub fn is_disabled(&self, balances: &WalletBalances) -> bool {
        self.validate(balances).is_err()
    }

    pub fn pending_message(&self) -> String {
        format!("Sending {}...", self.currency)
    }

    pub fn summary_message(&self) -> String {
        format!(
            "Sent {} {} to {}.",
            format_amount(self.difference_amount().value, 2),
            self.currency,
            self.address
        )
    }

    /// Validate, submit the transfer, and on acceptance close the modal and
    /// clear the inputs without waiting for the block.
    ///
    /// On any error the form is left as it was so the user can retry.
    pub async fn send(
        &mut self,
        account: &str,
        balances: &WalletBalances,
        submitter: &dyn TransactionSubmitter,
        tracker: &TransactionTracker,
        signing: SigningMethod,
    ) -> Result<String, WalletError> {
        let amount = self.validate(balances)?;
        let to = self.address.clone();
        let pending = self.pending_message();
        let summary = self.summary_message();

        let hash = tracker
            .submit(signing, &pending, &summary, submitter.submit_transfer(account, &to, &amount))
            .await?;

        self.modal_open = false;
        self.value.clear();
        self.address.clear();
        Ok(hash)
    }
}
