//! Deposit request being edited

use crate::types::Currency;

/// Transient deposit form: amount text, currency and whether it is open
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DepositForm {
    open: bool,
    amount: String,
    currency: Currency,
}

impl DepositForm {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    /// Close without submitting; the typed amount is kept
    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn set_amount(&mut self, amount: impl Into<String>) {
        self.amount = amount.into();
    }

    pub fn set_currency(&mut self, currency: Currency) {
        self.currency = currency;
    }

    /// After a successful deposit
    pub fn complete(&mut self) {
        self.amount.clear();
        self.open = false;
    }
}
