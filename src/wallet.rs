//! Wallet balance, top-up, service payment, and paginated history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::{Api, ApiError};
use crate::catalog::Service;

/// Top-up bounds enforced before the request leaves the client.
pub const MIN_TOP_UP: u64 = 10_000;
pub const MAX_TOP_UP: u64 = 1_000_000;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Insufficient balance: have {balance}, need {tariff}")]
    InsufficientBalance { balance: u64, tariff: u64 },
    #[error("Top-up amount must be between {MIN_TOP_UP} and {MAX_TOP_UP}, got {0}")]
    InvalidTopUpAmount(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Topup,
    Payment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub invoice_number: String,
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub description: String,
    pub total_amount: u64,
    pub created_on: DateTime<Utc>,
}

// ============================================================================
// Paginated history
// ============================================================================

/// Accumulated transaction history, loaded one page at a time.
///
/// Page one replaces whatever is held; later pages append. `has_more` stays
/// true exactly until the backend returns a short page.
#[derive(Debug)]
pub struct History {
    page_size: u32,
    pub has_more: bool,
    pub records: Vec<Transaction>,
}

impl History {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size,
            has_more: true,
            records: Vec::new(),
        }
    }

    /// Offset the next page should be requested at.
    pub fn next_offset(&self) -> u32 {
        self.records.len() as u32
    }

    pub fn reset(&mut self) {
        self.records.clear();
        self.has_more = true;
    }

    /// Fold one fetched page into the accumulated list.
    pub fn apply_page(&mut self, offset: u32, page: Vec<Transaction>) {
        self.has_more = page.len() as u32 == self.page_size;
        if offset == 0 {
            self.records = page;
        } else {
            self.records.extend(page);
        }
    }

    /// Fetch and fold the next page. Returns how many records arrived.
    pub async fn load_next(&mut self, api: &Api) -> Result<usize, ApiError> {
        let offset = self.next_offset();
        let page = api.transaction_history(offset, self.page_size).await?;
        let count = page.len();
        self.apply_page(offset, page);
        Ok(count)
    }
}

// ============================================================================
// Wallet
// ============================================================================

/// Client-side view of the account's wallet. The backend is the authority
/// on every amount; this state exists only to drive presentation.
pub struct Wallet {
    pub balance: Option<u64>,
    pub history: History,
}

impl Wallet {
    pub fn new(history_page_size: u32) -> Self {
        Self {
            balance: None,
            history: History::new(history_page_size),
        }
    }

    pub async fn refresh_balance(&mut self, api: &Api) -> Result<u64, ApiError> {
        let balance = api.balance().await?;
        self.balance = Some(balance);
        Ok(balance)
    }

    /// Top up the balance. The backend returns the new total.
    pub async fn top_up(&mut self, api: &Api, amount: u64) -> Result<u64, WalletError> {
        if !(MIN_TOP_UP..=MAX_TOP_UP).contains(&amount) {
            return Err(WalletError::InvalidTopUpAmount(amount));
        }

        let balance = api.top_up(amount).await?;
        self.balance = Some(balance);
        tracing::debug!(amount, balance, "Top-up applied");
        Ok(balance)
    }

    /// Advisory funds check against the last known balance. The backend
    /// re-checks on payment; an unknown balance passes.
    pub fn ensure_funds(&self, tariff: u64) -> Result<(), WalletError> {
        match self.balance {
            Some(balance) if balance < tariff => {
                Err(WalletError::InsufficientBalance { balance, tariff })
            }
            _ => Ok(()),
        }
    }

    /// Pay for a service from the balance.
    ///
    /// The local balance is decremented optimistically; callers that need
    /// the authoritative figure should `refresh_balance` afterwards.
    pub async fn pay(&mut self, api: &Api, service: &Service) -> Result<(), WalletError> {
        self.ensure_funds(service.service_tariff)?;

        api.pay(&service.service_code).await?;
        if let Some(balance) = self.balance {
            self.balance = Some(balance.saturating_sub(service.service_tariff));
        }
        tracing::debug!(
            service_code = %service.service_code,
            tariff = service.service_tariff,
            "Payment accepted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::make_transaction;

    #[test]
    fn test_history_first_page_replaces() {
        let mut history = History::new(5);
        history.apply_page(0, vec![make_transaction("INV-1", 100)]);
        history.apply_page(0, vec![make_transaction("INV-2", 200)]);

        assert_eq!(history.records.len(), 1);
        assert_eq!(history.records[0].invoice_number, "INV-2");
    }

    #[test]
    fn test_history_later_pages_append() {
        let mut history = History::new(2);
        history.apply_page(
            0,
            vec![make_transaction("INV-1", 100), make_transaction("INV-2", 200)],
        );
        assert!(history.has_more);
        assert_eq!(history.next_offset(), 2);

        history.apply_page(2, vec![make_transaction("INV-3", 300)]);
        assert_eq!(history.records.len(), 3);
        // Short page ends pagination
        assert!(!history.has_more);
    }

    #[test]
    fn test_history_full_last_page_keeps_has_more() {
        let mut history = History::new(2);
        history.apply_page(
            0,
            vec![make_transaction("INV-1", 100), make_transaction("INV-2", 200)],
        );
        // A full page cannot distinguish "done" from "more", so has_more
        // stays true until a short page arrives.
        assert!(history.has_more);

        history.apply_page(2, vec![]);
        assert!(!history.has_more);
        assert_eq!(history.records.len(), 2);
    }

    #[test]
    fn test_ensure_funds() {
        let mut wallet = Wallet::new(5);
        // Unknown balance is advisory-pass
        assert!(wallet.ensure_funds(50_000).is_ok());

        wallet.balance = Some(40_000);
        assert!(matches!(
            wallet.ensure_funds(50_000),
            Err(WalletError::InsufficientBalance {
                balance: 40_000,
                tariff: 50_000
            })
        ));
        assert!(wallet.ensure_funds(40_000).is_ok());
    }

    #[test]
    fn test_top_up_bounds() {
        assert!(!(MIN_TOP_UP..=MAX_TOP_UP).contains(&9_999));
        assert!((MIN_TOP_UP..=MAX_TOP_UP).contains(&MIN_TOP_UP));
        assert!(!(MIN_TOP_UP..=MAX_TOP_UP).contains(&1_000_001));
    }
}
