//! Shared helpers for the crate's `#[cfg(test)]` modules.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;

use crate::wallet::{Transaction, TransactionType};

/// Mint an unsigned three-part token carrying the given subject and expiry.
/// The signature segment is filler; the codec never verifies it.
pub fn mint_token(email: &str, exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        serde_json::json!({ "email": email, "exp": exp })
            .to_string()
            .as_bytes(),
    );
    format!("{header}.{payload}.stub-signature")
}

/// A top-up transaction record with the given invoice number and amount.
pub fn make_transaction(invoice: &str, amount: u64) -> Transaction {
    Transaction {
        invoice_number: invoice.to_string(),
        transaction_type: TransactionType::Topup,
        description: "Top Up balance".to_string(),
        total_amount: amount,
        created_on: Utc::now(),
    }
}
