//! Input rules for routing table rows

use crate::domain::filename::CUSTOMER_CODE_LEN;

/// Exactly four ASCII digits
pub fn is_customer_code(value: &str) -> bool {
    value.len() == CUSTOMER_CODE_LEN && value.bytes().all(|b| b.is_ascii_digit())
}

/// Trimmed prefix, or `None` when nothing is left
pub fn normalize_prefix(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
