//! Receipt number allocation
//!
//! `YYYYMMDD-NNNN`, date-scoped, monotonic and gap-free within a day.
//! The increment itself is delegated to the store's transactional
//! counter - the one place true concurrency correctness matters.

use chrono::NaiveDate;
use shared::DomainResult;

use crate::store::ReceiptCounter;
use crate::utils::time::date_key;

/// Format a receipt number from a date key and sequence
pub fn format_receipt_number(date_key: &str, seq: u32) -> String {
    format!("{}-{:04}", date_key, seq)
}

/// Allocate the next receipt number for a business date
pub async fn allocate<C>(counter: &C, date: NaiveDate) -> DomainResult<String>
where
    C: ReceiptCounter + ?Sized,
{
    let key = date_key(date);
    let seq = counter.next_receipt_seq(&key).await?;
    Ok(format_receipt_number(&key, seq))
}
