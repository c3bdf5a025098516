//! Totals Calculator
//!
//! Pure, deterministic money math. All calculations run on `Decimal`
//! internally and convert back to `f64` for storage/serialization, with
//! 2-decimal half-up rounding.

pub mod calculator;
pub mod money;

pub use calculator::{change_due, compute_totals, discount_amount, item_subtotal, order_total};
pub use money::{money_eq, to_decimal, to_f64};
