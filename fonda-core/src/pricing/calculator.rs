//! Order totals calculation
//!
//! Formula: `total = max(0, subtotal - discount) + shipping`.
//! Discounts are validated, never silently clamped: a percentage outside
//! [0, 100] or a fixed amount above the subtotal is a validation error.

use rust_decimal::prelude::*;
use shared::models::order::{Discount, OrderItem, OrderItemInput, OrderTotals};
use shared::{DomainError, DomainResult};

use super::money::{require_finite, to_decimal, to_f64, validate_item};

/// Line subtotal = unit_price * quantity
pub fn item_subtotal(unit_price: f64, quantity: i32) -> Decimal {
    to_decimal(unit_price) * Decimal::from(quantity)
}

/// Compute the discount amount for a subtotal
pub fn discount_amount(subtotal: Decimal, discount: &Discount) -> DomainResult<Decimal> {
    match *discount {
        Discount::Percentage(p) => {
            require_finite(p, "discount percentage")?;
            if !(0.0..=100.0).contains(&p) {
                return Err(DomainError::validation(format!(
                    "discount percentage must be between 0 and 100, got {}",
                    p
                )));
            }
            Ok((subtotal * to_decimal(p) / Decimal::ONE_HUNDRED)
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        }
        Discount::FixedAmount(a) => {
            require_finite(a, "discount amount")?;
            let amount = to_decimal(a);
            if amount < Decimal::ZERO {
                return Err(DomainError::validation(format!(
                    "discount amount must be non-negative, got {}",
                    a
                )));
            }
            if amount > subtotal {
                return Err(DomainError::validation(format!(
                    "discount amount {} exceeds subtotal {}",
                    a, subtotal
                )));
            }
            Ok(amount)
        }
    }
}

/// Final total = max(0, subtotal - discount) + shipping
pub fn order_total(subtotal: Decimal, discount: Decimal, shipping: Decimal) -> Decimal {
    (subtotal - discount).max(Decimal::ZERO) + shipping
}

/// Price a full order: validates every line item, computes line totals,
/// the discount, and the final total
pub fn compute_totals(
    items: &[OrderItemInput],
    discount: Option<&Discount>,
    shipping: f64,
) -> DomainResult<(Vec<OrderItem>, OrderTotals)> {
    if items.is_empty() {
        return Err(DomainError::validation("order must contain at least one item"));
    }
    require_finite(shipping, "shipping")?;
    if shipping < 0.0 {
        return Err(DomainError::validation(format!(
            "shipping must be non-negative, got {}",
            shipping
        )));
    }

    let mut subtotal = Decimal::ZERO;
    let mut lines = Vec::with_capacity(items.len());
    for item in items {
        validate_item(item)?;
        let line_total = item_subtotal(item.unit_price, item.quantity);
        subtotal += line_total;
        lines.push(OrderItem {
            product_id: item.product_id.clone(),
            name: item.name.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            customizations: item.customizations.clone(),
            line_total: to_f64(line_total),
        });
    }

    let discount_dec = match discount {
        Some(d) => discount_amount(subtotal, d)?,
        None => Decimal::ZERO,
    };
    let shipping_dec = to_decimal(shipping);
    let total = order_total(subtotal, discount_dec, shipping_dec);

    Ok((
        lines,
        OrderTotals {
            subtotal: to_f64(subtotal),
            discount: to_f64(discount_dec),
            shipping: to_f64(shipping_dec),
            total: to_f64(total),
        },
    ))
}

/// Change due for a cash payment: tendered - total
pub fn change_due(total: f64, tendered: f64) -> DomainResult<f64> {
    require_finite(tendered, "tendered")?;
    let total_dec = to_decimal(total);
    let tendered_dec = to_decimal(tendered);
    if tendered_dec < total_dec {
        return Err(DomainError::validation(format!(
            "tendered {} is less than total {}",
            tendered, total
        )));
    }
    Ok(to_f64(tendered_dec - total_dec))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(product_id: &str, unit_price: f64, quantity: i32) -> OrderItemInput {
        OrderItemInput {
            product_id: product_id.to_string(),
            name: format!("Product {}", product_id),
            quantity,
            unit_price,
            customizations: vec![],
        }
    }

    #[test]
    fn test_item_subtotal() {
        assert_eq!(to_f64(item_subtotal(10.99, 3)), 32.97);
    }

    #[test]
    fn test_percentage_discount() {
        let amount = discount_amount(to_decimal(200.0), &Discount::Percentage(10.0)).unwrap();
        assert_eq!(to_f64(amount), 20.0);
    }

    #[test]
    fn test_percentage_discount_out_of_range() {
        assert!(discount_amount(to_decimal(100.0), &Discount::Percentage(101.0)).is_err());
        assert!(discount_amount(to_decimal(100.0), &Discount::Percentage(-1.0)).is_err());
        // Boundaries are inclusive
        assert!(discount_amount(to_decimal(100.0), &Discount::Percentage(0.0)).is_ok());
        assert!(discount_amount(to_decimal(100.0), &Discount::Percentage(100.0)).is_ok());
    }

    #[test]
    fn test_fixed_discount_capped_at_subtotal() {
        assert!(discount_amount(to_decimal(100.0), &Discount::FixedAmount(100.01)).is_err());
        let amount = discount_amount(to_decimal(100.0), &Discount::FixedAmount(100.0)).unwrap();
        assert_eq!(to_f64(amount), 100.0);
    }

    #[test]
    fn test_fixed_discount_rejects_negative() {
        assert!(discount_amount(to_decimal(100.0), &Discount::FixedAmount(-5.0)).is_err());
    }

    #[test]
    fn test_total_never_negative_before_shipping() {
        let total = order_total(to_decimal(50.0), to_decimal(50.0), to_decimal(30.0));
        assert_eq!(to_f64(total), 30.0);
    }

    #[test]
    fn test_compute_totals_full_order() {
        // subtotal 200, 10% discount, shipping 30 → total 210
        let items = vec![item("p1", 50.0, 2), item("p2", 100.0, 1)];
        let (lines, totals) =
            compute_totals(&items, Some(&Discount::Percentage(10.0)), 30.0).unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].line_total, 100.0);
        assert_eq!(totals.subtotal, 200.0);
        assert_eq!(totals.discount, 20.0);
        assert_eq!(totals.shipping, 30.0);
        assert_eq!(totals.total, 210.0);
    }

    #[test]
    fn test_compute_totals_rejects_empty_order() {
        assert!(compute_totals(&[], None, 0.0).is_err());
    }

    #[test]
    fn test_compute_totals_rejects_bad_quantity() {
        let items = vec![item("p1", 10.0, 0)];
        assert!(compute_totals(&items, None, 0.0).is_err());
    }

    #[test]
    fn test_compute_totals_rejects_negative_shipping() {
        let items = vec![item("p1", 10.0, 1)];
        assert!(compute_totals(&items, None, -5.0).is_err());
    }

    #[test]
    fn test_tricky_percentage_rounding() {
        // 33.33% of 100.00 = 33.33 exactly under half-up rounding
        let amount = discount_amount(to_decimal(100.0), &Discount::Percentage(33.33)).unwrap();
        assert_eq!(to_f64(amount), 33.33);
    }

    #[test]
    fn test_change_due() {
        assert_eq!(change_due(210.0, 250.0).unwrap(), 40.0);
        assert_eq!(change_due(210.0, 210.0).unwrap(), 0.0);
        assert!(change_due(210.0, 200.0).is_err());
    }
}
