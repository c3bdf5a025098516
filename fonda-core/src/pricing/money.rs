//! Money utilities using rust_decimal for precision

use rust_decimal::prelude::*;
use shared::models::order::{OrderItemInput, PaymentInput, PaymentMethod};
use shared::{DomainError, DomainResult};

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Maximum allowed unit price ($1,000,000)
pub(crate) const MAX_PRICE: f64 = 1_000_000.0;
/// Maximum allowed quantity per line item
pub(crate) const MAX_QUANTITY: i32 = 9999;

/// Validate that an f64 value is finite (not NaN, not Infinity)
#[inline]
pub(crate) fn require_finite(value: f64, field_name: &str) -> DomainResult<()> {
    if !value.is_finite() {
        return Err(DomainError::validation(format!(
            "{} must be a finite number, got {}",
            field_name, value
        )));
    }
    Ok(())
}

/// Validate an order line item before pricing
pub fn validate_item(item: &OrderItemInput) -> DomainResult<()> {
    require_finite(item.unit_price, "unit_price")?;
    if item.unit_price < 0.0 {
        return Err(DomainError::validation(format!(
            "unit_price must be non-negative, got {}",
            item.unit_price
        )));
    }
    if item.unit_price > MAX_PRICE {
        return Err(DomainError::validation(format!(
            "unit_price exceeds maximum allowed ({}), got {}",
            MAX_PRICE, item.unit_price
        )));
    }

    if item.quantity <= 0 {
        return Err(DomainError::validation(format!(
            "quantity must be positive, got {}",
            item.quantity
        )));
    }
    if item.quantity > MAX_QUANTITY {
        return Err(DomainError::validation(format!(
            "quantity exceeds maximum allowed ({}), got {}",
            MAX_QUANTITY, item.quantity
        )));
    }

    Ok(())
}

/// Validate a payment input before processing
pub fn validate_payment(payment: &PaymentInput) -> DomainResult<()> {
    if let Some(t) = payment.tendered {
        require_finite(t, "tendered")?;
        if t < 0.0 {
            return Err(DomainError::validation(
                "tendered amount must be non-negative",
            ));
        }
        if payment.method != PaymentMethod::Cash {
            return Err(DomainError::validation(
                "tendered amount only applies to cash payments",
            ));
        }
    }
    Ok(())
}

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Compare two monetary values for equality (within 0.01 tolerance)
pub fn money_eq(a: f64, b: f64) -> bool {
    let diff = (to_decimal(a) - to_decimal(b)).abs();
    diff < MONEY_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(unit_price: f64, quantity: i32) -> OrderItemInput {
        OrderItemInput {
            product_id: "prod-1".to_string(),
            name: "Taco pastor".to_string(),
            quantity,
            unit_price,
            customizations: vec![],
        }
    }

    #[test]
    fn test_to_decimal_precision() {
        // Classic floating point problem: 0.1 + 0.2 != 0.3
        let sum_f64 = 0.1_f64 + 0.2_f64;
        assert_ne!(sum_f64, 0.3);

        let sum_dec = to_decimal(0.1) + to_decimal(0.2);
        assert_eq!(to_f64(sum_dec), 0.3);
    }

    #[test]
    fn test_accumulation_precision() {
        let mut total = Decimal::ZERO;
        for _ in 0..1000 {
            total += to_decimal(0.01);
        }
        assert_eq!(to_f64(total), 10.0);
    }

    #[test]
    fn test_rounding_half_up() {
        let value = Decimal::new(5, 3); // 0.005
        assert_eq!(to_f64(value), 0.01);

        let value2 = Decimal::new(4, 3); // 0.004
        assert_eq!(to_f64(value2), 0.0);
    }

    #[test]
    fn test_to_decimal_nan_becomes_zero() {
        assert_eq!(to_decimal(f64::NAN), Decimal::ZERO);
        assert_eq!(to_decimal(f64::INFINITY), Decimal::ZERO);
    }

    #[test]
    fn test_validate_item_rejects_bad_quantity() {
        assert!(validate_item(&item(10.0, 0)).is_err());
        assert!(validate_item(&item(10.0, -3)).is_err());
        assert!(validate_item(&item(10.0, MAX_QUANTITY + 1)).is_err());
        assert!(validate_item(&item(10.0, 1)).is_ok());
    }

    #[test]
    fn test_validate_item_rejects_bad_price() {
        assert!(validate_item(&item(-1.0, 1)).is_err());
        assert!(validate_item(&item(f64::NAN, 1)).is_err());
        assert!(validate_item(&item(MAX_PRICE + 1.0, 1)).is_err());
    }

    #[test]
    fn test_validate_payment_tendered_rules() {
        let cash = PaymentInput {
            method: PaymentMethod::Cash,
            tendered: Some(200.0),
        };
        assert!(validate_payment(&cash).is_ok());

        let card_with_tendered = PaymentInput {
            method: PaymentMethod::Card,
            tendered: Some(200.0),
        };
        assert!(validate_payment(&card_with_tendered).is_err());

        let negative = PaymentInput {
            method: PaymentMethod::Cash,
            tendered: Some(-1.0),
        };
        assert!(validate_payment(&negative).is_err());
    }

    #[test]
    fn test_money_eq() {
        assert!(money_eq(100.0, 100.0));
        assert!(money_eq(100.004, 100.006));
        assert!(!money_eq(100.0, 100.02));
    }
}
