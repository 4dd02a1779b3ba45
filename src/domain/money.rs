//! Limits of the stored money and quantity columns. Amounts are kept as
//! `NUMERIC(12, 2)`, so anything with more than two decimals or above
//! 9 999 999 999.99 cannot be written back unchanged.

use bigdecimal::num_bigint::BigInt;
use bigdecimal::BigDecimal;

use super::errors::DomainError;

/// Largest quantity a single cart or order line may carry.
pub const MAX_QUANTITY: i32 = 10_000;

const MAX_AMOUNT: &str = "9999999999.99";

pub fn max_amount() -> BigDecimal {
    BigDecimal::new(BigInt::from(999_999_999_999_i64), 2)
}

/// Whether `value` fits a money column without being rounded or overflowing.
pub fn fits(value: &BigDecimal) -> bool {
    value.with_scale(2) == *value && value.abs() <= max_amount()
}

/// Rejects amounts that would be rounded or overflow when stored.
pub fn check_amount(field: &str, value: &BigDecimal) -> Result<(), DomainError> {
    if value.with_scale(2) != *value {
        return Err(DomainError::InvalidInput(format!(
            "{field} must have at most two decimal places"
        )));
    }
    if value.abs() > max_amount() {
        return Err(DomainError::InvalidInput(format!(
            "{field} must not exceed {MAX_AMOUNT}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::coupon::tests::dec;

    #[test]
    fn cents_and_whole_amounts_fit() {
        for raw in ["0", "7.5", "7.50", "9999999999.99", "-12.34", "1e3"] {
            assert!(check_amount("value", &dec(raw)).is_ok(), "{raw}");
        }
    }

    #[test]
    fn sub_cent_amounts_are_rejected() {
        for raw in ["7.555", "0.001"] {
            let err = check_amount("value", &dec(raw)).unwrap_err();
            assert!(err.to_string().contains("two decimal places"), "{raw}");
        }
    }

    #[test]
    fn oversized_amounts_are_rejected() {
        for raw in ["10000000000", "1e12", "1e20", "-1e20"] {
            assert!(
                matches!(check_amount("value", &dec(raw)), Err(DomainError::InvalidInput(_))),
                "{raw}"
            );
            assert!(!fits(&dec(raw)));
        }
    }
}
