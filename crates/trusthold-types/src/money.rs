//! Monetary rounding and commission helpers.
//!
//! All monetary values are `rust_decimal::Decimal`, rounded to 2 decimal
//! places at the point of persistence and always recomputed from source
//! fields rather than mutated incrementally.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round a monetary amount to 2 decimal places, half away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Platform commission on a gross amount: `round(amount × rate / 100)`.
#[must_use]
pub fn commission_for(amount: Decimal, rate_percent: Decimal) -> Decimal {
    round_money(amount * rate_percent / Decimal::ONE_HUNDRED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_two_places() {
        assert_eq!(round_money(Decimal::new(12345, 3)), Decimal::new(1235, 2)); // 12.345 → 12.35
        assert_eq!(round_money(Decimal::new(12344, 3)), Decimal::new(1234, 2)); // 12.344 → 12.34
    }

    #[test]
    fn half_rounds_away_from_zero() {
        assert_eq!(round_money(Decimal::new(125, 3)), Decimal::new(13, 2)); // 0.125 → 0.13
    }

    #[test]
    fn commission_five_percent() {
        // 5% of 100.00 = 5.00; 5% of 50.00 = 2.50
        assert_eq!(
            commission_for(Decimal::new(10000, 2), Decimal::new(5, 0)),
            Decimal::new(500, 2)
        );
        assert_eq!(
            commission_for(Decimal::new(5000, 2), Decimal::new(5, 0)),
            Decimal::new(250, 2)
        );
    }

    #[test]
    fn commission_rounds_fractions() {
        // 5% of 33.33 = 1.6665 → 1.67
        assert_eq!(
            commission_for(Decimal::new(3333, 2), Decimal::new(5, 0)),
            Decimal::new(167, 2)
        );
    }

    #[test]
    fn zero_amount_zero_commission() {
        assert_eq!(
            commission_for(Decimal::ZERO, Decimal::new(5, 0)),
            Decimal::ZERO
        );
    }
}
