//! Pricing of a stay.

use common::Money;
use rust_decimal::Decimal;

/// Computes the total price of a stay: `daily_rate * pets * days`, rounded
/// to the minor unit of the [`Money`] currency.
///
/// [`None`] is returned on overflow. Non-positive inputs are the caller's
/// responsibility.
#[must_use]
pub fn quote(daily_rate: Money, days: u32, pets: usize) -> Option<Money> {
    let pets = Decimal::from(u64::try_from(pets).ok()?);
    daily_rate
        .checked_mul(pets)?
        .checked_mul(Decimal::from(days))
        .map(Money::round_to_minor_unit)
}

#[cfg(test)]
mod spec {
    use common::{money::Currency, Money};
    use rust_decimal::Decimal;

    use super::quote;

    fn brl(amount: &str) -> Money {
        Money {
            amount: amount.parse::<Decimal>().unwrap(),
            currency: Currency::Brl,
        }
    }

    #[test]
    fn multiplies_rate_by_pets_and_days() {
        assert_eq!(quote(brl("60.00"), 3, 2), Some(brl("360.00")));
        assert_eq!(quote(brl("50"), 3, 2), Some(brl("300")));
        assert_eq!(quote(brl("45.50"), 1, 1), Some(brl("45.50")));
    }

    #[test]
    fn rounds_to_minor_unit() {
        let total = quote(brl("33.335"), 1, 1).unwrap();

        assert_eq!(total.amount, "33.34".parse::<Decimal>().unwrap());
        assert_eq!(total.currency, Currency::Brl);
    }

    #[test]
    fn reports_overflow() {
        let huge = Money {
            amount: Decimal::MAX,
            currency: Currency::Brl,
        };

        assert_eq!(quote(huge, 2, 2), None);
    }
}
