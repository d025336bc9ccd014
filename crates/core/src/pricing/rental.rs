//! Rental period pricing.
//!
//! A rental covers every calendar day from start to end inclusive. The unit
//! price depends on the length:
//!
//! - 1 day: daily rate
//! - 2 or 3 days: weekend rate
//! - 7 days or more: weekly rate per started week
//! - 4 to 6 days: daily rate per day

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::PricingError;
use crate::types::round_money;

/// A product's rental rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RentalRates {
    pub price_per_day: Decimal,
    pub price_per_weekend: Decimal,
    pub price_per_week: Decimal,
}

/// Number of days billed, both ends included.
///
/// # Errors
///
/// Returns `PricingError::InvalidDates` when `end` is before `start`.
pub fn rental_days(start: NaiveDate, end: NaiveDate) -> Result<i64, PricingError> {
    if end < start {
        return Err(PricingError::InvalidDates { start, end });
    }
    Ok((end - start).num_days() + 1)
}

/// Price of one unit for the whole period.
///
/// # Errors
///
/// Returns `PricingError::InvalidDates` when `end` is before `start`.
pub fn unit_price(
    rates: &RentalRates,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Decimal, PricingError> {
    let days = rental_days(start, end)?;
    let price = match days {
        1 => rates.price_per_day,
        2 | 3 => rates.price_per_weekend,
        d if d >= 7 => rates.price_per_week * Decimal::from((d + 6) / 7),
        d => rates.price_per_day * Decimal::from(d),
    };
    Ok(round_money(price))
}

/// Unit price × quantity.
///
/// # Errors
///
/// Returns `PricingError::InvalidDates` for reversed dates and
/// `PricingError::InvalidQuantity` when `quantity` is below 1.
pub fn line_total(
    rates: &RentalRates,
    start: NaiveDate,
    end: NaiveDate,
    quantity: i32,
) -> Result<Decimal, PricingError> {
    if quantity < 1 {
        return Err(PricingError::InvalidQuantity(quantity));
    }
    let unit = unit_price(rates, start, end)?;
    Ok(round_money(unit * Decimal::from(quantity)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn rates() -> RentalRates {
        RentalRates {
            price_per_day: dec("20"),
            price_per_weekend: dec("35"),
            price_per_week: dec("100"),
        }
    }

    #[test]
    fn single_day_counts_as_one() {
        assert_eq!(rental_days(day(3), day(3)).unwrap(), 1);
        assert_eq!(unit_price(&rates(), day(3), day(3)).unwrap(), dec("20"));
    }

    #[test]
    fn two_and_three_days_use_weekend_rate() {
        assert_eq!(unit_price(&rates(), day(6), day(7)).unwrap(), dec("35"));
        assert_eq!(unit_price(&rates(), day(6), day(8)).unwrap(), dec("35"));
    }

    #[test]
    fn four_to_six_days_use_daily_rate() {
        assert_eq!(unit_price(&rates(), day(1), day(4)).unwrap(), dec("80"));
        assert_eq!(unit_price(&rates(), day(1), day(6)).unwrap(), dec("120"));
    }

    #[test]
    fn weeks_are_rounded_up() {
        assert_eq!(unit_price(&rates(), day(1), day(7)).unwrap(), dec("100"));
        assert_eq!(unit_price(&rates(), day(1), day(8)).unwrap(), dec("200"));
        assert_eq!(unit_price(&rates(), day(1), day(14)).unwrap(), dec("200"));
        assert_eq!(unit_price(&rates(), day(1), day(15)).unwrap(), dec("300"));
    }

    #[test]
    fn line_total_multiplies_quantity() {
        assert_eq!(line_total(&rates(), day(6), day(7), 3).unwrap(), dec("105"));
        assert_eq!(
            line_total(&rates(), day(6), day(7), 0).unwrap_err(),
            PricingError::InvalidQuantity(0)
        );
    }

    #[test]
    fn reversed_dates_are_rejected() {
        let err = unit_price(&rates(), day(9), day(2)).unwrap_err();
        assert_eq!(
            err,
            PricingError::InvalidDates {
                start: day(9),
                end: day(2)
            }
        );
    }
}
