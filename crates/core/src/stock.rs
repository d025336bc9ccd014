//! Stock and reservation accounting.
//!
//! A product carries three counters:
//!
//! - `stock`: catalogue stock, adjusted by admins
//! - `real_stock`: units physically owned (falls back to `stock` when unset)
//! - `available_stock`: units not tied up by open orders
//!
//! Date-range availability is computed from reservations (order items of
//! orders that still hold stock) against the physical count, day by day.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{ProductStatus, StockStatus};

/// Bookings starting more than this many days out are accepted without a
/// stock check; there is time to source the equipment.
pub const ADVANCE_BOOKING_DAYS: i64 = 30;

/// Longest range a calendar or availability query may span.
pub const MAX_RANGE_DAYS: i64 = 366;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockError {
    #[error("insufficient stock: {available} available, {requested} requested")]
    Insufficient { available: i32, requested: i32 },

    #[error("quantity must be at least 1 (got {0})")]
    InvalidQuantity(i32),

    #[error("end date {end} is before start date {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("date range spans {days} days (max {MAX_RANGE_DAYS})")]
    RangeTooLong { days: i64 },

    #[error("product needs {lead_time_days} days notice; earliest start is {earliest}")]
    LeadTime {
        lead_time_days: i32,
        earliest: NaiveDate,
    },
}

/// Direction of a manual stock adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockOperation {
    Increase,
    Decrease,
}

/// Stock counters of one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevels {
    pub stock: i32,
    pub real_stock: Option<i32>,
    pub available_stock: i32,
    pub status: ProductStatus,
}

/// One correction made by [`StockLevels::repair`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StockFix {
    /// `real_stock` was null and now mirrors `stock`.
    BackfilledRealStock { real_stock: i32 },
    /// `available_stock` was outside `[0, physical]`.
    ClampedAvailable { from: i32, to: i32 },
}

impl StockLevels {
    /// Units physically owned.
    #[must_use]
    pub fn physical(&self) -> i32 {
        self.real_stock.unwrap_or(self.stock)
    }

    /// Apply a manual increase or decrease.
    ///
    /// Increases also raise `real_stock` when it is set. The status flips to
    /// `OUT_OF_STOCK` at zero available units and back to `AVAILABLE` once
    /// replenished; other statuses are kept.
    ///
    /// # Errors
    ///
    /// `InvalidQuantity` for quantities below 1, `Insufficient` when a
    /// decrease exceeds the available units.
    pub fn adjust(self, operation: StockOperation, quantity: i32) -> Result<Self, StockError> {
        if quantity < 1 {
            return Err(StockError::InvalidQuantity(quantity));
        }

        let mut next = self;
        match operation {
            StockOperation::Increase => {
                next.stock = self.stock.saturating_add(quantity);
                next.available_stock = self.available_stock.saturating_add(quantity);
                next.real_stock = self.real_stock.map(|r| r.saturating_add(quantity));
            }
            StockOperation::Decrease => {
                if self.available_stock < quantity {
                    return Err(StockError::Insufficient {
                        available: self.available_stock,
                        requested: quantity,
                    });
                }
                next.stock = self.stock - quantity;
                next.available_stock = self.available_stock - quantity;
            }
        }

        next.status = if next.available_stock == 0 {
            ProductStatus::OutOfStock
        } else if self.status == ProductStatus::OutOfStock {
            ProductStatus::Available
        } else {
            self.status
        };

        Ok(next)
    }

    /// Reserve units for an order. Same as a decrease of `available_stock`
    /// only; catalogue stock is untouched.
    ///
    /// # Errors
    ///
    /// `Insufficient` when fewer than `quantity` units are available.
    pub fn reserve(self, quantity: i32) -> Result<Self, StockError> {
        if quantity < 1 {
            return Err(StockError::InvalidQuantity(quantity));
        }
        if self.available_stock < quantity {
            return Err(StockError::Insufficient {
                available: self.available_stock,
                requested: quantity,
            });
        }
        let mut next = self;
        next.available_stock -= quantity;
        if next.available_stock == 0 {
            next.status = ProductStatus::OutOfStock;
        }
        Ok(next)
    }

    /// Give back units reserved by a cancelled order, capped at the physical
    /// count.
    #[must_use]
    pub fn release(self, quantity: i32) -> Self {
        let mut next = self;
        next.available_stock = self
            .available_stock
            .saturating_add(quantity.max(0))
            .min(self.physical().max(0));
        if next.available_stock > 0 && self.status == ProductStatus::OutOfStock {
            next.status = ProductStatus::Available;
        }
        next
    }

    /// Violations of the stock conventions, without changing anything.
    #[must_use]
    pub fn problems(&self) -> Vec<StockFix> {
        self.repair().1
    }

    /// Backfill `real_stock` and clamp `available_stock` into
    /// `[0, physical]`.
    #[must_use]
    pub fn repair(&self) -> (Self, Vec<StockFix>) {
        let mut next = *self;
        let mut fixes = Vec::new();

        if next.real_stock.is_none() {
            next.real_stock = Some(next.stock);
            fixes.push(StockFix::BackfilledRealStock {
                real_stock: next.stock,
            });
        }

        let clamped = next.available_stock.clamp(0, next.physical().max(0));
        if clamped != next.available_stock {
            fixes.push(StockFix::ClampedAvailable {
                from: next.available_stock,
                to: clamped,
            });
            next.available_stock = clamped;
        }

        (next, fixes)
    }
}

/// Units held by one order item over an inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub quantity: i32,
}

impl Reservation {
    #[must_use]
    pub fn covers(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    #[must_use]
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start <= end && self.end >= start
    }
}

/// Units reserved on `day`.
#[must_use]
pub fn reserved_on(reservations: &[Reservation], day: NaiveDate) -> i32 {
    reservations
        .iter()
        .filter(|r| r.covers(day))
        .map(|r| r.quantity)
        .sum()
}

/// One day of a product's availability calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub reserved: i32,
    pub available: i32,
}

fn checked_range(start: NaiveDate, end: NaiveDate) -> Result<i64, StockError> {
    if end < start {
        return Err(StockError::InvalidRange { start, end });
    }
    let days = (end - start).num_days() + 1;
    if days > MAX_RANGE_DAYS {
        return Err(StockError::RangeTooLong { days });
    }
    Ok(days)
}

/// Per-day availability from `start` to `end` inclusive.
///
/// # Errors
///
/// `InvalidRange` for reversed dates, `RangeTooLong` past [`MAX_RANGE_DAYS`].
pub fn calendar(
    physical: i32,
    reservations: &[Reservation],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<DayAvailability>, StockError> {
    checked_range(start, end)?;
    Ok(start
        .iter_days()
        .take_while(|day| *day <= end)
        .map(|date| {
            let reserved = reserved_on(reservations, date);
            DayAvailability {
                date,
                reserved,
                available: (physical - reserved).max(0),
            }
        })
        .collect())
}

/// Units free on every day of the range: the minimum over days of
/// `physical - reserved`, never below zero.
///
/// # Errors
///
/// Same as [`calendar`].
pub fn available_for_range(
    physical: i32,
    reservations: &[Reservation],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<i32, StockError> {
    Ok(calendar(physical, reservations, start, end)?
        .iter()
        .map(|d| d.available)
        .min()
        .unwrap_or(0))
}

/// Enforce the notice period of on-demand products.
///
/// # Errors
///
/// `LeadTime` with the earliest acceptable start date.
pub fn check_lead_time(
    stock_status: StockStatus,
    lead_time_days: i32,
    start: NaiveDate,
    today: NaiveDate,
) -> Result<(), StockError> {
    if stock_status != StockStatus::OnDemand || lead_time_days <= 0 {
        return Ok(());
    }
    let earliest = today
        .checked_add_days(Days::new(u64::from(lead_time_days.unsigned_abs())))
        .unwrap_or(NaiveDate::MAX);
    if start < earliest {
        return Err(StockError::LeadTime {
            lead_time_days,
            earliest,
        });
    }
    Ok(())
}

/// Whether a booking starts far enough ahead to skip the stock check.
#[must_use]
pub fn is_advance_booking(start: NaiveDate, today: NaiveDate) -> bool {
    (start - today).num_days() > ADVANCE_BOOKING_DAYS
}

/// Product facts needed to answer an availability query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductAvailability<'a> {
    pub physical: i32,
    pub stock_status: StockStatus,
    pub lead_time_days: i32,
    pub reservations: &'a [Reservation],
}

/// Answer to an availability query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityCheck {
    pub requested: i32,
    /// Minimum free units over the range.
    pub available: i32,
    pub is_available: bool,
    /// Accepted regardless of stock because it starts far ahead.
    pub advance_booking: bool,
}

/// Check whether `quantity` units can be booked from `start` to `end`.
///
/// # Errors
///
/// Range and lead-time errors from [`check_lead_time`] and [`calendar`];
/// `InvalidQuantity` for quantities below 1. An insufficient quantity is not
/// an error, it is reported in the result.
pub fn check_availability(
    product: &ProductAvailability<'_>,
    start: NaiveDate,
    end: NaiveDate,
    quantity: i32,
    today: NaiveDate,
) -> Result<AvailabilityCheck, StockError> {
    if quantity < 1 {
        return Err(StockError::InvalidQuantity(quantity));
    }
    check_lead_time(product.stock_status, product.lead_time_days, start, today)?;
    let available = available_for_range(product.physical, product.reservations, start, end)?;
    let advance_booking = is_advance_booking(start, today);

    Ok(AvailabilityCheck {
        requested: quantity,
        available,
        is_available: advance_booking || available >= quantity,
        advance_booking,
    })
}

/// A pack component's requirement and the units free for the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentStock {
    /// Units of the product in one pack.
    pub per_pack: i32,
    /// Units free over the requested range.
    pub available: i32,
}

impl ComponentStock {
    /// Units needed for `packs` packs.
    #[must_use]
    pub const fn required(&self, packs: i32) -> i32 {
        self.per_pack.saturating_mul(packs)
    }
}

/// How many whole packs the components allow. A pack with no components is
/// never limited by stock and reports `None`.
#[must_use]
pub fn packs_available(components: &[ComponentStock]) -> Option<i32> {
    components
        .iter()
        .filter(|c| c.per_pack > 0)
        .map(|c| c.available.max(0) / c.per_pack)
        .min()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, d).unwrap()
    }

    fn levels(stock: i32, real: Option<i32>, available: i32) -> StockLevels {
        StockLevels {
            stock,
            real_stock: real,
            available_stock: available,
            status: ProductStatus::Available,
        }
    }

    #[test]
    fn physical_falls_back_to_stock() {
        assert_eq!(levels(5, None, 5).physical(), 5);
        assert_eq!(levels(5, Some(8), 5).physical(), 8);
    }

    #[test]
    fn decrease_to_zero_marks_out_of_stock() {
        let next = levels(3, Some(3), 3)
            .adjust(StockOperation::Decrease, 3)
            .unwrap();
        assert_eq!(next.stock, 0);
        assert_eq!(next.available_stock, 0);
        assert_eq!(next.status, ProductStatus::OutOfStock);

        let back = next.adjust(StockOperation::Increase, 2).unwrap();
        assert_eq!(back.available_stock, 2);
        assert_eq!(back.real_stock, Some(5));
        assert_eq!(back.status, ProductStatus::Available);
    }

    #[test]
    fn decrease_beyond_available_fails() {
        let err = levels(10, Some(10), 2)
            .adjust(StockOperation::Decrease, 3)
            .unwrap_err();
        assert_eq!(
            err,
            StockError::Insufficient {
                available: 2,
                requested: 3
            }
        );
    }

    #[test]
    fn adjust_keeps_maintenance_status() {
        let mut l = levels(4, Some(4), 4);
        l.status = ProductStatus::Maintenance;
        let next = l.adjust(StockOperation::Increase, 1).unwrap();
        assert_eq!(next.status, ProductStatus::Maintenance);
    }

    #[test]
    fn reserve_and_release_are_symmetric() {
        let start = levels(4, Some(4), 4);
        let held = start.reserve(4).unwrap();
        assert_eq!(held.available_stock, 0);
        assert_eq!(held.status, ProductStatus::OutOfStock);
        assert_eq!(held.release(4), start);
    }

    #[test]
    fn release_never_exceeds_physical() {
        let l = levels(4, Some(4), 3).release(10);
        assert_eq!(l.available_stock, 4);
    }

    #[test]
    fn repair_backfills_and_clamps() {
        let (fixed, fixes) = levels(6, None, 9).repair();
        assert_eq!(fixed.real_stock, Some(6));
        assert_eq!(fixed.available_stock, 6);
        assert_eq!(fixes.len(), 2);

        let (fixed, fixes) = levels(6, Some(6), -2).repair();
        assert_eq!(fixed.available_stock, 0);
        assert_eq!(fixes, vec![StockFix::ClampedAvailable { from: -2, to: 0 }]);

        assert!(levels(6, Some(6), 6).problems().is_empty());
    }

    #[test]
    fn overlapping_reservations_take_the_busiest_day() {
        let reservations = [
            Reservation {
                start: day(1),
                end: day(5),
                quantity: 2,
            },
            Reservation {
                start: day(4),
                end: day(8),
                quantity: 3,
            },
        ];
        assert_eq!(reserved_on(&reservations, day(3)), 2);
        assert_eq!(reserved_on(&reservations, day(4)), 5);
        assert_eq!(
            available_for_range(6, &reservations, day(1), day(10)).unwrap(),
            1
        );
        assert_eq!(
            available_for_range(6, &reservations, day(9), day(10)).unwrap(),
            6
        );
        // overbooked days report zero, not negative
        assert_eq!(
            available_for_range(4, &reservations, day(4), day(5)).unwrap(),
            0
        );
    }

    #[test]
    fn calendar_lists_every_day() {
        let reservations = [Reservation {
            start: day(2),
            end: day(2),
            quantity: 1,
        }];
        let cal = calendar(3, &reservations, day(1), day(3)).unwrap();
        assert_eq!(cal.len(), 3);
        assert_eq!(cal[1].reserved, 1);
        assert_eq!(cal[1].available, 2);
        assert_eq!(cal[2].available, 3);
    }

    #[test]
    fn invalid_ranges_are_rejected() {
        assert!(matches!(
            calendar(1, &[], day(5), day(1)),
            Err(StockError::InvalidRange { .. })
        ));
        let far = day(1).checked_add_days(Days::new(400)).unwrap();
        assert!(matches!(
            calendar(1, &[], day(1), far),
            Err(StockError::RangeTooLong { .. })
        ));
    }

    #[test]
    fn on_demand_products_need_notice() {
        let today = day(1);
        let err = check_lead_time(StockStatus::OnDemand, 5, day(3), today).unwrap_err();
        assert_eq!(
            err,
            StockError::LeadTime {
                lead_time_days: 5,
                earliest: day(6)
            }
        );
        assert!(check_lead_time(StockStatus::OnDemand, 5, day(6), today).is_ok());
        assert!(check_lead_time(StockStatus::InStock, 5, day(2), today).is_ok());
    }

    #[test]
    fn far_future_bookings_skip_the_stock_check() {
        let today = day(1);
        let start = today.checked_add_days(Days::new(31)).unwrap();
        let end = start.checked_add_days(Days::new(1)).unwrap();
        let product = ProductAvailability {
            physical: 0,
            stock_status: StockStatus::InStock,
            lead_time_days: 0,
            reservations: &[],
        };
        let check = check_availability(&product, start, end, 4, today).unwrap();
        assert!(check.advance_booking);
        assert!(check.is_available);

        let near = today.checked_add_days(Days::new(30)).unwrap();
        let check = check_availability(&product, near, near, 4, today).unwrap();
        assert!(!check.advance_booking);
        assert!(!check.is_available);
    }

    #[test]
    fn pack_availability_is_limited_by_scarcest_component() {
        let components = [
            ComponentStock {
                per_pack: 2,
                available: 9,
            },
            ComponentStock {
                per_pack: 1,
                available: 3,
            },
        ];
        assert_eq!(packs_available(&components), Some(3));
        assert_eq!(components[0].required(3), 6);
        assert_eq!(packs_available(&[]), None);
    }
}
