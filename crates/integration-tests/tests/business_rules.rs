//! Pricing, deposit, stock and lifecycle rules applied together the way the
//! order service chains them.

#![allow(clippy::unwrap_used)]

use chrono::{NaiveDate, TimeDelta, TimeZone, Utc};
use resona_core::integrity::{check_order_deposit, check_product_stock};
use resona_core::order::{
    DocumentKind, cancellation_refund, holds_reservation, transition,
};
use resona_core::pricing::{DepositLine, RentalRates, calculate_deposit, line_total, order_totals};
use resona_core::stock::{StockError, StockLevels};
use resona_core::{OrderId, OrderStatus, ProductId, ProductStatus, UserLevel};
use rust_decimal::Decimal;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn speaker_rates() -> RentalRates {
    RentalRates {
        price_per_day: dec("50"),
        price_per_weekend: dec("80"),
        price_per_week: dec("300"),
    }
}

/// A weekend speaker pair (custom deposit) plus an 8-day mixer (percentage
/// deposit).
fn quote(level: UserLevel) -> (Decimal, Decimal, Decimal) {
    let speakers = line_total(&speaker_rates(), date(2030, 6, 7), date(2030, 6, 9), 2).unwrap();
    let mixer = line_total(&speaker_rates(), date(2030, 6, 1), date(2030, 6, 8), 1).unwrap();
    assert_eq!(speakers, dec("160"));
    assert_eq!(mixer, dec("600"));

    let totals = order_totals(level, speakers + mixer, dec("25"));
    let deposit = calculate_deposit(
        level,
        &[
            DepositLine::new(2, speakers, Some(dec("100"))),
            DepositLine::new(1, mixer, None),
        ],
    );
    (totals.total, totals.tax, deposit.amount)
}

#[test]
fn test_standard_customer_pays_full_price_and_deposit() {
    let (total, tax, deposit) = quote(UserLevel::Standard);
    // (760 + 25) * 1.21
    assert_eq!(tax, dec("164.85"));
    assert_eq!(total, dec("949.85"));
    // 100 * 2 + 20% of 600
    assert_eq!(deposit, dec("320"));
}

#[test]
fn test_vip_discount_excludes_delivery_and_waives_deposit() {
    let (total, tax, deposit) = quote(UserLevel::Vip);
    // (380 + 25) * 1.21
    assert_eq!(tax, dec("85.05"));
    assert_eq!(total, dec("490.05"));
    assert_eq!(deposit, Decimal::ZERO);
    assert!(check_order_deposit(OrderId::new(1), UserLevel::Vip, deposit).is_none());
}

#[test]
fn test_reservations_cannot_oversell() {
    let levels = StockLevels {
        stock: 3,
        real_stock: Some(3),
        available_stock: 3,
        status: ProductStatus::Available,
    };

    let after_first = levels.reserve(2).unwrap();
    assert_eq!(after_first.available_stock, 1);

    let err = after_first.reserve(2).unwrap_err();
    assert_eq!(
        err,
        StockError::Insufficient {
            available: 1,
            requested: 2
        }
    );

    let sold_out = after_first.reserve(1).unwrap();
    assert_eq!(sold_out.status, ProductStatus::OutOfStock);

    let restored = sold_out.release(3);
    assert_eq!(restored.available_stock, 3);
    assert_eq!(restored.status, ProductStatus::Available);
    assert!(check_product_stock(ProductId::new(1), &restored).is_empty());
}

#[test]
fn test_cancelling_releases_and_refunds() {
    let status = transition(OrderStatus::Confirmed, OrderStatus::Cancelled).unwrap();
    assert!(!holds_reservation(status));
    assert!(transition(status, OrderStatus::Confirmed).is_err());

    let event = Utc.with_ymd_and_hms(2030, 6, 7, 0, 0, 0).unwrap();

    let early = cancellation_refund(dec("200"), event, event - TimeDelta::days(30));
    assert!(early.full_refund);
    assert_eq!(early.refund_amount, dec("200"));

    let late = cancellation_refund(dec("200"), event, event - TimeDelta::days(2));
    assert!(!late.full_refund);
    assert_eq!(late.refund_amount + late.retained_amount, dec("200"));
    assert_eq!(late.retained_amount, dec("100"));
}

#[test]
fn test_numbering_continues_within_year_and_restarts() {
    assert_eq!(
        DocumentKind::Order.next_after(2030, Some(41)),
        "RES-2030-0042"
    );
    assert_eq!(DocumentKind::Order.next_after(2031, None), "RES-2031-0001");
    assert_eq!(DocumentKind::Invoice.next_after(2030, None), "INV-2030-00001");
    assert_eq!(
        DocumentKind::Order.next_after(2030, Some(9999)),
        "RES-2030-10000"
    );
}
