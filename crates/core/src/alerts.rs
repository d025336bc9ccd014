//! Stock deficit alerts.
//!
//! Demand is the sum of units every open order still needs (its items end
//! today or later). A product whose demand exceeds its physical stock gets an
//! alert; the deficit decides the priority.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// Deficits above this are `High`.
pub const HIGH_PRIORITY_DEFICIT: i32 = 5;

/// Deficits above this (and up to `HIGH_PRIORITY_DEFICIT`) are `Medium`.
pub const MEDIUM_PRIORITY_DEFICIT: i32 = 2;

/// Units one open order item needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demand {
    pub product_id: ProductId,
    pub order_number: String,
    pub start_date: NaiveDate,
    pub quantity: i32,
}

/// Sorted most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertPriority {
    High,
    Medium,
    Low,
}

impl AlertPriority {
    #[must_use]
    pub const fn for_deficit(deficit: i32) -> Self {
        if deficit > HIGH_PRIORITY_DEFICIT {
            Self::High
        } else if deficit > MEDIUM_PRIORITY_DEFICIT {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// A product that open orders need more of than is owned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAlert {
    pub product_id: ProductId,
    pub physical_stock: i32,
    pub demand: i32,
    pub deficit: i32,
    pub priority: AlertPriority,
    /// Start of the earliest affected order.
    pub first_start: NaiveDate,
    /// Affected order numbers, earliest start first.
    pub affected_orders: Vec<String>,
}

/// Alert counts for a report header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSummary {
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub total_deficit: i64,
}

impl AlertSummary {
    #[must_use]
    pub fn of(alerts: &[StockAlert]) -> Self {
        let count = |p: AlertPriority| alerts.iter().filter(|a| a.priority == p).count();
        Self {
            total: alerts.len(),
            high: count(AlertPriority::High),
            medium: count(AlertPriority::Medium),
            low: count(AlertPriority::Low),
            total_deficit: alerts.iter().map(|a| i64::from(a.deficit)).sum(),
        }
    }
}

/// Compare open demand with physical stock, per product.
///
/// Products missing from `physical` count as owning nothing. Alerts come
/// back by priority, then by earliest affected start date.
#[must_use]
pub fn stock_alerts(demand: &[Demand], physical: &BTreeMap<ProductId, i32>) -> Vec<StockAlert> {
    let mut by_product: BTreeMap<ProductId, Vec<&Demand>> = BTreeMap::new();
    for line in demand {
        by_product.entry(line.product_id).or_default().push(line);
    }

    let mut alerts: Vec<StockAlert> = by_product
        .into_iter()
        .filter_map(|(product_id, mut lines)| {
            let needed = lines
                .iter()
                .fold(0_i32, |acc, l| acc.saturating_add(l.quantity));
            let owned = physical.get(&product_id).copied().unwrap_or(0);
            let deficit = needed.saturating_sub(owned);
            if deficit <= 0 {
                return None;
            }

            lines.sort_by(|a, b| {
                a.start_date
                    .cmp(&b.start_date)
                    .then_with(|| a.order_number.cmp(&b.order_number))
            });
            let first_start = lines.first()?.start_date;
            let mut affected_orders: Vec<String> = Vec::with_capacity(lines.len());
            for line in &lines {
                if !affected_orders.contains(&line.order_number) {
                    affected_orders.push(line.order_number.clone());
                }
            }

            Some(StockAlert {
                product_id,
                physical_stock: owned,
                demand: needed,
                deficit,
                priority: AlertPriority::for_deficit(deficit),
                first_start,
                affected_orders,
            })
        })
        .collect();

    alerts.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| a.first_start.cmp(&b.first_start))
    });
    alerts
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, d).unwrap()
    }

    fn demand(product: i32, order: &str, start: u32, quantity: i32) -> Demand {
        Demand {
            product_id: ProductId::new(product),
            order_number: order.to_owned(),
            start_date: day(start),
            quantity,
        }
    }

    fn stock(pairs: &[(i32, i32)]) -> BTreeMap<ProductId, i32> {
        pairs.iter().map(|(p, s)| (ProductId::new(*p), *s)).collect()
    }

    #[test]
    fn priority_thresholds() {
        assert_eq!(AlertPriority::for_deficit(1), AlertPriority::Low);
        assert_eq!(AlertPriority::for_deficit(2), AlertPriority::Low);
        assert_eq!(AlertPriority::for_deficit(3), AlertPriority::Medium);
        assert_eq!(AlertPriority::for_deficit(5), AlertPriority::Medium);
        assert_eq!(AlertPriority::for_deficit(6), AlertPriority::High);
    }

    #[test]
    fn covered_demand_raises_nothing() {
        let lines = [demand(1, "RES-2025-0001", 5, 2), demand(1, "RES-2025-0002", 8, 3)];
        assert!(stock_alerts(&lines, &stock(&[(1, 5)])).is_empty());
    }

    #[test]
    fn deficit_lists_affected_orders_by_start() {
        let lines = [
            demand(1, "RES-2025-0007", 12, 4),
            demand(1, "RES-2025-0003", 6, 3),
            demand(1, "RES-2025-0003", 6, 1),
        ];
        let alerts = stock_alerts(&lines, &stock(&[(1, 5)]));
        assert_eq!(alerts.len(), 1);
        let alert = &alerts[0];
        assert_eq!(alert.demand, 8);
        assert_eq!(alert.physical_stock, 5);
        assert_eq!(alert.deficit, 3);
        assert_eq!(alert.priority, AlertPriority::Medium);
        assert_eq!(alert.first_start, day(6));
        assert_eq!(alert.affected_orders, ["RES-2025-0003", "RES-2025-0007"]);
    }

    #[test]
    fn unknown_product_owns_nothing() {
        let alerts = stock_alerts(&[demand(9, "RES-2025-0001", 1, 7)], &BTreeMap::new());
        assert_eq!(alerts[0].deficit, 7);
        assert_eq!(alerts[0].priority, AlertPriority::High);
    }

    #[test]
    fn alerts_sort_by_priority_then_date() {
        let lines = [
            demand(1, "RES-2025-0001", 3, 2),
            demand(2, "RES-2025-0002", 1, 1),
            demand(3, "RES-2025-0003", 9, 10),
        ];
        let alerts = stock_alerts(&lines, &stock(&[(1, 0), (2, 0), (3, 0)]));
        let order: Vec<i32> = alerts.iter().map(|a| a.product_id.as_i32()).collect();
        assert_eq!(order, [3, 2, 1]);

        let summary = AlertSummary::of(&alerts);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.high, 1);
        assert_eq!(summary.medium, 0);
        assert_eq!(summary.low, 2);
        assert_eq!(summary.total_deficit, 13);
    }
}
