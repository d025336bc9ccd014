//! Integrity report.
//!
//! Walks orders, products and packs and collects every broken business
//! convention. Nothing is written; use `resona repair` to fix what is found.
//! Stock deficits of open orders are reported alongside but do not fail the
//! run; they need purchasing, not a repair.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;

use resona_api::db::{CategoryRepository, OrderRepository, PackRepository, ProductRepository};
use resona_core::ProductId;
use resona_core::alerts::{AlertPriority, AlertSummary, StockAlert, stock_alerts};
use resona_core::integrity::{
    Violation, check_order_deposit, check_pack_category, check_pack_price, check_product_stock,
};

use super::{CommandError, connect};

/// Everything one check run found.
#[derive(Debug, Default, Serialize)]
pub struct Report {
    pub orders_checked: usize,
    pub products_checked: usize,
    pub packs_checked: usize,
    /// Packs whose price could not be recomputed.
    pub pricing_errors: Vec<String>,
    pub violations: Vec<Violation>,
    pub alert_summary: AlertSummary,
    pub stock_alerts: Vec<StockAlert>,
}

impl Report {
    /// Violation counts grouped by kind.
    #[must_use]
    pub fn by_kind(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for violation in &self.violations {
            *counts.entry(violation.kind()).or_insert(0) += 1;
        }
        counts
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Collect all violations currently in the database, and the stock
/// deficits of orders still running on `today`.
pub async fn collect(pool: &PgPool, today: NaiveDate) -> Result<Report, CommandError> {
    let mut report = Report::default();
    let orders = OrderRepository::new(pool);

    for row in orders.deposits().await? {
        report.orders_checked += 1;
        report
            .violations
            .extend(check_order_deposit(row.order_id, row.user_level, row.deposit_amount));
    }

    let mut physical: BTreeMap<ProductId, i32> = BTreeMap::new();
    for product in ProductRepository::new(pool).list_all().await? {
        report.products_checked += 1;
        let levels = product.stock_levels();
        physical.insert(product.id, levels.physical());
        report
            .violations
            .extend(check_product_stock(product.id, &levels));
    }

    report.stock_alerts = stock_alerts(&orders.open_demand(today).await?, &physical);
    report.alert_summary = AlertSummary::of(&report.stock_alerts);

    let montaje = CategoryRepository::new(pool).montaje().await?;
    if montaje.is_none() {
        tracing::warn!("Montaje category missing, pack category checks skipped (run `resona seed`)");
    }

    let packs = PackRepository::new(pool);
    for pack in packs.list_all().await? {
        report.packs_checked += 1;

        if let Some(montaje) = &montaje {
            report.violations.extend(check_pack_category(
                pack.id,
                pack.category,
                pack.category_ref,
                montaje.id,
            ));
        }

        let items = packs.items(pack.id).await?;
        match check_pack_price(
            pack.id,
            pack.auto_calculate,
            pack.final_price,
            &pack.pricing_input(&items),
        ) {
            Ok(violation) => report.violations.extend(violation),
            Err(e) => {
                tracing::warn!(pack_id = %pack.id, error = %e, "Pack price could not be recomputed");
                report.pricing_errors.push(format!("pack {}: {e}", pack.id));
            }
        }
    }

    Ok(report)
}

/// Run the checks, log the findings and optionally write them as JSON.
///
/// Fails when any violation is found so the command can gate scripts.
pub async fn run(output: Option<&str>) -> Result<(), CommandError> {
    let pool = connect().await?;
    let report = collect(&pool, Utc::now().date_naive()).await?;

    for violation in &report.violations {
        tracing::warn!(kind = violation.kind(), "{violation}");
    }
    for alert in &report.stock_alerts {
        let affected = alert.affected_orders.join(", ");
        if alert.priority == AlertPriority::High {
            tracing::error!(
                product_id = %alert.product_id,
                stock = alert.physical_stock,
                demand = alert.demand,
                deficit = alert.deficit,
                "High priority stock deficit ({affected})"
            );
        } else {
            tracing::warn!(
                product_id = %alert.product_id,
                stock = alert.physical_stock,
                demand = alert.demand,
                deficit = alert.deficit,
                priority = ?alert.priority,
                "Stock deficit ({affected})"
            );
        }
    }
    for (kind, count) in report.by_kind() {
        tracing::info!(kind, count, "Violations by kind");
    }
    tracing::info!(
        orders = report.orders_checked,
        products = report.products_checked,
        packs = report.packs_checked,
        violations = report.violations.len(),
        pricing_errors = report.pricing_errors.len(),
        stock_alerts = report.alert_summary.total,
        total_deficit = report.alert_summary.total_deficit,
        "Integrity check complete"
    );

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(Path::new(path), json)?;
        tracing::info!("Report written to {path}");
    }

    if report.is_clean() {
        Ok(())
    } else {
        Err(CommandError::Violations(report.violations.len()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use resona_core::{OrderId, UserLevel};
    use rust_decimal::Decimal;

    fn report() -> Report {
        Report {
            violations: vec![
                Violation::VipDeposit {
                    order_id: OrderId::new(1),
                    level: UserLevel::Vip,
                    deposit_amount: Decimal::TEN,
                },
                Violation::NullRealStock {
                    product_id: ProductId::new(4),
                    stock: 3,
                },
                Violation::VipDeposit {
                    order_id: OrderId::new(2),
                    level: UserLevel::VipPlus,
                    deposit_amount: Decimal::ONE,
                },
            ],
            ..Report::default()
        }
    }

    #[test]
    fn groups_by_kind() {
        let counts = report().by_kind();
        assert_eq!(counts.get("vip_deposit"), Some(&2));
        assert_eq!(counts.get("null_real_stock"), Some(&1));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn empty_report_is_clean() {
        assert!(Report::default().is_clean());
        assert!(!report().is_clean());
    }

    #[test]
    fn report_serializes_tagged_violations() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["violations"][0]["kind"], "vip_deposit");
        assert_eq!(json["violations"][1]["product_id"], 4);
    }

    #[test]
    fn stock_deficits_do_not_fail_the_check() {
        let alerts = vec![StockAlert {
            product_id: ProductId::new(7),
            physical_stock: 2,
            demand: 9,
            deficit: 7,
            priority: AlertPriority::High,
            first_start: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            affected_orders: vec!["RES-2025-0012".to_owned()],
        }];
        let report = Report {
            alert_summary: AlertSummary::of(&alerts),
            stock_alerts: alerts,
            ..Report::default()
        };
        assert!(report.is_clean());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["alert_summary"]["high"], 1);
        assert_eq!(json["stock_alerts"][0]["priority"], "high");
        assert_eq!(json["stock_alerts"][0]["deficit"], 7);
    }
}
