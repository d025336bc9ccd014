//! Deposit (fianza) calculation.
//!
//! VIP and VIP_PLUS customers never pay a deposit. Everyone else pays, per
//! line, the product's custom deposit times the quantity when one is set, or
//! [`DEPOSIT_RATE_PERCENT`] of the line total otherwise. Lines whose product no
//! longer exists are skipped.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{DepositStatus, UserLevel, percent_of, round_money};

/// Fallback deposit rate applied to the line total.
pub const DEPOSIT_RATE_PERCENT: Decimal = Decimal::from_parts(20, 0, 0, false, 0);

/// Product fields the deposit rule reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DepositProduct {
    /// Per-unit deposit configured by an admin.
    pub custom_deposit: Option<Decimal>,
}

/// One order line as seen by the deposit rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositLine {
    /// Units rented.
    pub quantity: i32,
    /// Line total (unit price × quantity).
    pub line_total: Decimal,
    /// The line's product, `None` when it has been deleted.
    pub product: Option<DepositProduct>,
}

impl DepositLine {
    /// A line whose product exists.
    #[must_use]
    pub const fn new(quantity: i32, line_total: Decimal, custom_deposit: Option<Decimal>) -> Self {
        Self {
            quantity,
            line_total,
            product: Some(DepositProduct { custom_deposit }),
        }
    }

    /// A line whose product is missing.
    #[must_use]
    pub const fn orphan(quantity: i32, line_total: Decimal) -> Self {
        Self {
            quantity,
            line_total,
            product: None,
        }
    }
}

/// How a line's deposit was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositBasis {
    /// Custom per-unit deposit × quantity.
    Custom,
    /// Percentage of the line total.
    Percentage,
    /// Product missing, nothing charged.
    Skipped,
    /// Customer tier is exempt.
    Waived,
}

/// Per-line result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDeposit {
    /// Deposit for this line.
    pub amount: Decimal,
    /// Rule branch used.
    pub basis: DepositBasis,
}

/// Result of the deposit rule for a whole order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositQuote {
    /// Total deposit, rounded to cents.
    pub amount: Decimal,
    /// Status to store with the order.
    pub status: DepositStatus,
    /// Breakdown in input order.
    pub lines: Vec<LineDeposit>,
}

/// Compute the deposit for an order.
///
/// A custom deposit counts as set only when it is strictly positive; a stored
/// `0` falls back to the percentage rule.
#[must_use]
pub fn calculate_deposit(level: UserLevel, lines: &[DepositLine]) -> DepositQuote {
    if level.is_vip() {
        return DepositQuote {
            amount: Decimal::ZERO,
            status: DepositStatus::Pending,
            lines: lines
                .iter()
                .map(|_| LineDeposit {
                    amount: Decimal::ZERO,
                    basis: DepositBasis::Waived,
                })
                .collect(),
        };
    }

    let breakdown: Vec<LineDeposit> = lines.iter().map(line_deposit).collect();
    let total = breakdown.iter().map(|l| l.amount).sum();

    DepositQuote {
        amount: round_money(total),
        status: DepositStatus::Pending,
        lines: breakdown,
    }
}

fn line_deposit(line: &DepositLine) -> LineDeposit {
    let Some(product) = line.product else {
        return LineDeposit {
            amount: Decimal::ZERO,
            basis: DepositBasis::Skipped,
        };
    };

    match product.custom_deposit {
        Some(per_unit) if per_unit > Decimal::ZERO => LineDeposit {
            amount: per_unit * Decimal::from(line.quantity),
            basis: DepositBasis::Custom,
        },
        _ => LineDeposit {
            amount: percent_of(line.line_total, DEPOSIT_RATE_PERCENT),
            basis: DepositBasis::Percentage,
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn sample_lines() -> Vec<DepositLine> {
        vec![
            DepositLine::new(2, dec("120"), Some(dec("50"))),
            DepositLine::new(1, dec("80"), None),
            DepositLine::orphan(3, dec("300")),
        ]
    }

    #[test]
    fn vip_tiers_pay_nothing() {
        for level in [UserLevel::Vip, UserLevel::VipPlus] {
            let quote = calculate_deposit(level, &sample_lines());
            assert_eq!(quote.amount, Decimal::ZERO);
            assert_eq!(quote.status, DepositStatus::Pending);
            assert!(quote.lines.iter().all(|l| l.basis == DepositBasis::Waived));
        }
    }

    #[test]
    fn standard_mixes_custom_and_percentage() {
        let quote = calculate_deposit(UserLevel::Standard, &sample_lines());
        // 50 × 2 + 20% of 80, orphan skipped
        assert_eq!(quote.amount, dec("116"));
        assert_eq!(quote.status, DepositStatus::Pending);
        assert_eq!(quote.lines[0].basis, DepositBasis::Custom);
        assert_eq!(quote.lines[1].basis, DepositBasis::Percentage);
        assert_eq!(quote.lines[2].basis, DepositBasis::Skipped);
    }

    #[test]
    fn zero_custom_deposit_falls_back_to_percentage() {
        let quote = calculate_deposit(
            UserLevel::Standard,
            &[DepositLine::new(4, dec("33.33"), Some(Decimal::ZERO))],
        );
        assert_eq!(quote.amount, dec("6.67"));
        assert_eq!(quote.lines[0].basis, DepositBasis::Percentage);
    }

    #[test]
    fn total_equals_sum_of_lines() {
        let lines = vec![
            DepositLine::new(1, dec("19.99"), None),
            DepositLine::new(3, dec("45.50"), Some(dec("12.5"))),
            DepositLine::new(2, dec("10.01"), None),
        ];
        let quote = calculate_deposit(UserLevel::Standard, &lines);
        let sum: Decimal = quote.lines.iter().map(|l| l.amount).sum();
        assert_eq!(quote.amount, round_money(sum));
    }

    #[test]
    fn empty_order_has_zero_deposit() {
        let quote = calculate_deposit(UserLevel::Standard, &[]);
        assert_eq!(quote.amount, Decimal::ZERO);
        assert!(quote.lines.is_empty());
    }
}
