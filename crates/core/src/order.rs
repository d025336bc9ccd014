//! Order lifecycle: status transitions, cancellation refunds and document
//! numbering.

use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{OrderStatus, percent_of, round_money};

/// Cancelling at least this many days before the event refunds the advance in
/// full.
pub const FULL_REFUND_NOTICE_DAYS: i64 = 7;

/// Share of the advance kept on late cancellations.
pub const LATE_CANCELLATION_RETAINED_PERCENT: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// Days between invoice issue and due date.
pub const INVOICE_DUE_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("order is already {0}")]
    Terminal(OrderStatus),
}

/// Statuses reachable from `from` in one step.
#[must_use]
pub const fn next_statuses(from: OrderStatus) -> &'static [OrderStatus] {
    use OrderStatus::{
        Cancelled, Completed, Confirmed, Delivered, InTransit, Pending, Preparing, Ready, Returned,
    };
    match from {
        Pending => &[Confirmed, Cancelled],
        Confirmed => &[Preparing, Cancelled],
        Preparing => &[Ready, Cancelled],
        Ready => &[InTransit, Delivered, Cancelled],
        InTransit => &[Delivered, Cancelled],
        Delivered => &[Completed, Returned],
        Completed => &[Returned],
        Cancelled | Returned => &[],
    }
}

#[must_use]
pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    next_statuses(from).contains(&to)
}

/// Validate a status change.
///
/// # Errors
///
/// `Terminal` when `from` has no outgoing transitions, `InvalidTransition`
/// otherwise when the table does not allow the move.
pub fn transition(from: OrderStatus, to: OrderStatus) -> Result<OrderStatus, OrderError> {
    if is_terminal(from) {
        return Err(OrderError::Terminal(from));
    }
    if can_transition(from, to) {
        Ok(to)
    } else {
        Err(OrderError::InvalidTransition { from, to })
    }
}

#[must_use]
pub const fn is_terminal(status: OrderStatus) -> bool {
    next_statuses(status).is_empty()
}

/// Whether items of an order in this status count against stock.
#[must_use]
pub const fn holds_reservation(status: OrderStatus) -> bool {
    !matches!(status, OrderStatus::Cancelled | OrderStatus::Returned)
}

/// Outcome of the cancellation refund policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationRefund {
    pub full_refund: bool,
    pub refund_amount: Decimal,
    pub retained_amount: Decimal,
    /// Human-readable policy line appended to the order notes.
    pub note: String,
}

/// Apply the refund policy to a cancellation at `now` of an event starting at
/// `event_start`, for which `advance_paid` was collected.
#[must_use]
pub fn cancellation_refund(
    advance_paid: Decimal,
    event_start: DateTime<Utc>,
    now: DateTime<Utc>,
) -> CancellationRefund {
    let advance = round_money(advance_paid.max(Decimal::ZERO));
    let full_refund = event_start - now >= TimeDelta::days(FULL_REFUND_NOTICE_DAYS);

    if full_refund {
        CancellationRefund {
            full_refund,
            refund_amount: advance,
            retained_amount: Decimal::ZERO,
            note: "Full refund of the advance payment.".to_owned(),
        }
    } else {
        let retained = round_money(percent_of(advance, LATE_CANCELLATION_RETAINED_PERCENT));
        CancellationRefund {
            full_refund,
            refund_amount: advance - retained,
            retained_amount: retained,
            note: format!(
                "Cancelled less than {FULL_REFUND_NOTICE_DAYS} days before the event: \
                 {LATE_CANCELLATION_RETAINED_PERCENT}% of the advance is retained."
            ),
        }
    }
}

/// Sequentially numbered documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// `RES-YYYY-NNNN`
    Order,
    /// `INV-YYYY-NNNNN`
    Invoice,
}

impl DocumentKind {
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Order => "RES",
            Self::Invoice => "INV",
        }
    }

    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::Order => 4,
            Self::Invoice => 5,
        }
    }

    /// Regex matching every well-formed number of `year`. Sequences may
    /// outgrow the padding width.
    #[must_use]
    pub fn sequence_pattern(self, year: i32) -> String {
        format!("^{}-{year}-[0-9]+$", self.prefix())
    }

    /// Format a document number.
    #[must_use]
    pub fn format(self, year: i32, sequence: u32) -> String {
        format!(
            "{}-{year}-{sequence:0width$}",
            self.prefix(),
            width = self.width()
        )
    }

    /// Number following `last`, the highest sequence already issued in
    /// `year` compared numerically. Numbering restarts at 1 each year.
    #[must_use]
    pub fn next_after(self, year: i32, last: Option<u32>) -> String {
        self.format(year, last.unwrap_or(0).saturating_add(1))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn happy_path_is_allowed() {
        let path = [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::InTransit,
            OrderStatus::Delivered,
            OrderStatus::Completed,
            OrderStatus::Returned,
        ];
        for pair in path.windows(2) {
            assert_eq!(transition(pair[0], pair[1]).unwrap(), pair[1]);
        }
    }

    #[test]
    fn cancellation_is_blocked_after_delivery() {
        assert!(can_transition(OrderStatus::InTransit, OrderStatus::Cancelled));
        assert!(!can_transition(OrderStatus::Delivered, OrderStatus::Cancelled));
        assert!(!can_transition(OrderStatus::Completed, OrderStatus::Cancelled));
    }

    #[test]
    fn terminal_statuses_reject_everything() {
        for to in OrderStatus::ALL {
            assert_eq!(
                transition(OrderStatus::Cancelled, *to).unwrap_err(),
                OrderError::Terminal(OrderStatus::Cancelled)
            );
        }
        assert!(is_terminal(OrderStatus::Returned));
    }

    #[test]
    fn skipping_steps_is_rejected() {
        assert_eq!(
            transition(OrderStatus::Pending, OrderStatus::Delivered).unwrap_err(),
            OrderError::InvalidTransition {
                from: OrderStatus::Pending,
                to: OrderStatus::Delivered
            }
        );
        assert!(transition(OrderStatus::Ready, OrderStatus::Ready).is_err());
    }

    #[test]
    fn reservations_are_held_until_cancelled_or_returned() {
        let holding = OrderStatus::ALL
            .iter()
            .filter(|s| holds_reservation(**s))
            .count();
        assert_eq!(holding, 7);
        assert!(!holds_reservation(OrderStatus::Cancelled));
        assert!(!holds_reservation(OrderStatus::Returned));
        assert!(holds_reservation(OrderStatus::Delivered));
    }

    #[test]
    fn early_cancellation_refunds_everything() {
        let now = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();
        let event = Utc.with_ymd_and_hms(2025, 5, 8, 12, 0, 0).unwrap();
        let r = cancellation_refund(dec("300"), event, now);
        assert!(r.full_refund);
        assert_eq!(r.refund_amount, dec("300"));
        assert_eq!(r.retained_amount, Decimal::ZERO);
    }

    #[test]
    fn late_cancellation_retains_half() {
        let now = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 1).unwrap();
        let event = Utc.with_ymd_and_hms(2025, 5, 8, 12, 0, 0).unwrap();
        let r = cancellation_refund(dec("300.01"), event, now);
        assert!(!r.full_refund);
        assert_eq!(r.retained_amount, dec("150.01"));
        assert_eq!(r.refund_amount, dec("150.00"));
        assert!(r.note.contains("50%"));
    }

    #[test]
    fn document_numbers_are_zero_padded() {
        assert_eq!(DocumentKind::Order.format(2025, 7), "RES-2025-0007");
        assert_eq!(DocumentKind::Invoice.format(2025, 42), "INV-2025-00042");
        assert_eq!(
            DocumentKind::Order.sequence_pattern(2025),
            "^RES-2025-[0-9]+$"
        );
    }

    #[test]
    fn numbering_continues_within_the_year() {
        assert_eq!(DocumentKind::Order.next_after(2025, None), "RES-2025-0001");
        assert_eq!(
            DocumentKind::Order.next_after(2025, Some(99)),
            "RES-2025-0100"
        );
        assert_eq!(
            DocumentKind::Invoice.next_after(2026, None),
            "INV-2026-00001"
        );
    }

    #[test]
    fn numbering_outgrows_the_padding_width() {
        // "RES-2025-9999" sorts after "RES-2025-10000" as text
        assert_eq!(
            DocumentKind::Order.next_after(2025, Some(9999)),
            "RES-2025-10000"
        );
        assert_eq!(
            DocumentKind::Order.next_after(2025, Some(10_000)),
            "RES-2025-10001"
        );
        assert_eq!(
            DocumentKind::Invoice.next_after(2025, Some(99_999)),
            "INV-2025-100000"
        );
        assert_eq!(
            DocumentKind::Invoice.next_after(2025, Some(100_000)),
            "INV-2025-100001"
        );
    }
}
