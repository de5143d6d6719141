//! Monthly billing period generation.
//!
//! Long-running rentals are invoiced once per calendar month.  Given
//! the rental's start, its expected end and the last day already
//! invoiced, [`monthly_periods`] lists the periods still to be billed.

use crate::models::BillingWindow;
use crate::window::end_of_month;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// One calendar-month slice of a rental.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyPeriod {
    /// Inclusive first day.
    pub start: NaiveDate,
    /// Inclusive last day.
    pub end: NaiveDate,
    /// Invoice reference, `MONTHLY-{rental_number}-{YYYY}-{MM}`.
    pub reference: String,
    /// True when the rental had never been invoiced before this run.
    pub is_first_month: bool,
}

impl MonthlyPeriod {
    pub fn window(&self) -> BillingWindow {
        BillingWindow::Range {
            from: self.start,
            to: self.end,
        }
    }
}

/// Splits the un-invoiced part of a rental into calendar months.
///
/// Billing resumes the day after `last_invoice_date`, or at
/// `rental_start` for a rental that was never invoiced, and runs up to
/// `expected_end` (or `today` for an open-ended rental).
pub fn monthly_periods(
    rental_number: &str,
    rental_start: NaiveDate,
    expected_end: Option<NaiveDate>,
    last_invoice_date: Option<NaiveDate>,
    today: NaiveDate,
) -> Vec<MonthlyPeriod> {
    let upper = expected_end.unwrap_or(today);
    let is_first_month = last_invoice_date.is_none();
    let mut current = match last_invoice_date {
        Some(last) => match last.succ_opt() {
            Some(next) => next,
            None => return Vec::new(),
        },
        None => rental_start,
    };

    let mut periods = Vec::new();
    while current < upper {
        let Some(month_end) = end_of_month(current) else {
            break;
        };
        let end = month_end.min(upper);
        periods.push(MonthlyPeriod {
            start: current,
            end,
            reference: format!(
                "MONTHLY-{}-{}-{:02}",
                rental_number,
                current.year(),
                current.month()
            ),
            is_first_month,
        });
        match end.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }
    tracing::debug!(rental_number, count = periods.len(), "generated monthly billing periods");
    periods
}
