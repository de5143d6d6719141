//! Billing quantity calculator.
//!
//! Turns a rental item, its rental, a billing window and an optional
//! timesheet aggregate into a single [`BillingLine`].  Confirmed
//! timesheet hours always win over the nominal period; otherwise the
//! quantity is derived from the length of the effective window.
//!
//! The calculator never fails.  Missing or malformed inputs are
//! replaced by defaults (zero price, daily rate, minimum quantity,
//! "now" as an open end) so every item still produces an invoice line.

use crate::models::{
    BillingLine, BillingWindow, QuantityBasis, RateType, Rental, RentalItem, TimesheetAggregate,
    UnitOfMeasure,
};
use crate::window::{self, EffectiveWindow};
use chrono::NaiveDateTime;
use tracing::debug;

/// Hours a working day is normalised to when converting a daily,
/// weekly or monthly price into an hourly rate.  Downstream reports
/// use the same literal, so this does not follow per-employee
/// contract hours.
pub const HOURS_PER_WORKING_DAY: f64 = 10.0;
pub const DAYS_PER_WEEK: f64 = 7.0;
pub const DAYS_PER_MONTH: f64 = 30.0;

const MILLIS_PER_HOUR: i64 = 60 * 60 * 1000;
const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

/// Computes invoice lines relative to a fixed point in time.
///
/// `now` is only consulted when an item has no end date of any kind;
/// pinning it at construction keeps repeated calls deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingPeriodCalculator {
    now: NaiveDateTime,
}

impl BillingPeriodCalculator {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    /// Computes the quantity, unit, rate and amount for one item.
    pub fn compute(
        &self,
        item: &RentalItem,
        rental: &Rental,
        window: Option<&BillingWindow>,
        timesheet: Option<&TimesheetAggregate>,
    ) -> BillingLine {
        let unit_price = item.unit_price();
        let timesheet = timesheet.copied().unwrap_or_default();

        if timesheet.received && timesheet.total_hours.is_finite() && timesheet.total_hours > 0.0 {
            let rate = hourly_equivalent(item.rate_type, unit_price);
            debug!(
                item = %item.id,
                rate_type = ?item.rate_type,
                hours = timesheet.total_hours,
                rate,
                "billing from confirmed timesheet hours"
            );
            return BillingLine {
                quantity: timesheet.total_hours,
                unit_of_measure: UnitOfMeasure::Hour,
                rate,
                amount: rate * timesheet.total_hours,
                basis: QuantityBasis::Timesheet,
            };
        }

        let effective = window::resolve(item, rental, window, self.now);
        let (quantity, unit_of_measure) = period_quantity(item.rate_type, &effective);
        debug!(
            item = %item.id,
            rate_type = ?item.rate_type,
            start = ?effective.start,
            end = %effective.end,
            quantity,
            "billing from effective window"
        );
        BillingLine {
            quantity,
            unit_of_measure,
            rate: unit_price,
            amount: unit_price * quantity,
            basis: QuantityBasis::Period,
        }
    }
}

/// Converts a price quoted per `rate_type` into a price per hour.
pub fn hourly_equivalent(rate_type: RateType, unit_price: f64) -> f64 {
    match rate_type {
        RateType::Hourly => unit_price,
        RateType::Daily => unit_price / HOURS_PER_WORKING_DAY,
        RateType::Weekly => unit_price / (DAYS_PER_WEEK * HOURS_PER_WORKING_DAY),
        RateType::Monthly => unit_price / (DAYS_PER_MONTH * HOURS_PER_WORKING_DAY),
    }
}

/// Quantity and unit for the date-based path.  Partial weeks, months
/// and hours round up to a whole unit.
fn period_quantity(rate_type: RateType, effective: &EffectiveWindow) -> (f64, UnitOfMeasure) {
    let span = effective.span_millis();
    match rate_type {
        RateType::Monthly => (
            ceil_units(span, 30 * MILLIS_PER_DAY).max(1) as f64,
            UnitOfMeasure::Nos,
        ),
        RateType::Weekly => (
            ceil_units(span, 7 * MILLIS_PER_DAY).max(1) as f64,
            UnitOfMeasure::Week,
        ),
        RateType::Hourly => (
            ceil_units(span, MILLIS_PER_HOUR).max(1) as f64,
            UnitOfMeasure::Hour,
        ),
        RateType::Daily => (effective.inclusive_days() as f64, UnitOfMeasure::Day),
    }
}

fn ceil_units(span: i64, unit: i64) -> i64 {
    if span <= 0 {
        0
    } else {
        (span + unit - 1) / unit
    }
}
