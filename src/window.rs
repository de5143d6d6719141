//! Effective billing window resolution.
//!
//! Before a quantity can be derived from dates, the nominal billing
//! window has to be reconciled with the item's own lifetime: billing
//! never starts before the item went out, never runs past the day it
//! came back, and an open-ended item is billed up to "now".

use crate::models::{BillingWindow, Rental, RentalItem};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};

/// The clamped range a date-based quantity is measured over.
///
/// `start` is `None` only when neither the item, its rental nor any
/// window supplies a start date.  `end` is never earlier than `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveWindow {
    pub start: Option<NaiveDateTime>,
    pub end: NaiveDateTime,
}

impl EffectiveWindow {
    /// Milliseconds between start and end, zero when there is no start.
    pub fn span_millis(&self) -> i64 {
        self.start
            .map(|start| (self.end - start).num_milliseconds())
            .unwrap_or(0)
    }

    /// Inclusive count of calendar days touched by the window.
    ///
    /// Both ends are moved to noon before differencing so an hour of
    /// clock shift at either end cannot push the count across a day
    /// boundary.  Returns `0` when there is no start.
    pub fn inclusive_days(&self) -> i64 {
        let Some(start) = self.start else {
            return 0;
        };
        let start = at_noon(start.date());
        let end = at_noon(self.end.date());
        let days = ((end - start).num_seconds() as f64 / 86_400.0).round() as i64;
        (days + 1).max(1)
    }
}

/// First and last day of a calendar month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}

/// Last day of the month `date` falls in.
pub fn end_of_month(date: NaiveDate) -> Option<NaiveDate> {
    month_bounds(date.year(), date.month()).map(|(_, last)| last)
}

pub(crate) fn at_midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn at_noon(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(12, 0, 0).unwrap_or_else(|| at_midnight(date))
}

/// Resolves the range an item is billed over.
///
/// The nominal range is the rental's custom override when both of its
/// ends are set, otherwise the supplied window.  With a nominal range
/// the start is pushed forward to the item start (the rental start for
/// an item without one) and the end pulled back to the item completion.  Without one the item's own lifetime
/// is used, ending at the first of: completion date, expected end of a
/// completed rental, the rental's custom end, or `now`.
pub fn resolve(
    item: &RentalItem,
    rental: &Rental,
    window: Option<&BillingWindow>,
    now: NaiveDateTime,
) -> EffectiveWindow {
    let nominal = rental.custom_range().or_else(|| {
        let bounds = window.and_then(BillingWindow::bounds);
        if bounds.is_none() {
            if let Some(window) = window {
                tracing::warn!(?window, "billing window does not resolve to dates, ignoring it");
            }
        }
        bounds
    });

    let item_start = item.start_date.or(rental.start_date);
    let start = match (nominal.map(|(from, _)| from), item_start) {
        (Some(from), Some(item_start)) => Some(from.max(item_start)),
        (from, item_start) => from.or(item_start),
    }
    .map(at_midnight);

    let end = match nominal {
        Some((_, to)) => {
            let to = match item.completed_date {
                Some(completed) => to.min(completed),
                None => to,
            };
            at_midnight(to)
        }
        None => item
            .completed_date
            .or_else(|| rental.expected_end_date.filter(|_| rental.is_completed()))
            .or(rental.custom_to)
            .map(at_midnight)
            .unwrap_or(now),
    };

    let end = match start {
        Some(start) if end < start => start,
        _ => end,
    };

    EffectiveWindow { start, end }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn now() -> NaiveDateTime {
        date(2024, 7, 10).and_hms_opt(15, 30, 0).unwrap()
    }

    #[test]
    fn month_bounds_handle_december_and_leap_years() {
        assert_eq!(month_bounds(2023, 12), Some((date(2023, 12, 1), date(2023, 12, 31))));
        assert_eq!(month_bounds(2024, 2), Some((date(2024, 2, 1), date(2024, 2, 29))));
        assert_eq!(month_bounds(2024, 0), None);
        assert_eq!(end_of_month(date(2023, 2, 14)), Some(date(2023, 2, 28)));
    }

    #[test]
    fn window_start_never_precedes_item_start() {
        let item = RentalItem {
            start_date: Some(date(2024, 6, 10)),
            ..RentalItem::default()
        };
        let window = BillingWindow::Month { year: 2024, month: 6 };
        let resolved = resolve(&item, &Rental::default(), Some(&window), now());
        assert_eq!(resolved.start, Some(at_midnight(date(2024, 6, 10))));
        assert_eq!(resolved.end, at_midnight(date(2024, 6, 30)));
    }

    #[test]
    fn window_end_never_passes_completion() {
        let item = RentalItem {
            start_date: Some(date(2024, 5, 1)),
            completed_date: Some(date(2024, 6, 12)),
            ..RentalItem::default()
        };
        let window = BillingWindow::Month { year: 2024, month: 6 };
        let resolved = resolve(&item, &Rental::default(), Some(&window), now());
        assert_eq!(resolved.start, Some(at_midnight(date(2024, 6, 1))));
        assert_eq!(resolved.end, at_midnight(date(2024, 6, 12)));
    }

    #[test]
    fn inverted_window_collapses_to_start() {
        let item = RentalItem {
            start_date: Some(date(2024, 7, 5)),
            ..RentalItem::default()
        };
        let window = BillingWindow::Month { year: 2024, month: 6 };
        let resolved = resolve(&item, &Rental::default(), Some(&window), now());
        assert_eq!(resolved.start, Some(at_midnight(date(2024, 7, 5))));
        assert_eq!(resolved.end, at_midnight(date(2024, 7, 5)));
        assert_eq!(resolved.span_millis(), 0);
        assert_eq!(resolved.inclusive_days(), 1);
    }

    #[test]
    fn custom_range_overrides_window() {
        let item = RentalItem {
            start_date: Some(date(2024, 1, 1)),
            ..RentalItem::default()
        };
        let rental = Rental {
            custom_from: Some(date(2024, 3, 5)),
            custom_to: Some(date(2024, 3, 20)),
            ..Rental::default()
        };
        let window = BillingWindow::Month { year: 2024, month: 6 };
        let resolved = resolve(&item, &rental, Some(&window), now());
        assert_eq!(resolved.start, Some(at_midnight(date(2024, 3, 5))));
        assert_eq!(resolved.end, at_midnight(date(2024, 3, 20)));
    }

    #[test]
    fn open_item_without_window_ends_now() {
        let item = RentalItem {
            start_date: Some(date(2024, 7, 1)),
            ..RentalItem::default()
        };
        let resolved = resolve(&item, &Rental::default(), None, now());
        assert_eq!(resolved.end, now());
        assert_eq!(resolved.inclusive_days(), 10);
    }

    #[test]
    fn completed_rental_falls_back_to_expected_end() {
        let item = RentalItem {
            start_date: Some(date(2024, 6, 1)),
            ..RentalItem::default()
        };
        let mut rental = Rental {
            status: "completed".into(),
            expected_end_date: Some(date(2024, 6, 3)),
            custom_to: Some(date(2024, 6, 20)),
            ..Rental::default()
        };
        assert_eq!(resolve(&item, &rental, None, now()).end, at_midnight(date(2024, 6, 3)));

        rental.status = "active".into();
        assert_eq!(resolve(&item, &rental, None, now()).end, at_midnight(date(2024, 6, 20)));
    }

    #[test]
    fn item_without_start_uses_rental_start() {
        let item = RentalItem {
            completed_date: Some(date(2024, 6, 5)),
            ..RentalItem::default()
        };
        let rental = Rental {
            start_date: Some(date(2024, 6, 1)),
            ..Rental::default()
        };
        let resolved = resolve(&item, &rental, None, now());
        assert_eq!(resolved.start, Some(at_midnight(date(2024, 6, 1))));
        assert_eq!(resolved.inclusive_days(), 5);

        let window = BillingWindow::Month { year: 2024, month: 5 };
        let rental = Rental {
            start_date: Some(date(2024, 5, 20)),
            ..Rental::default()
        };
        let resolved = resolve(&RentalItem::default(), &rental, Some(&window), now());
        assert_eq!(resolved.start, Some(at_midnight(date(2024, 5, 20))));
        assert_eq!(resolved.end, at_midnight(date(2024, 5, 31)));
    }

    #[test]
    fn no_dates_at_all_has_no_start() {
        let resolved = resolve(&RentalItem::default(), &Rental::default(), None, now());
        assert_eq!(resolved.start, None);
        assert_eq!(resolved.inclusive_days(), 0);
        assert_eq!(resolved.span_millis(), 0);
    }

    #[test]
    fn invalid_month_is_ignored() {
        let item = RentalItem {
            start_date: Some(date(2024, 7, 8)),
            ..RentalItem::default()
        };
        let window = BillingWindow::Month { year: 2024, month: 13 };
        let resolved = resolve(&item, &Rental::default(), Some(&window), now());
        assert_eq!(resolved.end, now());
    }
}
