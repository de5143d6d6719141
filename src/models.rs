//! Data models for the rental billing engine.
//!
//! The `models` module defines the serialisable records the billing
//! calculator consumes (rental items, rentals, billing windows and
//! timesheet aggregates) and the invoice line it produces.  The
//! records mirror what the back-office database hands over; most
//! fields are optional because upstream data is frequently
//! incomplete and the calculator substitutes defaults rather than
//! rejecting a line.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The unit of time a rental item's price is quoted against.
///
/// Upstream records carry the rate type as a free-form string.  Any
/// value that is not one of the four recognised labels deserialises
/// to [`RateType::Daily`], which is also the default when the field
/// is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Option<String>")]
pub enum RateType {
    Hourly,
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl RateType {
    /// Parses a recognised label.  Returns `None` for anything else so
    /// callers can tell a fallback apart from an explicit `daily`.
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "hourly" => Some(RateType::Hourly),
            "daily" => Some(RateType::Daily),
            "weekly" => Some(RateType::Weekly),
            "monthly" => Some(RateType::Monthly),
            _ => None,
        }
    }
}

impl From<Option<String>> for RateType {
    fn from(label: Option<String>) -> Self {
        match label.as_deref() {
            Some(label) => RateType::parse(label).unwrap_or_else(|| {
                tracing::debug!(label, "unrecognised rate type, billing as daily");
                RateType::Daily
            }),
            None => RateType::Daily,
        }
    }
}

/// Unit of measure attached to an invoice line.
///
/// There is no month unit in the downstream invoicing system, so
/// monthly quantities are expressed as `Nos` (a plain count).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitOfMeasure {
    Hour,
    Day,
    Week,
    Nos,
}

impl fmt::Display for UnitOfMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UnitOfMeasure::Hour => "Hour",
            UnitOfMeasure::Day => "Day",
            UnitOfMeasure::Week => "Week",
            UnitOfMeasure::Nos => "Nos",
        };
        f.write_str(label)
    }
}

/// A monetary amount as it arrives from upstream: either a JSON
/// number or a decimal string such as `"1250.00"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UnitPrice {
    Number(f64),
    Text(String),
}

impl UnitPrice {
    /// The numeric value.  Unparseable, non-finite and negative
    /// inputs all read as `0`.
    pub fn value(&self) -> f64 {
        let parsed = match self {
            UnitPrice::Number(value) => *value,
            UnitPrice::Text(text) => leading_number(text).unwrap_or(0.0),
        };
        if parsed.is_finite() && parsed > 0.0 {
            parsed
        } else {
            0.0
        }
    }

    /// Reads an optional price, treating absence as `0`.
    pub fn or_zero(price: Option<&UnitPrice>) -> f64 {
        price.map(UnitPrice::value).unwrap_or(0.0)
    }
}

/// Reads the numeric prefix of `text`, so `"100 SAR"` is `100`.
fn leading_number(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let digits_from = |mut at: usize| {
        while at < bytes.len() && bytes[at].is_ascii_digit() {
            at += 1;
        }
        at
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_end = digits_from(end);
    let mut seen_digits = int_end > end;
    end = int_end;
    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        seen_digits |= frac_end > end + 1;
        end = frac_end;
    }
    if !seen_digits {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }
    text[..end].parse::<f64>().ok()
}

impl From<f64> for UnitPrice {
    fn from(value: f64) -> Self {
        UnitPrice::Number(value)
    }
}

/// A single piece of equipment on a rental.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RentalItem {
    /// Identifier used to match timesheet aggregates to this item.
    #[serde(default)]
    pub id: String,
    /// Equipment name, used in invoice line descriptions.
    pub name: Option<String>,
    /// Free-text notes.  When present they replace the generated
    /// invoice line description.
    pub notes: Option<String>,
    #[serde(default)]
    pub rate_type: RateType,
    pub unit_price: Option<UnitPrice>,
    /// Day the item went out on rent.
    pub start_date: Option<NaiveDate>,
    /// Day the item came back, if it has.
    pub completed_date: Option<NaiveDate>,
}

impl RentalItem {
    pub fn unit_price(&self) -> f64 {
        UnitPrice::or_zero(self.unit_price.as_ref())
    }
}

/// The rental agreement an item belongs to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rental {
    #[serde(default)]
    pub rental_number: String,
    /// Lifecycle status as stored upstream (`active`, `approved`,
    /// `completed`, ...).  Only `completed` affects billing.
    #[serde(default)]
    pub status: String,
    /// Billing start for items that carry no start date of their own.
    pub start_date: Option<NaiveDate>,
    pub expected_end_date: Option<NaiveDate>,
    /// Explicit invoice period override set by an operator.
    pub custom_from: Option<NaiveDate>,
    pub custom_to: Option<NaiveDate>,
    /// Pre-computed rental total, billed as a single line when the
    /// rental has no items.
    pub total_amount: Option<UnitPrice>,
}

impl Rental {
    pub fn is_completed(&self) -> bool {
        self.status.eq_ignore_ascii_case("completed")
    }

    /// The operator override range, only when both ends are set.
    pub fn custom_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.custom_from, self.custom_to) {
            (Some(from), Some(to)) => Some((from, to)),
            _ => None,
        }
    }
}

/// The date range an invoice line is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BillingWindow {
    /// A calendar month, `month` in `1..=12`.
    Month { year: i32, month: u32 },
    /// An explicit inclusive date range.
    Range { from: NaiveDate, to: NaiveDate },
}

impl BillingWindow {
    /// First and last day covered by the window.  Returns `None` for a
    /// month that does not exist.
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        match *self {
            BillingWindow::Month { year, month } => crate::window::month_bounds(year, month),
            BillingWindow::Range { from, to } => Some((from, to)),
        }
    }
}

/// Hours logged against one rental item within the billing window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TimesheetAggregate {
    /// Whether the timesheet for the window has been confirmed.
    #[serde(default)]
    pub received: bool,
    /// Regular plus overtime hours.
    #[serde(default)]
    pub total_hours: f64,
}

/// Which rule produced a line's quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityBasis {
    /// Confirmed timesheet hours.
    Timesheet,
    /// Length of the effective billing window.
    Period,
    /// Fixed rental total for a rental without items.
    Flat,
}

/// The computed quantity, unit and price for one invoice line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BillingLine {
    pub quantity: f64,
    pub unit_of_measure: UnitOfMeasure,
    pub rate: f64,
    pub amount: f64,
    pub basis: QuantityBasis,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_rate_type_reads_as_daily() {
        let item: RentalItem = serde_json::from_value(json!({"rate_type": "fortnightly"})).unwrap();
        assert_eq!(item.rate_type, RateType::Daily);
        let item: RentalItem = serde_json::from_value(json!({"rate_type": null})).unwrap();
        assert_eq!(item.rate_type, RateType::Daily);
        let item: RentalItem = serde_json::from_value(json!({})).unwrap();
        assert_eq!(item.rate_type, RateType::Daily);
        let item: RentalItem = serde_json::from_value(json!({"rate_type": "weekly"})).unwrap();
        assert_eq!(item.rate_type, RateType::Weekly);
    }

    #[test]
    fn unit_price_accepts_numbers_and_strings() {
        let item: RentalItem = serde_json::from_value(json!({"unit_price": "1250.50"})).unwrap();
        assert_eq!(item.unit_price(), 1250.5);
        let item: RentalItem = serde_json::from_value(json!({"unit_price": 80})).unwrap();
        assert_eq!(item.unit_price(), 80.0);
        let item: RentalItem = serde_json::from_value(json!({"unit_price": "n/a"})).unwrap();
        assert_eq!(item.unit_price(), 0.0);
        assert_eq!(RentalItem::default().unit_price(), 0.0);
        assert_eq!(UnitPrice::Number(-5.0).value(), 0.0);
        assert_eq!(UnitPrice::Text("NaN".into()).value(), 0.0);
    }

    #[test]
    fn unit_price_reads_leading_number() {
        assert_eq!(UnitPrice::Text("100 SAR".into()).value(), 100.0);
        assert_eq!(UnitPrice::Text(" 1250.00 ".into()).value(), 1250.0);
        assert_eq!(UnitPrice::Text("12.5e1kg".into()).value(), 125.0);
        assert_eq!(UnitPrice::Text("7e".into()).value(), 7.0);
        assert_eq!(UnitPrice::Text(".5".into()).value(), 0.5);
        assert_eq!(UnitPrice::Text("SAR 100".into()).value(), 0.0);
        assert_eq!(UnitPrice::Text("-40 SAR".into()).value(), 0.0);
        assert_eq!(UnitPrice::Text(".".into()).value(), 0.0);
    }

    #[test]
    fn custom_range_needs_both_ends() {
        let mut rental = Rental {
            custom_from: NaiveDate::from_ymd_opt(2024, 6, 1),
            ..Rental::default()
        };
        assert_eq!(rental.custom_range(), None);
        rental.custom_to = NaiveDate::from_ymd_opt(2024, 6, 15);
        assert!(rental.custom_range().is_some());
    }

    #[test]
    fn month_window_bounds() {
        let window: BillingWindow =
            serde_json::from_value(json!({"kind": "month", "year": 2024, "month": 2})).unwrap();
        assert_eq!(
            window.bounds(),
            Some((
                NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
            ))
        );
        assert_eq!(BillingWindow::Month { year: 2024, month: 13 }.bounds(), None);
    }
}
