//! Invoice assembly.
//!
//! The `invoice` module turns an [`InvoiceRequest`] into an
//! [`Invoice`].  It uses the [`rayon`] crate to compute the line for
//! each rental item in parallel; line order follows item order.  Tax
//! rows are delegated to a [`TaxCalculator`].

use crate::calculator::BillingPeriodCalculator;
use crate::models::{
    BillingLine, BillingWindow, QuantityBasis, Rental, RentalItem, TimesheetAggregate,
    UnitOfMeasure, UnitPrice,
};
use crate::tax::{TaxCalculator, TaxRow};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Everything needed to invoice one rental for one window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvoiceRequest {
    pub rental: Rental,
    #[serde(default)]
    pub items: Vec<RentalItem>,
    pub window: Option<BillingWindow>,
    /// Timesheet aggregates keyed by rental item id.  Items without an
    /// entry are billed from dates.
    #[serde(default)]
    pub timesheets: HashMap<String, TimesheetAggregate>,
}

/// One invoice line with its display fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub item_id: String,
    pub item_name: String,
    pub description: String,
    #[serde(flatten)]
    pub billing: BillingLine,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub rental_number: String,
    pub lines: Vec<InvoiceLine>,
    pub subtotal: f64,
    pub tax_code: String,
    pub taxes: Vec<TaxRow>,
    pub tax_total: f64,
    pub grand_total: f64,
}

/// Builds the invoice for a rental.
///
/// A rental with no items is billed as a single `Nos` line priced at
/// the rental's stored total.
pub fn build_invoice(
    request: &InvoiceRequest,
    calculator: &BillingPeriodCalculator,
    tax: &dyn TaxCalculator,
) -> Invoice {
    let rental = &request.rental;
    let lines: Vec<InvoiceLine> = if request.items.is_empty() {
        vec![flat_line(rental)]
    } else {
        request
            .items
            .par_iter()
            .map(|item| {
                let billing = calculator.compute(
                    item,
                    rental,
                    request.window.as_ref(),
                    request.timesheets.get(&item.id),
                );
                let item_name = item.name.clone().unwrap_or_else(|| "Equipment".to_string());
                let description = match item.notes.as_deref().map(str::trim) {
                    Some(notes) if !notes.is_empty() => notes.to_string(),
                    _ => describe(&item_name, &billing),
                };
                InvoiceLine {
                    item_id: item.id.clone(),
                    item_name,
                    description,
                    billing,
                }
            })
            .collect()
    };

    let subtotal: f64 = lines.iter().map(|line| line.billing.amount).sum();
    let taxes = tax.rows(subtotal);
    let tax_total: f64 = taxes.iter().map(|row| row.tax_amount).sum();
    tracing::debug!(
        rental = %rental.rental_number,
        lines = lines.len(),
        subtotal,
        tax_total,
        "assembled invoice"
    );
    Invoice {
        rental_number: rental.rental_number.clone(),
        lines,
        subtotal,
        tax_code: tax.code().to_string(),
        taxes,
        tax_total,
        grand_total: subtotal + tax_total,
    }
}

/// `Rental of {name} ({quantity} {unit}s)`, singular for a quantity of one.
pub fn describe(item_name: &str, line: &BillingLine) -> String {
    let plural = if line.quantity != 1.0 && line.unit_of_measure != UnitOfMeasure::Nos {
        "s"
    } else {
        ""
    };
    format!(
        "Rental of {} ({} {}{})",
        item_name, line.quantity, line.unit_of_measure, plural
    )
}

fn flat_line(rental: &Rental) -> InvoiceLine {
    let total = UnitPrice::or_zero(rental.total_amount.as_ref());
    InvoiceLine {
        item_id: String::new(),
        item_name: format!("Rental Service - {}", rental.rental_number),
        description: format!("Equipment rental service for {}", rental.rental_number),
        billing: BillingLine {
            quantity: 1.0,
            unit_of_measure: UnitOfMeasure::Nos,
            rate: total,
            amount: total,
            basis: QuantityBasis::Flat,
        },
    }
}
