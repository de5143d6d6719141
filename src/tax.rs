//! Tax calculation traits and structures.
//!
//! The `tax` module defines the `TaxCalculator` trait used when an
//! invoice is assembled, and a flat VAT implementation matching the
//! single "On Net Total" row the invoicing system expects.

use serde::{Deserialize, Serialize};

/// One row of an invoice's tax table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRow {
    pub charge_type: String,
    pub account_head: String,
    pub description: String,
    /// Rate in percent, e.g. `15.0`.
    pub rate: f64,
    pub tax_amount: f64,
    /// Subtotal plus this row's tax.
    pub total: f64,
}

/// A tax calculator produces the tax rows for an invoice subtotal.
///
/// Calculators must be thread-safe (`Send + Sync`) because they are
/// shared across request handlers.
pub trait TaxCalculator: Send + Sync {
    /// Short identifier recorded on the invoice.
    fn code(&self) -> &str;
    fn rows(&self, subtotal: f64) -> Vec<TaxRow>;
}

/// Flat value added tax charged on the net total.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatVat {
    pub rate_percent: f64,
    pub account_head: String,
}

impl FlatVat {
    pub fn new(rate_percent: f64, account_head: impl Into<String>) -> Self {
        Self {
            rate_percent,
            account_head: account_head.into(),
        }
    }
}

impl Default for FlatVat {
    /// Saudi VAT at 15%.
    fn default() -> Self {
        Self::new(15.0, "VAT - SND")
    }
}

impl TaxCalculator for FlatVat {
    fn code(&self) -> &str {
        "VAT"
    }

    fn rows(&self, subtotal: f64) -> Vec<TaxRow> {
        let tax_amount = subtotal * self.rate_percent / 100.0;
        vec![TaxRow {
            charge_type: "On Net Total".to_string(),
            account_head: self.account_head.clone(),
            description: format!("Value Added Tax ({}%)", self.rate_percent),
            rate: self.rate_percent,
            tax_amount,
            total: subtotal + tax_amount,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_flat_vat_rows() {
        let rows = FlatVat::default().rows(1000.0);
        assert_eq!(
            rows,
            vec![TaxRow {
                charge_type: "On Net Total".into(),
                account_head: "VAT - SND".into(),
                description: "Value Added Tax (15%)".into(),
                rate: 15.0,
                tax_amount: 150.0,
                total: 1150.0,
            }]
        );
    }

    #[test]
    fn test_custom_rate() {
        let vat = FlatVat::new(5.0, "VAT - AE");
        let rows = vat.rows(200.0);
        assert_eq!(rows[0].tax_amount, 10.0);
        assert_eq!(rows[0].description, "Value Added Tax (5%)");
    }
}
