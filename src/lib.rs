//! Rental billing library crate.
//!
//! This crate computes invoice lines for equipment rentals: how many
//! hours, days, weeks or months to bill for an item over a billing
//! window, at what rate, and for how much.  External applications may
//! call [`calculator::BillingPeriodCalculator`] directly, assemble a
//! full invoice with [`invoice::build_invoice`], or embed the HTTP
//! surface via [`api::build_router`].

pub mod api;
pub mod calculator;
pub mod config;
pub mod error;
pub mod invoice;
pub mod models;
pub mod periods;
pub mod tax;
pub mod window;

pub use calculator::BillingPeriodCalculator;
pub use error::{BillingError, Result};
