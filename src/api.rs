//! HTTP API for the rental billing engine.
//!
//! This module exposes a minimal REST API around the calculator using
//! the [`axum`](https://crates.io/crates/axum) framework.  Clients can
//! price a single line, assemble a whole invoice, or list the monthly
//! periods still to be billed for a rental.  Requests may pin `now`
//! (or `today`); otherwise the server clock is read once per request.

use crate::calculator::BillingPeriodCalculator;
use crate::config::BillingConfig;
use crate::error::BillingError;
use crate::invoice::{build_invoice, Invoice, InvoiceRequest};
use crate::models::{BillingLine, BillingWindow, Rental, RentalItem, TimesheetAggregate};
use crate::periods::{monthly_periods, MonthlyPeriod};
use crate::tax::TaxCalculator;
use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// Application state shared across requests.
pub struct AppState {
    pub tax: Arc<dyn TaxCalculator>,
}

#[derive(Debug, Deserialize)]
pub struct LineRequest {
    pub item: RentalItem,
    #[serde(default)]
    pub rental: Rental,
    pub window: Option<BillingWindow>,
    pub timesheet: Option<TimesheetAggregate>,
    pub now: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize)]
pub struct InvoiceBody {
    #[serde(flatten)]
    pub request: InvoiceRequest,
    pub now: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize)]
pub struct PeriodsRequest {
    pub rental_number: String,
    pub start_date: NaiveDate,
    pub expected_end_date: Option<NaiveDate>,
    pub last_invoice_date: Option<NaiveDate>,
    pub today: Option<NaiveDate>,
}

impl IntoResponse for BillingError {
    fn into_response(self) -> Response {
        let status = match self {
            BillingError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({"error": self.to_string()}))).into_response()
    }
}

/// Build the API router from the loaded configuration.
pub fn build_router(config: &BillingConfig) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState {
        tax: Arc::new(config.vat()),
    });
    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/api/billing/line", post(line_handler))
        .route("/api/billing/invoice", post(invoice_handler))
        .route("/api/billing/periods", post(periods_handler))
        .with_state(state.clone());
    (router, state)
}

fn calculator_at(now: Option<NaiveDateTime>) -> BillingPeriodCalculator {
    BillingPeriodCalculator::new(now.unwrap_or_else(|| Local::now().naive_local()))
}

/// A calendar month window has to name a real month.  The calculator
/// would ignore it; over HTTP the caller is told instead.
fn validate_window(window: Option<&BillingWindow>) -> Result<(), BillingError> {
    match window {
        Some(window @ BillingWindow::Month { year, month }) if window.bounds().is_none() => {
            Err(BillingError::InvalidRequest(format!(
                "{year}-{month:02} is not a calendar month"
            )))
        }
        _ => Ok(()),
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// Handler for POST /api/billing/line
async fn line_handler(Json(body): Json<LineRequest>) -> Result<Json<BillingLine>, BillingError> {
    validate_window(body.window.as_ref())?;
    let line = calculator_at(body.now).compute(
        &body.item,
        &body.rental,
        body.window.as_ref(),
        body.timesheet.as_ref(),
    );
    Ok(Json(line))
}

/// Handler for POST /api/billing/invoice
async fn invoice_handler(
    State(app_state): State<Arc<AppState>>,
    Json(body): Json<InvoiceBody>,
) -> Result<Json<Invoice>, BillingError> {
    validate_window(body.request.window.as_ref())?;
    let calculator = calculator_at(body.now);
    let tax = app_state.tax.clone();
    // Line computation fans out on rayon; keep it off the async workers.
    let invoice = tokio::task::spawn_blocking(move || {
        build_invoice(&body.request, &calculator, tax.as_ref())
    })
    .await
    .map_err(|err| BillingError::Io(std::io::Error::other(err)))?;
    Ok(Json(invoice))
}

/// Handler for POST /api/billing/periods
async fn periods_handler(Json(body): Json<PeriodsRequest>) -> Json<Vec<MonthlyPeriod>> {
    let today = body.today.unwrap_or_else(|| Local::now().date_naive());
    Json(monthly_periods(
        &body.rental_number,
        body.start_date,
        body.expected_end_date,
        body.last_invoice_date,
        today,
    ))
}

/// Launch the API server.  Binds to the configured address and runs
/// until interrupted with Ctrl-C.
pub async fn serve(config: &BillingConfig) -> Result<()> {
    let (router, _state) = build_router(config);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .map_err(BillingError::from)?;
    info!(addr = %config.bind_addr, "rental billing server listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;
    Ok(())
}
