//! Entry point for the rental billing binary.
//!
//! Running this binary starts an HTTP server exposing the billing
//! calculator.  A TOML configuration file may be named with the
//! `RENTAL_BILLING_CONFIG` environment variable; individual settings
//! can be overridden with `RENTAL_BILLING_*` variables.

use rental_billing::config::BillingConfig;
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::var_os("RENTAL_BILLING_CONFIG").map(PathBuf::from);
    let config = BillingConfig::load(config_path.as_deref())?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(err) = rental_billing::api::serve(&config).await {
        error!("Error running server: {}", err);
        return Err(err);
    }
    Ok(())
}
