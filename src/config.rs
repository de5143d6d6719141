//! Service configuration.
//!
//! Values are layered: built-in defaults, then an optional TOML file,
//! then `RENTAL_BILLING_*` environment variables.

use crate::error::Result;
use crate::tax::FlatVat;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ENV_PREFIX: &str = "RENTAL_BILLING_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    pub bind_addr: String,
    /// `tracing_subscriber::EnvFilter` directive, used when `RUST_LOG`
    /// is unset.
    pub log_filter: String,
    pub vat_rate_percent: f64,
    pub vat_account_head: String,
}

impl Default for BillingConfig {
    fn default() -> Self {
        let vat = FlatVat::default();
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            log_filter: "rental_billing=info".to_string(),
            vat_rate_percent: vat.rate_percent,
            vat_account_head: vat.account_head,
        }
    }
}

impl BillingConfig {
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(BillingConfig::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        Ok(Self::figment(path).extract()?)
    }

    pub fn vat(&self) -> FlatVat {
        FlatVat::new(self.vat_rate_percent, self.vat_account_head.clone())
    }
}
