pub mod config;
pub mod error;
pub mod routes;
pub mod telemetry;

use std::sync::Arc;
use std::time::Duration;

use alfafin_core::Expenses;
use alfafin_gas::GasClient;
use alfafin_parse::{PurchaseBuilder, TemplateSet};
use alfafin_rates::{CbrDailySource, CurrencyConverter, RateProvider};
use anyhow::Context;

use config::Config;

pub struct AppState {
    pub builder: PurchaseBuilder,
    pub expenses: Expenses,
    pub gas: Option<GasClient>,
    pub admin: Option<String>,
}

impl AppState {
    pub fn new(builder: PurchaseBuilder) -> Self {
        let expenses = Expenses::new(builder.timezone());
        Self { builder, expenses, gas: None, admin: None }
    }

    pub fn with_gas(mut self, gas: GasClient) -> Self {
        self.gas = Some(gas);
        self
    }

    pub fn with_admin(mut self, admin: impl Into<String>) -> Self {
        self.admin = Some(admin.into());
        self
    }

    pub fn is_allowed(&self, sender: Option<&str>) -> bool {
        match &self.admin {
            Some(admin) => sender == Some(admin.as_str()),
            None => true,
        }
    }
}

pub fn load_templates(config: &Config) -> anyhow::Result<TemplateSet> {
    match &config.templates {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read templates from {}", path.display()))?;
            let templates = TemplateSet::from_toml(&content)?;
            tracing::info!(path = %path.display(), count = templates.len(), "Loaded templates");
            for (index, t) in templates.iter().enumerate() {
                tracing::debug!(index, pattern = t.pattern(), operation = %t.operation(), "Template");
            }
            Ok(templates)
        }
        None => Ok(TemplateSet::alfabank()?),
    }
}

pub fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let tz = config.home_timezone()?;
    let templates = load_templates(config)?;
    let source = CbrDailySource::new(&config.rates_url)?;
    let rates = Arc::new(RateProvider::new(source, tz));
    let builder = PurchaseBuilder::new(templates, CurrencyConverter::new(rates));

    let mut state = AppState::new(builder);
    if let Some(gas) = config.gas() {
        tracing::info!(url = %gas.url, "Shipping purchases to the remote ledger");
        state = state.with_gas(GasClient::new(gas)?);
    }
    if let Some(admin) = &config.admin {
        state = state.with_admin(admin.clone());
    }
    Ok(Arc::new(state))
}

/// Keeps the current rate table fresh. Failures are logged and retried on the
/// next tick.
pub fn spawn_rates_refresh(rates: Arc<RateProvider>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            if let Err(e) = rates.refresh().await {
                tracing::error!(error = %e, "Currency rates refresh failed");
            }
        }
    })
}
