use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use alfafin_gas::GasConfig;
use chrono_tz::Tz;
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "alfafin-server", version, about = "Bank notification expense tracker")]
pub struct Config {
    /// HTTP bind address
    #[arg(long = "listen", env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen_addr: SocketAddr,

    /// Only this sender may post messages and query
    #[arg(long, env = "ADMIN")]
    pub admin: Option<String>,

    /// IANA home timezone for embedded dates and day buckets
    #[arg(long, env = "HOME_TIMEZONE", default_value = "Europe/Moscow")]
    pub timezone: String,

    /// TOML file replacing the built-in template list
    #[arg(long, env = "TEMPLATES_FILE")]
    pub templates: Option<PathBuf>,

    /// Base URL of the daily currency rate source
    #[arg(long, env = "RATES_URL", default_value = alfafin_rates::cbr::DEFAULT_BASE_URL)]
    pub rates_url: String,

    /// Seconds between refreshes of the current rates
    #[arg(long, env = "RATES_REFRESH_SECS", default_value_t = 3600)]
    pub rates_refresh_secs: u64,

    /// Remote ledger web-app URL, shipping is off without it
    #[arg(long, env = "GAS_URL")]
    pub gas_url: Option<String>,

    #[arg(long, env = "GAS_CLIENT_ID", default_value = "")]
    pub gas_client_id: String,

    #[arg(long, env = "GAS_CLIENT_SECRET", default_value = "", hide_env_values = true)]
    pub gas_client_secret: String,
}

impl Config {
    pub fn home_timezone(&self) -> anyhow::Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("Invalid timezone {:?}: {e}", self.timezone))
    }

    pub fn rates_refresh(&self) -> Duration {
        Duration::from_secs(self.rates_refresh_secs.max(1))
    }

    pub fn gas(&self) -> Option<GasConfig> {
        self.gas_url.as_ref().map(|url| GasConfig {
            url: url.clone(),
            client_id: self.gas_client_id.clone(),
            client_secret: self.gas_client_secret.clone(),
        })
    }
}
