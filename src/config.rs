use dotenvy::dotenv;
use eyre::Result;
use std::env;
use tracing::info;

use crate::aggregator::{Metric, Mode};

pub const DEFAULT_API_URL: &str = "https://api.auto.fun/api/tokens";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,          // token listing endpoint
    pub proxies: Vec<String>,     // prefixes tried before the direct URL
    pub fetch_limit: u32,
    pub fetch_timeout_secs: u64,
    pub refresh_secs: u64,        // 0 = render once and exit
    pub chart_metric: Metric,
    pub chart_mode: Mode,
    pub sort_key: String,
    pub table_rows: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    /// Build from any key lookup; unset or unparseable values use defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let parsed = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_url = parsed("TOKEN_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let proxies = parsed("TOKEN_API_PROXIES")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let fetch_limit = parsed("FETCH_LIMIT").and_then(|v| v.parse().ok()).unwrap_or(1000);

        let fetch_timeout_secs = parsed("FETCH_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(15);

        let refresh_secs = parsed("REFRESH_SECS").and_then(|v| v.parse().ok()).unwrap_or(0);

        let chart_metric = parsed("CHART_METRIC")
            .and_then(|v| v.parse().ok())
            .unwrap_or(Metric::Tokens);

        let chart_mode = parsed("CHART_MODE")
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();

        let sort_key = parsed("SORT_KEY").unwrap_or_else(|| "marketCapUSD".to_string());

        let table_rows = parsed("TABLE_ROWS").and_then(|v| v.parse().ok()).unwrap_or(50);

        Self {
            api_url,
            proxies,
            fetch_limit,
            fetch_timeout_secs,
            refresh_secs,
            chart_metric,
            chart_mode,
            sort_key,
            table_rows,
        }
    }
}

pub fn load() -> Result<Config> {
    dotenv().ok(); // .env is optional

    let cfg = Config::from_lookup(|key| env::var(key).ok());

    info!("Loaded config: {:?}", cfg);

    Ok(cfg)
}
