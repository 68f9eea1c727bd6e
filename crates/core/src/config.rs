use std::env;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_i64(key: &str, default: i64) -> i64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// True when `PRICEWATCH_ENV=production`; selects the slower tick
    /// cadence and larger refresh batches.
    pub production: bool,
    pub engine: EngineConfig,
    pub alerts: AlertConfig,
    pub smtp: SmtpConfig,
    pub catalog: CatalogConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        let production = env_or("PRICEWATCH_ENV", "").eq_ignore_ascii_case("production");
        Self {
            production,
            engine: EngineConfig::from_env(production),
            alerts: AlertConfig::from_env(),
            smtp: SmtpConfig::from_env(),
            catalog: CatalogConfig::from_env(),
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!(
            "Config loaded (env: {}):",
            if self.production { "production" } else { "development" }
        );
        tracing::info!(
            "  engine:   tick={}s, max_updates={}, discovery_cadence={}, floor={}",
            self.engine.tick_interval_secs,
            self.engine.max_updates_per_run,
            self.engine.discovery_cadence,
            self.engine.min_product_floor,
        );
        tracing::info!(
            "  alerts:   cooldown={}h, rate_limit={}/{}s",
            self.alerts.cooldown_default_hours,
            self.alerts.rate_limit_quota,
            self.alerts.rate_limit_window_secs,
        );
        tracing::info!(
            "  smtp:     host={}, port={}, from={}",
            self.smtp.host,
            self.smtp.port.map(|p| p.to_string()).unwrap_or_else(|| "(default)".into()),
            self.smtp.from,
        );
        tracing::info!(
            "  catalog:  base_url={}, auth={}",
            self.catalog.base_url,
            if self.catalog.api_key.is_some() { "configured" } else { "(none)" },
        );
    }
}

// ── Engine / scheduler ────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seconds between scheduler ticks. 4 hours in production, 5 minutes
    /// in fast-iteration mode.
    pub tick_interval_secs: u64,
    /// Maximum products refreshed per tick, oldest `last_checked` first.
    pub max_updates_per_run: usize,
    /// Discovery runs when `tick % cadence == 1` (6 in production, 5 otherwise).
    pub discovery_cadence: u64,
    /// Discovery runs unconditionally while the tracked pool is below this.
    pub min_product_floor: usize,
    /// Delay between successive external catalog calls within a tick.
    pub api_call_delay_ms: u64,
    /// Search terms discovery cycles through.
    pub search_terms: Vec<String>,
    /// Search terms consumed per discovery run.
    pub max_search_terms_per_tick: usize,
    /// Result limit passed to each catalog search.
    pub search_result_limit: usize,
}

impl EngineConfig {
    fn from_env(production: bool) -> Self {
        let (tick_default, updates_default, cadence_default) =
            if production { (14_400, 20, 6) } else { (300, 3, 5) };
        let search_terms = env_or(
            "DISCOVERY_SEARCH_TERMS",
            "electronics,kitchen,headphones,home office,toys",
        )
        .split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
        Self {
            tick_interval_secs: env_u64("TICK_INTERVAL_SECS", tick_default),
            max_updates_per_run: env_usize("MAX_UPDATES_PER_RUN", updates_default),
            discovery_cadence: env_u64("DISCOVERY_CADENCE", cadence_default),
            min_product_floor: env_usize("MIN_PRODUCT_FLOOR", 10),
            api_call_delay_ms: env_u64("API_CALL_DELAY_MS", 1_000),
            search_terms,
            max_search_terms_per_tick: env_usize("MAX_SEARCH_TERMS_PER_TICK", 3),
            search_result_limit: env_usize("SEARCH_RESULT_LIMIT", 10),
        }
    }
}

// ── Alerts ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Default cooldown when `ALERT_COOLDOWN_HOURS` is unset. The live
    /// value is re-read per evaluator invocation via `EnvSettings`.
    pub cooldown_default_hours: i64,
    /// Alert emails allowed per recipient per window.
    pub rate_limit_quota: u32,
    pub rate_limit_window_secs: i64,
}

impl AlertConfig {
    fn from_env() -> Self {
        Self {
            cooldown_default_hours: env_i64("ALERT_COOLDOWN_HOURS", 72),
            rate_limit_quota: env_u64("ALERT_RATE_LIMIT_QUOTA", 3) as u32,
            rate_limit_window_secs: env_i64("ALERT_RATE_LIMIT_WINDOW_SECS", 3_600),
        }
    }
}

// ── SMTP ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: Option<u16>,
    pub tls: Option<bool>,
    /// Sender address for alert emails.
    pub from: String,
}

impl SmtpConfig {
    fn from_env() -> Self {
        Self {
            host: env_or("SMTP_HOST", "localhost"),
            port: env_opt("SMTP_PORT").and_then(|v| v.parse().ok()),
            tls: env_opt("SMTP_TLS").map(|v| v == "true"),
            from: env_or("SMTP_FROM", "Price Watch <alerts@pricewatch.local>"),
        }
    }
}

// ── Catalog API ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl CatalogConfig {
    fn from_env() -> Self {
        Self {
            base_url: env_or("CATALOG_BASE_URL", "http://localhost:8080"),
            api_key: env_opt("CATALOG_API_KEY"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_defaults() {
        std::env::remove_var("PRICEWATCH_ENV");
        std::env::remove_var("TICK_INTERVAL_SECS");
        std::env::remove_var("MAX_UPDATES_PER_RUN");
        std::env::remove_var("DISCOVERY_CADENCE");

        let config = Config::from_env();
        assert!(!config.production);
        assert_eq!(config.engine.tick_interval_secs, 300);
        assert_eq!(config.engine.max_updates_per_run, 3);
        assert_eq!(config.engine.discovery_cadence, 5);
        assert_eq!(config.engine.min_product_floor, 10);
        assert_eq!(config.alerts.rate_limit_quota, 3);
    }

    #[test]
    fn search_terms_are_trimmed() {
        std::env::set_var("DISCOVERY_SEARCH_TERMS", " laptops , , usb hubs ");
        let config = EngineConfig::from_env(false);
        assert_eq!(config.search_terms, vec!["laptops", "usb hubs"]);
        std::env::remove_var("DISCOVERY_SEARCH_TERMS");
    }
}
