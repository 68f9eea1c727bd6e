//! Runtime-tunable settings port.
//!
//! The evaluator reads the cooldown once per invocation rather than once
//! at startup, so operators can adjust it without restarting the worker.

/// Source of the alert cooldown setting.
pub trait SettingsSource: Send + Sync {
    /// Minimum hours between successive alerts for one subscription.
    fn cooldown_hours(&self) -> i64;
}

/// Default cooldown when no override is configured.
pub const DEFAULT_COOLDOWN_HOURS: i64 = 72;

/// Reads `ALERT_COOLDOWN_HOURS` from the environment on every call,
/// falling back to a configured default.
pub struct EnvSettings {
    default_hours: i64,
}

impl EnvSettings {
    pub fn new(default_hours: i64) -> Self {
        Self { default_hours }
    }
}

impl Default for EnvSettings {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN_HOURS)
    }
}

impl SettingsSource for EnvSettings {
    fn cooldown_hours(&self) -> i64 {
        std::env::var("ALERT_COOLDOWN_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|h| *h > 0)
            .unwrap_or(self.default_hours)
    }
}

/// Fixed cooldown, for tests and deterministic replay.
pub struct FixedSettings(pub i64);

impl SettingsSource for FixedSettings {
    fn cooldown_hours(&self) -> i64 {
        self.0
    }
}
