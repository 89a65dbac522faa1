// src/config.rs

use bonushub_common::Error;

/// Engine-wide knobs, constructed once at startup and threaded through
/// by constructor injection. No process-wide singletons.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Fallback approval threshold when a template does not set one.
    /// `None` disables the tenant default (only templates gate approvals).
    pub default_approval_threshold: Option<f64>,
    /// How long a pending approval token stays redeemable.
    pub approval_window_hours: i64,
    /// Default bonus lifetime when a template does not override it.
    pub default_expiration_days: i64,
    /// Interval for the expiry sweep task.
    pub expiry_sweep_interval_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_approval_threshold: Some(1000.0),
            approval_window_hours: 24,
            default_expiration_days: 30,
            expiry_sweep_interval_secs: 3600,
        }
    }
}

impl EngineConfig {
    /// Read overrides from the environment (loading `.env` first), falling
    /// back to defaults for anything unset.
    pub fn from_env() -> Result<Self, Error> {
        dotenv::dotenv().ok();

        let mut cfg = EngineConfig::default();
        if let Ok(v) = std::env::var("BONUS_APPROVAL_THRESHOLD") {
            cfg.default_approval_threshold = Some(
                v.parse::<f64>()
                    .map_err(|e| Error::Config(format!("BONUS_APPROVAL_THRESHOLD: {e}")))?,
            );
        }
        if let Ok(v) = std::env::var("BONUS_APPROVAL_WINDOW_HOURS") {
            cfg.approval_window_hours = v
                .parse::<i64>()
                .map_err(|e| Error::Config(format!("BONUS_APPROVAL_WINDOW_HOURS: {e}")))?;
        }
        if let Ok(v) = std::env::var("BONUS_DEFAULT_EXPIRATION_DAYS") {
            cfg.default_expiration_days = v
                .parse::<i64>()
                .map_err(|e| Error::Config(format!("BONUS_DEFAULT_EXPIRATION_DAYS: {e}")))?;
        }
        if let Ok(v) = std::env::var("BONUS_EXPIRY_SWEEP_INTERVAL_SECS") {
            cfg.expiry_sweep_interval_secs = v
                .parse::<u64>()
                .map_err(|e| Error::Config(format!("BONUS_EXPIRY_SWEEP_INTERVAL_SECS: {e}")))?;
        }
        Ok(cfg)
    }
}
