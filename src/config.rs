//! Environment-driven configuration, following the teacher's
//! `Config::from_env()` convention (see the old data-ingestion binary).

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub db_max_connections: u32,

    /// How far apart two comparables' "seen" timestamps can drift before
    /// the older one is considered stale for KNN purposes, in days.
    pub listing_staleness_days: i64,
    pub transaction_staleness_days: i64,

    /// Refresh interval for the in-memory region polygon cache.
    pub region_cache_refresh_secs: u64,

    /// Engine constants, overridable without a recompile.
    pub listing_bargain_discount: f64,
    pub transaction_bargain_discount: f64,
    pub renovation_multiplier: f64,
    pub bank_flip_target_rate: f64,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Ok(Settings {
            database_url: std::env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("DB_MAX_CONNECTIONS must be a valid integer")?,
            listing_staleness_days: std::env::var("LISTING_STALENESS_DAYS")
                .unwrap_or_else(|_| "90".to_string())
                .parse()
                .context("LISTING_STALENESS_DAYS must be a valid integer")?,
            transaction_staleness_days: std::env::var("TRANSACTION_STALENESS_DAYS")
                .unwrap_or_else(|_| "365".to_string())
                .parse()
                .context("TRANSACTION_STALENESS_DAYS must be a valid integer")?,
            region_cache_refresh_secs: std::env::var("REGION_CACHE_REFRESH_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .context("REGION_CACHE_REFRESH_SECS must be a valid integer")?,
            listing_bargain_discount: std::env::var("LISTING_BARGAIN_DISCOUNT")
                .unwrap_or_else(|_| "0.07".to_string())
                .parse()
                .context("LISTING_BARGAIN_DISCOUNT must be a valid number")?,
            transaction_bargain_discount: std::env::var("TRANSACTION_BARGAIN_DISCOUNT")
                .unwrap_or_else(|_| "0.0".to_string())
                .parse()
                .context("TRANSACTION_BARGAIN_DISCOUNT must be a valid number")?,
            renovation_multiplier: std::env::var("RENOVATION_MULTIPLIER")
                .unwrap_or_else(|_| "1.8".to_string())
                .parse()
                .context("RENOVATION_MULTIPLIER must be a valid number")?,
            bank_flip_target_rate: std::env::var("BANK_FLIP_TARGET_RATE")
                .unwrap_or_else(|_| "0.24".to_string())
                .parse()
                .context("BANK_FLIP_TARGET_RATE must be a valid number")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_only_database_url_set() {
        std::env::set_var("DATABASE_URL", "postgres://localhost/test");
        std::env::remove_var("DB_MAX_CONNECTIONS");
        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.db_max_connections, 10);
        assert!((settings.renovation_multiplier - 1.8).abs() < 1e-9);
        assert!((settings.bank_flip_target_rate - 0.24).abs() < 1e-9);
    }
}
