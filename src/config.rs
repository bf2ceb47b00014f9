use anyhow::Result;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;

/// Fuzzy location matching tunables.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct GeoSettings {
    /// Half-width of the bounding-box pre-filter, in degrees of lat/lon.
    /// 0.00018 degrees is roughly 15-20 meters at typical latitudes.
    pub box_delta_deg: f64,
    /// Canonical match radius in meters.
    pub match_radius_m: f64,
    /// Wider radius used by the place-enrichment lookups.
    pub place_match_radius_m: f64,
}

impl Default for GeoSettings {
    fn default() -> Self {
        Self {
            box_delta_deg: 0.00018,
            match_radius_m: 15.0,
            place_match_radius_m: 20.0,
        }
    }
}

/// Signal classification band boundaries in dBm, inclusive lower bounds.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct SignalThresholds {
    pub excellent_dbm: f64,
    pub good_dbm: f64,
    pub weak_dbm: f64,
    /// Low-signal alerting cutoff: dBm at or below this is low.
    pub low_dbm: f64,
    /// Low-signal alerting cutoff: coarse level (0-4) at or below this is low.
    pub low_level: i16,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            excellent_dbm: -70.0,
            good_dbm: -85.0,
            weak_dbm: -100.0,
            low_dbm: -100.0,
            low_level: 1,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct PingSettings {
    /// Liveness writes are skipped while the previous ping is younger than this.
    pub quiescence_secs: i64,
}

impl Default for PingSettings {
    fn default() -> Self {
        Self {
            quiescence_secs: 300,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub log_level: String,
    pub notify_webhook_url: String,
    pub place_api_url: String,
    pub place_api_key: String,
    pub geo: GeoSettings,
    pub signal: SignalThresholds,
    pub ping: PingSettings,
}

fn env_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_i64(key: &str, default: i64) -> i64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let db_host = env::var("DB_HOST").unwrap_or_else(|_| "localhost".to_string());
        let db_port = env::var("DB_PORT").unwrap_or_else(|_| "5432".to_string());
        let db_name = env::var("DB_DATABASE").unwrap_or_else(|_| "linkwatch".to_string());
        let db_user = env::var("DB_USER").unwrap_or_else(|_| "linkwatch".to_string());
        let db_pwd = env::var("DB_PWD").unwrap_or_else(|_| "linkwatch".to_string());

        let database_url = format!(
            "postgres://{}:{}@{}:{}/{}",
            db_user, db_pwd, db_host, db_port, db_name
        );

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let notify_webhook_url = env::var("NOTIFY_WEBHOOK_URL")
            .unwrap_or_else(|_| "http://localhost:8085/notify".to_string());
        let place_api_url = env::var("PLACE_API_URL")
            .unwrap_or_else(|_| "https://places.googleapis.com/v1/places:searchText".to_string());
        let place_api_key = env::var("PLACE_API_KEY").unwrap_or_default();

        let geo_defaults = GeoSettings::default();
        let geo = GeoSettings {
            box_delta_deg: env_f64("GEO_BOX_DELTA_DEG", geo_defaults.box_delta_deg),
            match_radius_m: env_f64("GEO_MATCH_RADIUS_M", geo_defaults.match_radius_m),
            place_match_radius_m: env_f64(
                "PLACE_MATCH_RADIUS_M",
                geo_defaults.place_match_radius_m,
            ),
        };

        let sig_defaults = SignalThresholds::default();
        let signal = SignalThresholds {
            excellent_dbm: env_f64("SIGNAL_EXCELLENT_DBM", sig_defaults.excellent_dbm),
            good_dbm: env_f64("SIGNAL_GOOD_DBM", sig_defaults.good_dbm),
            weak_dbm: env_f64("SIGNAL_WEAK_DBM", sig_defaults.weak_dbm),
            low_dbm: env_f64("SIGNAL_LOW_DBM", sig_defaults.low_dbm),
            low_level: env_i64("SIGNAL_LOW_LEVEL", sig_defaults.low_level as i64) as i16,
        };

        let ping = PingSettings {
            quiescence_secs: env_i64(
                "PING_QUIESCENCE_SECS",
                PingSettings::default().quiescence_secs,
            ),
        };

        Ok(Self {
            database_url,
            log_level,
            notify_webhook_url,
            place_api_url,
            place_api_key,
            geo,
            signal,
            ping,
        })
    }
}
