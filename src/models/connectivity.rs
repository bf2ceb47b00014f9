use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectivityType {
    Wifi,
    Mobile,
    None,
}

impl ConnectivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectivityType::Wifi => "wifi",
            ConnectivityType::Mobile => "mobile",
            ConnectivityType::None => "none",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "wifi" => Some(ConnectivityType::Wifi),
            "mobile" => Some(ConnectivityType::Mobile),
            "none" => Some(ConnectivityType::None),
            _ => None,
        }
    }
}

/// One point-in-time connectivity observation. Written once per ping or
/// disconnect event, never mutated by the core. References its Location and
/// CellularSignalReading by id; it owns neither.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ConnectivitySample {
    pub sample_id: Uuid,
    pub device_id: Uuid,
    pub connectivity_type: String,
    pub connected: bool,
    pub ip: Option<String>,
    pub ssid: Option<String>,
    pub bssid: Option<String>,
    pub location_id: Option<Uuid>,
    pub signal_reading_id: Option<Uuid>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewConnectivitySample {
    pub device_id: Uuid,
    pub connectivity_type: ConnectivityType,
    pub connected: bool,
    pub ip: Option<String>,
    pub ssid: Option<String>,
    pub bssid: Option<String>,
    pub location_id: Option<Uuid>,
    pub signal_reading_id: Option<Uuid>,
}

/// Cellular measurement captured alongside a sample. Immutable after insert.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CellularSignalReading {
    pub reading_id: Uuid,
    pub carrier: Option<String>,
    pub network_generation: Option<String>,
    /// Coarse platform level, 0 (none) to 4 (great).
    pub signal_level: Option<i16>,
    pub signal_dbm: Option<f64>,
    pub asu_level: Option<i16>,
    pub mcc: Option<String>,
    pub mnc: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewCellularSignalReading {
    pub carrier: Option<String>,
    pub network_generation: Option<String>,
    pub signal_level: Option<i16>,
    pub signal_dbm: Option<f64>,
    pub asu_level: Option<i16>,
    pub mcc: Option<String>,
    pub mnc: Option<String>,
}
