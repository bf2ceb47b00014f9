use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertStatus {
    Pending,
    Confirmed,
    Dismissed,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Pending => "pending",
            AlertStatus::Confirmed => "confirmed",
            AlertStatus::Dismissed => "dismissed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(AlertStatus::Pending),
            "confirmed" => Some(AlertStatus::Confirmed),
            "dismissed" => Some(AlertStatus::Dismissed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    LowSignal,
    HighLatency,
    DeviceDisconnect,
    BatteryLow,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::LowSignal => "low_signal",
            AlertType::HighLatency => "high_latency",
            AlertType::DeviceDisconnect => "device_disconnect",
            AlertType::BatteryLow => "battery_low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertMechanism {
    Automatic,
    Manual,
}

impl AlertMechanism {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertMechanism::Automatic => "automatic",
            AlertMechanism::Manual => "manual",
        }
    }
}

/// Dispatch policy derived from the user's configured alert mode. A missing
/// row or an unrecognized key both land on `Unconfigured`, making the
/// no-alert fallthrough a representable state instead of a default branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertPolicy {
    Automatic,
    Manual,
    Unconfigured,
}

impl AlertPolicy {
    pub fn from_mode_key(key: Option<&str>) -> Self {
        match key {
            Some("automatic") => AlertPolicy::Automatic,
            Some("manual") => AlertPolicy::Manual,
            Some(_) | None => AlertPolicy::Unconfigured,
        }
    }
}

/// A detected anomaly requiring attention. Only the manual mechanism
/// materializes one; it starts PENDING and moves exactly once to CONFIRMED
/// or DISMISSED, stamping `resolved_at`.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub alert_id: Uuid,
    pub user_id: Uuid,
    pub device_id: Uuid,
    pub sample_id: Option<Uuid>,
    pub alert_type: String,
    pub message: String,
    pub status: String,
    pub mechanism: String,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    pub fn status(&self) -> Option<AlertStatus> {
        AlertStatus::parse(&self.status)
    }
}

#[derive(Debug, Clone)]
pub struct NewAlert {
    pub user_id: Uuid,
    pub device_id: Uuid,
    pub sample_id: Option<Uuid>,
    pub alert_type: AlertType,
    pub message: String,
    pub mechanism: AlertMechanism,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_from_mode_key() {
        assert_eq!(
            AlertPolicy::from_mode_key(Some("automatic")),
            AlertPolicy::Automatic
        );
        assert_eq!(
            AlertPolicy::from_mode_key(Some("manual")),
            AlertPolicy::Manual
        );
        assert_eq!(
            AlertPolicy::from_mode_key(Some("carrier_pigeon")),
            AlertPolicy::Unconfigured
        );
        assert_eq!(AlertPolicy::from_mode_key(None), AlertPolicy::Unconfigured);
    }

    #[test]
    fn status_round_trip() {
        for s in [
            AlertStatus::Pending,
            AlertStatus::Confirmed,
            AlertStatus::Dismissed,
        ] {
            assert_eq!(AlertStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(AlertStatus::parse("resolved"), None);
    }
}
