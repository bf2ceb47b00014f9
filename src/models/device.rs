use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub device_id: Uuid,
    /// Null when the owning user was removed; the device row is preserved.
    pub user_id: Option<Uuid>,
    pub name: String,
    pub last_pinged: Option<DateTime<Utc>>,
}
