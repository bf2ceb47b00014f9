use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactType {
    Emergency,
    Favorite,
}

impl ContactType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactType::Emergency => "emergency",
            ContactType::Favorite => "favorite",
        }
    }
}

/// A user's designated notification target. The dispatcher only ever reads
/// EMERGENCY-type contacts.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    pub contact_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub contact_type: String,
}

/// The alert mode a user selected. `key` is an open string in storage; the
/// core folds it into an `AlertPolicy`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AlertModeConfig {
    pub user_id: Uuid,
    pub key: String,
}
