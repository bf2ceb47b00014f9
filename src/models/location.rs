use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A fuzzy-deduplicated geographic point. Immutable once created; the
/// matcher guarantees no two rows lie within the match radius of each other
/// (for sequential writers).
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub location_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    /// Reported measurement radius in meters, when the client supplied one.
    pub accuracy: Option<f64>,
}
