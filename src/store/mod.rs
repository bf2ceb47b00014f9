use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::CoreResult;
use crate::models::{
    Alert, AlertModeConfig, AlertStatus, CellularSignalReading, ConnectivitySample, Device,
    EmergencyContact, Location, NewAlert, NewCellularSignalReading, NewConnectivitySample,
};

pub mod memory;

/// Rectangular pre-filter for the location matcher.
#[derive(Debug, Clone, Copy)]
pub struct GeoBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

/// Outcome of the conditional alert transition. The check against PENDING
/// and the status write happen as one guarded update so concurrent callers
/// cannot both succeed.
#[derive(Debug, Clone)]
pub enum ResolveOutcome {
    Resolved(Alert),
    /// The alert exists and is visible to the caller but is no longer PENDING.
    AlreadyHandled,
    /// Missing, or owned by someone else; the two are indistinguishable.
    NotFound,
}

/// Persistence collaborator of the core. Implemented by `PgStore` for
/// Postgres and by `MemoryStore` for tests.
#[async_trait]
pub trait Store: Send + Sync {
    async fn device(&self, device_id: Uuid) -> CoreResult<Option<Device>>;

    async fn set_device_last_pinged(
        &self,
        device_id: Uuid,
        at: DateTime<Utc>,
    ) -> CoreResult<()>;

    async fn locations_in_box(&self, bounds: GeoBox) -> CoreResult<Vec<Location>>;

    async fn insert_location(
        &self,
        latitude: f64,
        longitude: f64,
        accuracy: Option<f64>,
    ) -> CoreResult<Location>;

    async fn insert_signal_reading(
        &self,
        reading: NewCellularSignalReading,
    ) -> CoreResult<CellularSignalReading>;

    async fn insert_sample(
        &self,
        sample: NewConnectivitySample,
    ) -> CoreResult<ConnectivitySample>;

    /// All cellular readings referenced by samples taken at the location.
    async fn readings_at_location(
        &self,
        location_id: Uuid,
    ) -> CoreResult<Vec<CellularSignalReading>>;

    async fn insert_alert(&self, alert: NewAlert) -> CoreResult<Alert>;

    /// Conditionally moves an alert out of PENDING on behalf of `user_id`.
    /// `to` must be CONFIRMED or DISMISSED.
    async fn resolve_alert(
        &self,
        alert_id: Uuid,
        user_id: Uuid,
        to: AlertStatus,
        resolved_at: DateTime<Utc>,
    ) -> CoreResult<ResolveOutcome>;

    async fn alert_mode(&self, user_id: Uuid) -> CoreResult<Option<AlertModeConfig>>;

    async fn first_emergency_contact(
        &self,
        user_id: Uuid,
    ) -> CoreResult<Option<EmergencyContact>>;

    async fn user_email(&self, user_id: Uuid) -> CoreResult<Option<String>>;
}
