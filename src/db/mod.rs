use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use crate::error::CoreResult;
use crate::models::{
    Alert, AlertModeConfig, AlertStatus, CellularSignalReading, ConnectivitySample, Device,
    EmergencyContact, Location, NewAlert, NewCellularSignalReading, NewConnectivitySample,
};
use crate::store::{GeoBox, ResolveOutcome, Store};

pub mod queries;

pub type DbPool = Pool<Postgres>;

pub async fn init_pool(database_url: &str) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(50)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Postgres-backed `Store`.
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn device(&self, device_id: Uuid) -> CoreResult<Option<Device>> {
        let device = sqlx::query_as::<_, Device>(queries::SELECT_DEVICE)
            .bind(device_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(device)
    }

    async fn set_device_last_pinged(
        &self,
        device_id: Uuid,
        at: DateTime<Utc>,
    ) -> CoreResult<()> {
        sqlx::query(queries::UPDATE_DEVICE_LAST_PINGED)
            .bind(device_id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn locations_in_box(&self, bounds: GeoBox) -> CoreResult<Vec<Location>> {
        let rows = sqlx::query_as::<_, Location>(queries::SELECT_LOCATIONS_IN_BOX)
            .bind(bounds.min_lat)
            .bind(bounds.max_lat)
            .bind(bounds.min_lon)
            .bind(bounds.max_lon)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn insert_location(
        &self,
        latitude: f64,
        longitude: f64,
        accuracy: Option<f64>,
    ) -> CoreResult<Location> {
        let row = sqlx::query_as::<_, Location>(queries::INSERT_LOCATION)
            .bind(Uuid::new_v4())
            .bind(latitude)
            .bind(longitude)
            .bind(accuracy)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert_signal_reading(
        &self,
        reading: NewCellularSignalReading,
    ) -> CoreResult<CellularSignalReading> {
        let row = sqlx::query_as::<_, CellularSignalReading>(queries::INSERT_SIGNAL_READING)
            .bind(Uuid::new_v4())
            .bind(reading.carrier)
            .bind(reading.network_generation)
            .bind(reading.signal_level)
            .bind(reading.signal_dbm)
            .bind(reading.asu_level)
            .bind(reading.mcc)
            .bind(reading.mnc)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert_sample(
        &self,
        sample: NewConnectivitySample,
    ) -> CoreResult<ConnectivitySample> {
        let row = sqlx::query_as::<_, ConnectivitySample>(queries::INSERT_SAMPLE)
            .bind(Uuid::new_v4())
            .bind(sample.device_id)
            .bind(sample.connectivity_type.as_str())
            .bind(sample.connected)
            .bind(sample.ip)
            .bind(sample.ssid)
            .bind(sample.bssid)
            .bind(sample.location_id)
            .bind(sample.signal_reading_id)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn readings_at_location(
        &self,
        location_id: Uuid,
    ) -> CoreResult<Vec<CellularSignalReading>> {
        let rows =
            sqlx::query_as::<_, CellularSignalReading>(queries::SELECT_READINGS_AT_LOCATION)
                .bind(location_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }

    async fn insert_alert(&self, alert: NewAlert) -> CoreResult<Alert> {
        let row = sqlx::query_as::<_, Alert>(queries::INSERT_ALERT)
            .bind(Uuid::new_v4())
            .bind(alert.user_id)
            .bind(alert.device_id)
            .bind(alert.sample_id)
            .bind(alert.alert_type.as_str())
            .bind(alert.message)
            .bind(alert.mechanism.as_str())
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn resolve_alert(
        &self,
        alert_id: Uuid,
        user_id: Uuid,
        to: AlertStatus,
        resolved_at: DateTime<Utc>,
    ) -> CoreResult<ResolveOutcome> {
        let updated = sqlx::query_as::<_, Alert>(queries::RESOLVE_ALERT)
            .bind(alert_id)
            .bind(user_id)
            .bind(to.as_str())
            .bind(resolved_at)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(alert) = updated {
            return Ok(ResolveOutcome::Resolved(alert));
        }

        // Zero rows: either resolved already, or not visible to this user.
        let visible = sqlx::query(queries::SELECT_ALERT_OWNED)
            .bind(alert_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        match visible {
            Some(_) => Ok(ResolveOutcome::AlreadyHandled),
            None => Ok(ResolveOutcome::NotFound),
        }
    }

    async fn alert_mode(&self, user_id: Uuid) -> CoreResult<Option<AlertModeConfig>> {
        let row = sqlx::query_as::<_, AlertModeConfig>(queries::SELECT_ALERT_MODE)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn first_emergency_contact(
        &self,
        user_id: Uuid,
    ) -> CoreResult<Option<EmergencyContact>> {
        let row =
            sqlx::query_as::<_, EmergencyContact>(queries::SELECT_FIRST_EMERGENCY_CONTACT)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row)
    }

    async fn user_email(&self, user_id: Uuid) -> CoreResult<Option<String>> {
        let row = sqlx::query(queries::SELECT_USER_EMAIL)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.and_then(|r| r.try_get::<Option<String>, _>("email").ok().flatten()))
    }
}
