//! In-memory `Store` used by the test suite. Also serves as the reference
//! semantics for the conditional alert transition: the PENDING check and the
//! status write share one mutex guard, mirroring the single conditional
//! UPDATE of the Postgres store.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::CoreResult;
use crate::models::{
    Alert, AlertModeConfig, AlertStatus, CellularSignalReading, ConnectivitySample, ContactType,
    Device, EmergencyContact, Location, NewAlert, NewCellularSignalReading, NewConnectivitySample,
};

use super::{GeoBox, ResolveOutcome, Store};

#[derive(Default)]
struct Inner {
    devices: HashMap<Uuid, Device>,
    locations: Vec<Location>,
    readings: HashMap<Uuid, CellularSignalReading>,
    samples: Vec<ConnectivitySample>,
    alerts: HashMap<Uuid, Alert>,
    alert_modes: HashMap<Uuid, AlertModeConfig>,
    contacts: Vec<EmergencyContact>,
    user_emails: HashMap<Uuid, String>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Seeding helpers for tests; the production write path never touches
    // devices, modes, contacts, or users directly.

    pub fn seed_device(&self, user_id: Option<Uuid>, name: &str) -> Device {
        let device = Device {
            device_id: Uuid::new_v4(),
            user_id,
            name: name.to_string(),
            last_pinged: None,
        };
        self.inner
            .lock()
            .unwrap()
            .devices
            .insert(device.device_id, device.clone());
        device
    }

    pub fn seed_last_pinged(&self, device_id: Uuid, at: Option<DateTime<Utc>>) {
        if let Some(d) = self.inner.lock().unwrap().devices.get_mut(&device_id) {
            d.last_pinged = at;
        }
    }

    pub fn seed_alert_mode(&self, user_id: Uuid, key: &str) {
        self.inner.lock().unwrap().alert_modes.insert(
            user_id,
            AlertModeConfig {
                user_id,
                key: key.to_string(),
            },
        );
    }

    pub fn seed_contact(
        &self,
        user_id: Uuid,
        contact_type: ContactType,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> EmergencyContact {
        let contact = EmergencyContact {
            contact_id: Uuid::new_v4(),
            user_id,
            name: "contact".to_string(),
            phone: phone.map(str::to_string),
            email: email.map(str::to_string),
            contact_type: contact_type.as_str().to_string(),
        };
        self.inner.lock().unwrap().contacts.push(contact.clone());
        contact
    }

    pub fn seed_user_email(&self, user_id: Uuid, email: &str) {
        self.inner
            .lock()
            .unwrap()
            .user_emails
            .insert(user_id, email.to_string());
    }

    pub fn location_count(&self) -> usize {
        self.inner.lock().unwrap().locations.len()
    }

    pub fn alert_count(&self) -> usize {
        self.inner.lock().unwrap().alerts.len()
    }

    pub fn sample_count(&self) -> usize {
        self.inner.lock().unwrap().samples.len()
    }

    pub fn alert(&self, alert_id: Uuid) -> Option<Alert> {
        self.inner.lock().unwrap().alerts.get(&alert_id).cloned()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn device(&self, device_id: Uuid) -> CoreResult<Option<Device>> {
        Ok(self.inner.lock().unwrap().devices.get(&device_id).cloned())
    }

    async fn set_device_last_pinged(
        &self,
        device_id: Uuid,
        at: DateTime<Utc>,
    ) -> CoreResult<()> {
        if let Some(d) = self.inner.lock().unwrap().devices.get_mut(&device_id) {
            d.last_pinged = Some(at);
        }
        Ok(())
    }

    async fn locations_in_box(&self, bounds: GeoBox) -> CoreResult<Vec<Location>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .locations
            .iter()
            .filter(|l| {
                l.latitude >= bounds.min_lat
                    && l.latitude <= bounds.max_lat
                    && l.longitude >= bounds.min_lon
                    && l.longitude <= bounds.max_lon
            })
            .cloned()
            .collect())
    }

    async fn insert_location(
        &self,
        latitude: f64,
        longitude: f64,
        accuracy: Option<f64>,
    ) -> CoreResult<Location> {
        let location = Location {
            location_id: Uuid::new_v4(),
            latitude,
            longitude,
            accuracy,
        };
        self.inner.lock().unwrap().locations.push(location.clone());
        Ok(location)
    }

    async fn insert_signal_reading(
        &self,
        reading: NewCellularSignalReading,
    ) -> CoreResult<CellularSignalReading> {
        let row = CellularSignalReading {
            reading_id: Uuid::new_v4(),
            carrier: reading.carrier,
            network_generation: reading.network_generation,
            signal_level: reading.signal_level,
            signal_dbm: reading.signal_dbm,
            asu_level: reading.asu_level,
            mcc: reading.mcc,
            mnc: reading.mnc,
            recorded_at: Utc::now(),
        };
        self.inner
            .lock()
            .unwrap()
            .readings
            .insert(row.reading_id, row.clone());
        Ok(row)
    }

    async fn insert_sample(
        &self,
        sample: NewConnectivitySample,
    ) -> CoreResult<ConnectivitySample> {
        let row = ConnectivitySample {
            sample_id: Uuid::new_v4(),
            device_id: sample.device_id,
            connectivity_type: sample.connectivity_type.as_str().to_string(),
            connected: sample.connected,
            ip: sample.ip,
            ssid: sample.ssid,
            bssid: sample.bssid,
            location_id: sample.location_id,
            signal_reading_id: sample.signal_reading_id,
            recorded_at: Utc::now(),
        };
        self.inner.lock().unwrap().samples.push(row.clone());
        Ok(row)
    }

    async fn readings_at_location(
        &self,
        location_id: Uuid,
    ) -> CoreResult<Vec<CellularSignalReading>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .samples
            .iter()
            .filter(|s| s.location_id == Some(location_id))
            .filter_map(|s| s.signal_reading_id)
            .filter_map(|id| inner.readings.get(&id).cloned())
            .collect())
    }

    async fn insert_alert(&self, alert: NewAlert) -> CoreResult<Alert> {
        let row = Alert {
            alert_id: Uuid::new_v4(),
            user_id: alert.user_id,
            device_id: alert.device_id,
            sample_id: alert.sample_id,
            alert_type: alert.alert_type.as_str().to_string(),
            message: alert.message,
            status: AlertStatus::Pending.as_str().to_string(),
            mechanism: alert.mechanism.as_str().to_string(),
            resolved_at: None,
            created_at: Utc::now(),
        };
        self.inner
            .lock()
            .unwrap()
            .alerts
            .insert(row.alert_id, row.clone());
        Ok(row)
    }

    async fn resolve_alert(
        &self,
        alert_id: Uuid,
        user_id: Uuid,
        to: AlertStatus,
        resolved_at: DateTime<Utc>,
    ) -> CoreResult<ResolveOutcome> {
        let mut inner = self.inner.lock().unwrap();
        match inner.alerts.get_mut(&alert_id) {
            Some(alert) if alert.user_id == user_id => {
                if alert.status != AlertStatus::Pending.as_str() {
                    return Ok(ResolveOutcome::AlreadyHandled);
                }
                alert.status = to.as_str().to_string();
                alert.resolved_at = Some(resolved_at);
                Ok(ResolveOutcome::Resolved(alert.clone()))
            }
            // Foreign alerts answer exactly like missing ones.
            Some(_) | None => Ok(ResolveOutcome::NotFound),
        }
    }

    async fn alert_mode(&self, user_id: Uuid) -> CoreResult<Option<AlertModeConfig>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .alert_modes
            .get(&user_id)
            .cloned())
    }

    async fn first_emergency_contact(
        &self,
        user_id: Uuid,
    ) -> CoreResult<Option<EmergencyContact>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .contacts
            .iter()
            .find(|c| c.user_id == user_id && c.contact_type == ContactType::Emergency.as_str())
            .cloned())
    }

    async fn user_email(&self, user_id: Uuid) -> CoreResult<Option<String>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .user_emails
            .get(&user_id)
            .cloned())
    }
}
