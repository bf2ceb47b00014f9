//! Per-ping orchestration: liveness, signal evaluation, telemetry
//! persistence, alert dispatch.
//!
//! Ordering inside one request is load-bearing: location resolution, then
//! signal reading, then sample, then dispatch, because each later write
//! references ids produced by the earlier ones.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::alert::{AlertDispatcher, DispatchOutcome};
use crate::config::PingSettings;
use crate::error::{CoreError, CoreResult};
use crate::geo::GeoMatcher;
use crate::models::{
    Alert, ConnectivityType, Device, Identity, NewCellularSignalReading, NewConnectivitySample,
};
use crate::notify::Notifier;
use crate::signal::SignalClassifier;
use crate::store::Store;

pub const LOW_SIGNAL_WARNING: &str = "Low signal detected";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingRequest {
    pub signal_dbm: Option<f64>,
    pub signal_level: Option<i16>,
    pub carrier: Option<String>,
    pub network_generation: Option<String>,
    pub asu_level: Option<i16>,
    pub mcc: Option<String>,
    pub mnc: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub accuracy: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PingResponse {
    pub status: &'static str,
    pub last_pinged: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_alert: Option<Alert>,
}

/// A client-reported loss of connectivity, recorded as a sample.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectReport {
    pub connectivity_type: ConnectivityType,
    pub ip: Option<String>,
    pub ssid: Option<String>,
    pub bssid: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub accuracy: Option<f64>,
}

pub struct ConnectivityPingService {
    settings: PingSettings,
    matcher: GeoMatcher,
    classifier: SignalClassifier,
    dispatcher: AlertDispatcher,
}

impl ConnectivityPingService {
    pub fn new(
        settings: PingSettings,
        matcher: GeoMatcher,
        classifier: SignalClassifier,
        dispatcher: AlertDispatcher,
    ) -> Self {
        Self {
            settings,
            matcher,
            classifier,
            dispatcher,
        }
    }

    pub async fn ping<S, N>(
        &self,
        store: &S,
        notifier: &N,
        identity: &Identity,
        device_id: Uuid,
        request: PingRequest,
    ) -> CoreResult<PingResponse>
    where
        S: Store + ?Sized,
        N: Notifier + ?Sized,
    {
        let device = self.owned_device(store, identity, device_id).await?;
        let last_pinged = self.touch_liveness(store, &device).await?;

        if !self
            .classifier
            .is_low_signal(request.signal_dbm, request.signal_level)
        {
            return Ok(PingResponse {
                status: "ok",
                last_pinged,
                warning: None,
                pending_alert: None,
            });
        }

        let location_id = match (request.latitude, request.longitude) {
            (Some(lat), Some(lon)) => Some(
                self.matcher
                    .find_or_create(store, lat, lon, request.accuracy)
                    .await?
                    .location_id,
            ),
            _ => None,
        };

        let reading = store
            .insert_signal_reading(NewCellularSignalReading {
                carrier: request.carrier,
                network_generation: request.network_generation,
                signal_level: request.signal_level,
                signal_dbm: request.signal_dbm,
                asu_level: request.asu_level,
                mcc: request.mcc,
                mnc: request.mnc,
            })
            .await?;

        let sample = store
            .insert_sample(NewConnectivitySample {
                device_id,
                connectivity_type: ConnectivityType::Mobile,
                connected: false,
                ip: None,
                ssid: None,
                bssid: None,
                location_id,
                signal_reading_id: Some(reading.reading_id),
            })
            .await?;

        let outcome = self
            .dispatcher
            .dispatch_low_signal(
                store,
                notifier,
                identity.user_id,
                device_id,
                Some(sample.sample_id),
                LOW_SIGNAL_WARNING,
            )
            .await?;

        let pending_alert = match outcome {
            DispatchOutcome::Pending(alert) => Some(alert),
            DispatchOutcome::Notified | DispatchOutcome::Skipped => None,
        };

        Ok(PingResponse {
            status: "ok",
            last_pinged,
            warning: Some(LOW_SIGNAL_WARNING),
            pending_alert,
        })
    }

    /// Records a disconnect event as a sample under the same liveness rule
    /// as ping. Raises no alert.
    pub async fn record_disconnect<S: Store + ?Sized>(
        &self,
        store: &S,
        identity: &Identity,
        device_id: Uuid,
        report: DisconnectReport,
    ) -> CoreResult<()> {
        let device = self.owned_device(store, identity, device_id).await?;
        self.touch_liveness(store, &device).await?;

        let location_id = match (report.latitude, report.longitude) {
            (Some(lat), Some(lon)) => Some(
                self.matcher
                    .find_or_create(store, lat, lon, report.accuracy)
                    .await?
                    .location_id,
            ),
            _ => None,
        };

        store
            .insert_sample(NewConnectivitySample {
                device_id,
                connectivity_type: report.connectivity_type,
                connected: false,
                ip: report.ip,
                ssid: report.ssid,
                bssid: report.bssid,
                location_id,
                signal_reading_id: None,
            })
            .await?;
        info!(%device_id, "disconnect recorded");
        Ok(())
    }

    async fn owned_device<S: Store + ?Sized>(
        &self,
        store: &S,
        identity: &Identity,
        device_id: Uuid,
    ) -> CoreResult<Device> {
        let device = store
            .device(device_id)
            .await?
            .ok_or(CoreError::NotFound("device"))?;
        if !identity.owns(device.user_id) {
            // Foreign devices answer exactly like missing ones.
            return Err(CoreError::NotFound("device"));
        }
        Ok(device)
    }

    /// Updates `last_pinged` only when the previous value is absent or
    /// older than the quiescence window.
    async fn touch_liveness<S: Store + ?Sized>(
        &self,
        store: &S,
        device: &Device,
    ) -> CoreResult<Option<DateTime<Utc>>> {
        let now = Utc::now();
        let stale = match device.last_pinged {
            None => true,
            Some(prev) => now - prev > Duration::seconds(self.settings.quiescence_secs),
        };
        if stale {
            store.set_device_last_pinged(device.device_id, now).await?;
            Ok(Some(now))
        } else {
            Ok(device.last_pinged)
        }
    }
}
