//! End-to-end exercises of the ping -> classify -> persist -> dispatch
//! pipeline over the in-memory store.

use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use linkwatch::alert::AlertDispatcher;
use linkwatch::carrier::CarrierSignalAggregator;
use linkwatch::config::{GeoSettings, PingSettings, SignalThresholds};
use linkwatch::error::{CoreError, CoreResult};
use linkwatch::geo::GeoMatcher;
use linkwatch::models::{
    AlertStatus, ContactType, Identity, NewCellularSignalReading, NewConnectivitySample,
};
use linkwatch::models::ConnectivityType;
use linkwatch::notify::Notifier;
use linkwatch::ping::{ConnectivityPingService, PingRequest, LOW_SIGNAL_WARNING};
use linkwatch::place::{Place, PlaceLookup, PlaceService};
use linkwatch::signal::{SignalClassifier, SignalQuality};
use linkwatch::store::memory::MemoryStore;
use linkwatch::store::Store;

#[derive(Default)]
struct RecordingNotifier {
    emails: Mutex<Vec<(String, String, String)>>,
}

impl RecordingNotifier {
    fn sent(&self) -> Vec<(String, String, String)> {
        self.emails.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> CoreResult<()> {
        self.emails
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }

    async fn send_sms(&self, _phone: &str, _message: &str) -> CoreResult<()> {
        Ok(())
    }
}

/// Notifier whose relay is down; every email attempt fails upstream.
struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send_email(&self, _to: &str, _subject: &str, _body: &str) -> CoreResult<()> {
        Err(CoreError::Upstream("email relay returned 502".to_string()))
    }

    async fn send_sms(&self, _phone: &str, _message: &str) -> CoreResult<()> {
        Ok(())
    }
}

struct StubPlaceLookup {
    places: Vec<Place>,
}

#[async_trait]
impl PlaceLookup for StubPlaceLookup {
    async fn search(&self, _input_text: &str) -> CoreResult<Vec<Place>> {
        Ok(self.places.clone())
    }
}

fn ping_service() -> ConnectivityPingService {
    ConnectivityPingService::new(
        PingSettings::default(),
        GeoMatcher::new(GeoSettings::default()),
        SignalClassifier::new(SignalThresholds::default()),
        AlertDispatcher::new(),
    )
}

fn low_signal_request() -> PingRequest {
    PingRequest {
        signal_dbm: Some(-110.0),
        signal_level: Some(1),
        carrier: Some("Vodafone".to_string()),
        network_generation: Some("4G".to_string()),
        latitude: Some(30.04440),
        longitude: Some(31.23570),
        ..Default::default()
    }
}

#[tokio::test]
async fn geo_matcher_deduplicates_within_radius() {
    let store = MemoryStore::new();
    let matcher = GeoMatcher::new(GeoSettings::default());

    let first = matcher
        .find_or_create(&store, 30.04440, 31.23570, None)
        .await
        .unwrap();
    // About 1.4 m away: must resolve to the same row.
    let second = matcher
        .find_or_create(&store, 30.04441, 31.23571, Some(5.0))
        .await
        .unwrap();
    assert_eq!(first.location_id, second.location_id);
    assert_eq!(store.location_count(), 1);

    // Over 500 m away: a new row.
    let third = matcher
        .find_or_create(&store, 30.05000, 31.24000, None)
        .await
        .unwrap();
    assert_ne!(first.location_id, third.location_id);
    assert_eq!(store.location_count(), 2);
}

#[tokio::test]
async fn manual_mode_ping_creates_pending_alert_and_confirm_resolves_it() {
    let store = MemoryStore::new();
    let notifier = RecordingNotifier::default();
    let service = ping_service();
    let dispatcher = AlertDispatcher::new();

    let user_id = Uuid::new_v4();
    let identity = Identity::user(user_id);
    let device = store.seed_device(Some(user_id), "phone");
    store.seed_alert_mode(user_id, "manual");
    store.seed_user_email(user_id, "owner@example.com");

    let response = service
        .ping(&store, &notifier, &identity, device.device_id, low_signal_request())
        .await
        .unwrap();

    assert_eq!(response.warning, Some(LOW_SIGNAL_WARNING));
    let pending = response.pending_alert.expect("manual mode yields an alert");
    assert_eq!(pending.status(), Some(AlertStatus::Pending));
    assert_eq!(pending.alert_type, "low_signal");
    assert_eq!(pending.mechanism, "manual");
    assert!(pending.sample_id.is_some());
    assert_eq!(store.alert_count(), 1);
    // No notification at creation time under the manual mechanism.
    assert!(notifier.sent().is_empty());

    let confirmed = dispatcher
        .confirm(&store, &notifier, &identity, pending.alert_id)
        .await
        .unwrap();
    assert_eq!(confirmed.status(), Some(AlertStatus::Confirmed));
    assert!(confirmed.resolved_at.is_some());
    assert_eq!(notifier.sent().len(), 1);
    assert_eq!(notifier.sent()[0].0, "owner@example.com");
    assert_eq!(notifier.sent()[0].2, LOW_SIGNAL_WARNING);

    // Terminal: neither transition may run twice.
    let again = dispatcher
        .confirm(&store, &notifier, &identity, pending.alert_id)
        .await;
    let err = again.unwrap_err();
    assert!(matches!(err, CoreError::AlreadyHandled));
    assert!(err.is_client_error());
    let dismissed = dispatcher.dismiss(&store, &identity, pending.alert_id).await;
    assert!(matches!(dismissed, Err(CoreError::AlreadyHandled)));

    let stored = store.alert(pending.alert_id).unwrap();
    assert_eq!(stored.status(), Some(AlertStatus::Confirmed));
    assert_eq!(stored.resolved_at, confirmed.resolved_at);
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test]
async fn dismiss_sends_no_notification() {
    let store = MemoryStore::new();
    let notifier = RecordingNotifier::default();
    let service = ping_service();
    let dispatcher = AlertDispatcher::new();

    let user_id = Uuid::new_v4();
    let identity = Identity::user(user_id);
    let device = store.seed_device(Some(user_id), "phone");
    store.seed_alert_mode(user_id, "manual");

    let response = service
        .ping(&store, &notifier, &identity, device.device_id, low_signal_request())
        .await
        .unwrap();
    let pending = response.pending_alert.unwrap();

    let dismissed = dispatcher
        .dismiss(&store, &identity, pending.alert_id)
        .await
        .unwrap();
    assert_eq!(dismissed.status(), Some(AlertStatus::Dismissed));
    assert!(dismissed.resolved_at.is_some());
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn automatic_mode_notifies_without_creating_an_alert() {
    let store = MemoryStore::new();
    let notifier = RecordingNotifier::default();
    let service = ping_service();

    let user_id = Uuid::new_v4();
    let identity = Identity::user(user_id);
    let device = store.seed_device(Some(user_id), "phone");
    store.seed_alert_mode(user_id, "automatic");
    store.seed_user_email(user_id, "owner@example.com");
    store.seed_contact(
        user_id,
        ContactType::Emergency,
        Some("contact@example.com"),
        Some("+201000000000"),
    );

    let response = service
        .ping(&store, &notifier, &identity, device.device_id, low_signal_request())
        .await
        .unwrap();

    assert_eq!(response.warning, Some(LOW_SIGNAL_WARNING));
    assert!(response.pending_alert.is_none());
    assert_eq!(store.alert_count(), 0);
    // Exactly one email, to the emergency contact rather than the owner.
    assert_eq!(notifier.sent().len(), 1);
    assert_eq!(notifier.sent()[0].0, "contact@example.com");
}

#[tokio::test]
async fn automatic_mode_falls_back_to_account_email() {
    let store = MemoryStore::new();
    let notifier = RecordingNotifier::default();
    let service = ping_service();

    let user_id = Uuid::new_v4();
    let identity = Identity::user(user_id);
    let device = store.seed_device(Some(user_id), "phone");
    store.seed_alert_mode(user_id, "automatic");
    store.seed_user_email(user_id, "owner@example.com");
    // A favorite contact must not be picked as recipient.
    store.seed_contact(user_id, ContactType::Favorite, Some("friend@example.com"), None);

    service
        .ping(&store, &notifier, &identity, device.device_id, low_signal_request())
        .await
        .unwrap();

    assert_eq!(notifier.sent().len(), 1);
    assert_eq!(notifier.sent()[0].0, "owner@example.com");
}

#[tokio::test]
async fn unconfigured_mode_warns_but_raises_nothing() {
    let store = MemoryStore::new();
    let notifier = RecordingNotifier::default();
    let service = ping_service();

    let user_id = Uuid::new_v4();
    let identity = Identity::user(user_id);
    let device = store.seed_device(Some(user_id), "phone");
    store.seed_alert_mode(user_id, "smoke_signals");

    let response = service
        .ping(&store, &notifier, &identity, device.device_id, low_signal_request())
        .await
        .unwrap();

    assert_eq!(response.warning, Some(LOW_SIGNAL_WARNING));
    assert!(response.pending_alert.is_none());
    assert_eq!(store.alert_count(), 0);
    assert!(notifier.sent().is_empty());
    // Telemetry is still persisted before dispatch is consulted.
    assert_eq!(store.sample_count(), 1);
}

#[tokio::test]
async fn healthy_ping_records_no_telemetry() {
    let store = MemoryStore::new();
    let notifier = RecordingNotifier::default();
    let service = ping_service();

    let user_id = Uuid::new_v4();
    let identity = Identity::user(user_id);
    let device = store.seed_device(Some(user_id), "phone");
    store.seed_alert_mode(user_id, "manual");

    let response = service
        .ping(
            &store,
            &notifier,
            &identity,
            device.device_id,
            PingRequest {
                signal_dbm: Some(-60.0),
                signal_level: Some(4),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(response.status, "ok");
    assert!(response.warning.is_none());
    assert!(response.pending_alert.is_none());
    assert_eq!(store.sample_count(), 0);
    assert_eq!(store.alert_count(), 0);
    // Liveness still updates on a healthy ping.
    assert!(response.last_pinged.is_some());
}

#[tokio::test]
async fn liveness_respects_quiescence_window() {
    let store = MemoryStore::new();
    let notifier = RecordingNotifier::default();
    let service = ping_service();

    let user_id = Uuid::new_v4();
    let identity = Identity::user(user_id);
    let device = store.seed_device(Some(user_id), "phone");

    let recent = chrono::Utc::now() - chrono::Duration::seconds(30);
    store.seed_last_pinged(device.device_id, Some(recent));

    let response = service
        .ping(&store, &notifier, &identity, device.device_id, PingRequest::default())
        .await
        .unwrap();
    // Under five minutes old: the stored value is reported back unchanged.
    assert_eq!(response.last_pinged, Some(recent));

    let stale = chrono::Utc::now() - chrono::Duration::seconds(600);
    store.seed_last_pinged(device.device_id, Some(stale));
    let response = service
        .ping(&store, &notifier, &identity, device.device_id, PingRequest::default())
        .await
        .unwrap();
    assert!(response.last_pinged.unwrap() > stale);
}

#[tokio::test]
async fn foreign_device_and_foreign_alert_answer_not_found() {
    let store = MemoryStore::new();
    let notifier = RecordingNotifier::default();
    let service = ping_service();
    let dispatcher = AlertDispatcher::new();

    let owner_id = Uuid::new_v4();
    let owner = Identity::user(owner_id);
    let stranger = Identity::user(Uuid::new_v4());
    let device = store.seed_device(Some(owner_id), "phone");
    store.seed_alert_mode(owner_id, "manual");

    let result = service
        .ping(&store, &notifier, &stranger, device.device_id, PingRequest::default())
        .await;
    assert!(matches!(result, Err(CoreError::NotFound("device"))));

    let pending = service
        .ping(&store, &notifier, &owner, device.device_id, low_signal_request())
        .await
        .unwrap()
        .pending_alert
        .unwrap();

    let result = dispatcher
        .confirm(&store, &notifier, &stranger, pending.alert_id)
        .await;
    assert!(matches!(result, Err(CoreError::NotFound("alert"))));
    // Untouched by the stranger's attempt.
    assert_eq!(
        store.alert(pending.alert_id).unwrap().status(),
        Some(AlertStatus::Pending)
    );
}

#[tokio::test]
async fn confirm_keeps_transition_when_notification_fails() {
    let store = MemoryStore::new();
    let notifier = RecordingNotifier::default();
    let service = ping_service();
    let dispatcher = AlertDispatcher::new();

    let user_id = Uuid::new_v4();
    let identity = Identity::user(user_id);
    let device = store.seed_device(Some(user_id), "phone");
    store.seed_alert_mode(user_id, "manual");
    store.seed_user_email(user_id, "owner@example.com");

    let pending = service
        .ping(&store, &notifier, &identity, device.device_id, low_signal_request())
        .await
        .unwrap()
        .pending_alert
        .unwrap();

    let result = dispatcher
        .confirm(&store, &FailingNotifier, &identity, pending.alert_id)
        .await;
    let err = result.unwrap_err();
    assert!(matches!(err, CoreError::Upstream(_)));
    // Delivery failure is a server-side error, not the caller's fault.
    assert!(!err.is_client_error());

    // The transition committed before the delivery attempt and stays put.
    let stored = store.alert(pending.alert_id).unwrap();
    assert_eq!(stored.status(), Some(AlertStatus::Confirmed));
    assert!(stored.resolved_at.is_some());

    // A retry against the now-resolved alert is a state conflict.
    let again = dispatcher
        .confirm(&store, &notifier, &identity, pending.alert_id)
        .await;
    assert!(matches!(again, Err(CoreError::AlreadyHandled)));
}

#[tokio::test]
async fn disconnect_report_persists_a_sample_without_alerting() {
    let store = MemoryStore::new();
    let service = ping_service();

    let user_id = Uuid::new_v4();
    let identity = Identity::user(user_id);
    let device = store.seed_device(Some(user_id), "laptop");
    store.seed_alert_mode(user_id, "manual");

    service
        .record_disconnect(
            &store,
            &identity,
            device.device_id,
            linkwatch::ping::DisconnectReport {
                connectivity_type: ConnectivityType::Wifi,
                ip: Some("10.0.0.17".to_string()),
                ssid: Some("office".to_string()),
                bssid: None,
                latitude: Some(30.04440),
                longitude: Some(31.23570),
                accuracy: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(store.sample_count(), 1);
    assert_eq!(store.alert_count(), 0);
    assert_eq!(store.location_count(), 1);
}

async fn seed_carrier_history(store: &MemoryStore, lat: f64, lon: f64) -> Uuid {
    let matcher = GeoMatcher::new(GeoSettings::default());
    let location = matcher.find_or_create(store, lat, lon, None).await.unwrap();
    let device_id = Uuid::new_v4();

    for (carrier, dbm) in [("Vodafone", -80.0), ("vodafone", -90.0), ("VODAFONE", -100.0)] {
        let reading = store
            .insert_signal_reading(NewCellularSignalReading {
                carrier: Some(carrier.to_string()),
                signal_dbm: Some(dbm),
                ..Default::default()
            })
            .await
            .unwrap();
        store
            .insert_sample(NewConnectivitySample {
                device_id,
                connectivity_type: ConnectivityType::Mobile,
                connected: false,
                ip: None,
                ssid: None,
                bssid: None,
                location_id: Some(location.location_id),
                signal_reading_id: Some(reading.reading_id),
            })
            .await
            .unwrap();
    }

    // A reading without a carrier must be ignored by the aggregation.
    let orphan = store
        .insert_signal_reading(NewCellularSignalReading {
            carrier: None,
            signal_dbm: Some(-55.0),
            ..Default::default()
        })
        .await
        .unwrap();
    store
        .insert_sample(NewConnectivitySample {
            device_id,
            connectivity_type: ConnectivityType::Mobile,
            connected: true,
            ip: None,
            ssid: None,
            bssid: None,
            location_id: Some(location.location_id),
            signal_reading_id: Some(orphan.reading_id),
        })
        .await
        .unwrap();

    location.location_id
}

#[tokio::test]
async fn aggregator_groups_by_uppercased_carrier() {
    let store = MemoryStore::new();
    seed_carrier_history(&store, 30.04440, 31.23570).await;

    let matcher = GeoMatcher::new(GeoSettings::default());
    let classifier = SignalClassifier::new(SignalThresholds::default());
    let aggregator = CarrierSignalAggregator::new(&matcher, &classifier);

    let summaries = aggregator
        .aggregate_by_carrier(&store, 30.04440, 31.23570, 15.0)
        .await
        .unwrap();

    assert_eq!(summaries.len(), 1);
    let vodafone = &summaries[0];
    assert_eq!(vodafone.carrier, "VODAFONE");
    assert_eq!(vodafone.avg_dbm, -90.0);
    assert_eq!(vodafone.quality, SignalQuality::Weak);
    assert_eq!(vodafone.samples, 3);
}

#[tokio::test]
async fn aggregator_is_match_only() {
    let store = MemoryStore::new();
    let matcher = GeoMatcher::new(GeoSettings::default());
    let classifier = SignalClassifier::new(SignalThresholds::default());
    let aggregator = CarrierSignalAggregator::new(&matcher, &classifier);

    let summaries = aggregator
        .aggregate_by_carrier(&store, 30.04440, 31.23570, 15.0)
        .await
        .unwrap();
    assert!(summaries.is_empty());
    assert_eq!(store.location_count(), 0);
}

#[tokio::test]
async fn find_place_enriches_and_filters() {
    let store = MemoryStore::new();
    seed_carrier_history(&store, 30.04440, 31.23570).await;

    let service = PlaceService::new(
        GeoSettings::default(),
        GeoMatcher::new(GeoSettings::default()),
        SignalClassifier::new(SignalThresholds::default()),
    );
    let lookup = StubPlaceLookup {
        places: vec![Place {
            name: "Cafe Riche".to_string(),
            address: Some("Downtown".to_string()),
            latitude: 30.04440,
            longitude: 31.23570,
        }],
    };

    let results = service
        .find_place(&store, &lookup, "cafe", None, None)
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].signal_by_carrier.len(), 1);
    assert_eq!(results[0].signal_by_carrier[0].carrier, "VODAFONE");

    // Case-insensitive carrier filter.
    let results = service
        .find_place(&store, &lookup, "cafe", Some("vodafone"), None)
        .await
        .unwrap();
    assert_eq!(results[0].signal_by_carrier.len(), 1);

    let results = service
        .find_place(&store, &lookup, "cafe", Some("orange"), None)
        .await
        .unwrap();
    assert!(results[0].signal_by_carrier.is_empty());

    // Minimum sample count filter.
    let results = service
        .find_place(&store, &lookup, "cafe", None, Some(4))
        .await
        .unwrap();
    assert!(results[0].signal_by_carrier.is_empty());
}

#[tokio::test]
async fn find_place_validates_input_and_reports_missing_places() {
    let store = MemoryStore::new();
    let service = PlaceService::new(
        GeoSettings::default(),
        GeoMatcher::new(GeoSettings::default()),
        SignalClassifier::new(SignalThresholds::default()),
    );

    let empty_lookup = StubPlaceLookup { places: vec![] };
    let result = service.find_place(&store, &empty_lookup, "  ", None, None).await;
    assert!(matches!(result, Err(CoreError::Validation("inputText"))));

    let result = service
        .find_place(&store, &empty_lookup, "nowhere", None, None)
        .await;
    assert!(matches!(result, Err(CoreError::NotFound("place"))));
}

#[tokio::test]
async fn responses_serialize_with_wire_field_names() {
    let store = MemoryStore::new();
    let notifier = RecordingNotifier::default();
    let service = ping_service();

    let user_id = Uuid::new_v4();
    let identity = Identity::user(user_id);
    let device = store.seed_device(Some(user_id), "phone");
    store.seed_alert_mode(user_id, "manual");

    let response = service
        .ping(&store, &notifier, &identity, device.device_id, low_signal_request())
        .await
        .unwrap();

    let body = serde_json::to_value(&response).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["warning"], LOW_SIGNAL_WARNING);
    assert!(body["lastPinged"].is_string());
    let alert = &body["pendingAlert"];
    assert_eq!(alert["status"], "pending");
    assert_eq!(alert["alertType"], "low_signal");
    assert!(alert["resolvedAt"].is_null());
    assert!(alert["sampleId"].is_string());

    // A healthy ping omits the optional fields entirely.
    let healthy = service
        .ping(
            &store,
            &notifier,
            &identity,
            device.device_id,
            PingRequest {
                signal_dbm: Some(-60.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let body = serde_json::to_value(&healthy).unwrap();
    assert!(body.get("warning").is_none());
    assert!(body.get("pendingAlert").is_none());

    seed_carrier_history(&store, 30.05000, 31.24000).await;
    let matcher = GeoMatcher::new(GeoSettings::default());
    let classifier = SignalClassifier::new(SignalThresholds::default());
    let aggregator = CarrierSignalAggregator::new(&matcher, &classifier);
    let summaries = aggregator
        .aggregate_by_carrier(&store, 30.05000, 31.24000, 15.0)
        .await
        .unwrap();

    let body = serde_json::to_value(&summaries[0]).unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "carrier": "VODAFONE",
            "avgDbm": -90.0,
            "quality": "Weak",
            "count": 3
        })
    );
}
