//! Wired service set handed to the transport layer.

use crate::alert::AlertDispatcher;
use crate::config::AppConfig;
use crate::db::{DbPool, PgStore};
use crate::geo::GeoMatcher;
use crate::notify::WebhookNotifier;
use crate::ping::ConnectivityPingService;
use crate::place::{HttpPlaceLookup, PlaceService};
use crate::signal::SignalClassifier;

pub struct App {
    pub store: PgStore,
    pub notifier: WebhookNotifier,
    pub place_lookup: HttpPlaceLookup,
    pub ping_service: ConnectivityPingService,
    pub place_service: PlaceService,
    pub alert_dispatcher: AlertDispatcher,
}

impl App {
    pub fn new(config: &AppConfig, pool: DbPool) -> Self {
        Self {
            store: PgStore::new(pool),
            notifier: WebhookNotifier::new(config.notify_webhook_url.clone()),
            place_lookup: HttpPlaceLookup::new(
                config.place_api_url.clone(),
                config.place_api_key.clone(),
            ),
            ping_service: ConnectivityPingService::new(
                config.ping,
                GeoMatcher::new(config.geo),
                SignalClassifier::new(config.signal),
                AlertDispatcher::new(),
            ),
            place_service: PlaceService::new(
                config.geo,
                GeoMatcher::new(config.geo),
                SignalClassifier::new(config.signal),
            ),
            alert_dispatcher: AlertDispatcher::new(),
        }
    }
}
