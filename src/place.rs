//! Place lookup with signal enrichment: text search against a third-party
//! provider, each hit overlaid with the per-carrier signal history of the
//! matching stored location.

use async_trait::async_trait;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};

use crate::carrier::{CarrierSignalAggregator, CarrierSignalSummary};
use crate::config::GeoSettings;
use crate::error::{CoreError, CoreResult};
use crate::geo::GeoMatcher;
use crate::signal::SignalClassifier;
use crate::store::Store;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

/// Third-party place text-search collaborator.
#[async_trait]
pub trait PlaceLookup: Send + Sync {
    async fn search(&self, input_text: &str) -> CoreResult<Vec<Place>>;
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    #[serde(rename = "textQuery")]
    text_query: &'a str,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    places: Vec<ProviderPlace>,
}

#[derive(Deserialize)]
struct ProviderPlace {
    #[serde(rename = "displayName")]
    display_name: Option<ProviderText>,
    #[serde(rename = "formattedAddress")]
    formatted_address: Option<String>,
    location: Option<ProviderLatLng>,
}

#[derive(Deserialize)]
struct ProviderText {
    text: String,
}

#[derive(Deserialize)]
struct ProviderLatLng {
    latitude: f64,
    longitude: f64,
}

/// Places-API text search over HTTP.
pub struct HttpPlaceLookup {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl HttpPlaceLookup {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
        }
    }
}

#[async_trait]
impl PlaceLookup for HttpPlaceLookup {
    async fn search(&self, input_text: &str) -> CoreResult<Vec<Place>> {
        let response = self
            .client
            .post(&self.api_url)
            .header("X-Goog-Api-Key", &self.api_key)
            .header(
                "X-Goog-FieldMask",
                "places.displayName,places.formattedAddress,places.location",
            )
            .json(&SearchRequest {
                text_query: input_text,
            })
            .send()
            .await
            .map_err(|e| CoreError::Upstream(format!("place provider unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(CoreError::Upstream(format!(
                "place provider returned {}",
                response.status()
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| CoreError::Upstream(format!("place provider payload: {e}")))?;

        Ok(body
            .places
            .into_iter()
            .filter_map(|p| {
                let location = p.location?;
                Some(Place {
                    name: p.display_name.map(|t| t.text).unwrap_or_default(),
                    address: p.formatted_address,
                    latitude: location.latitude,
                    longitude: location.longitude,
                })
            })
            .collect())
    }
}

#[derive(Debug, Serialize)]
pub struct PlaceWithSignal {
    #[serde(flatten)]
    pub place: Place,
    #[serde(rename = "signalByCarrier")]
    pub signal_by_carrier: Vec<CarrierSignalSummary>,
}

pub struct PlaceService {
    geo: GeoSettings,
    matcher: GeoMatcher,
    classifier: SignalClassifier,
}

impl PlaceService {
    pub fn new(geo: GeoSettings, matcher: GeoMatcher, classifier: SignalClassifier) -> Self {
        Self {
            geo,
            matcher,
            classifier,
        }
    }

    /// Looks up places by free text and overlays historical signal
    /// statistics, optionally filtered to one carrier (case-insensitive)
    /// and a minimum per-carrier sample count.
    pub async fn find_place<S, L>(
        &self,
        store: &S,
        lookup: &L,
        input_text: &str,
        carrier: Option<&str>,
        min_signal_count: Option<usize>,
    ) -> CoreResult<Vec<PlaceWithSignal>>
    where
        S: Store + ?Sized,
        L: PlaceLookup + ?Sized,
    {
        if input_text.trim().is_empty() {
            return Err(CoreError::Validation("inputText"));
        }

        let places = lookup.search(input_text).await?;
        if places.is_empty() {
            return Err(CoreError::NotFound("place"));
        }

        let aggregator = CarrierSignalAggregator::new(&self.matcher, &self.classifier);
        let carrier_filter = carrier.map(str::to_uppercase);
        let radius = self.geo.place_match_radius_m;

        // Each place is enriched independently; run the lookups together.
        let enriched = try_join_all(places.into_iter().map(|place| {
            let aggregator = &aggregator;
            let carrier_filter = carrier_filter.as_deref();
            async move {
                let mut signal_by_carrier = aggregator
                    .aggregate_by_carrier(store, place.latitude, place.longitude, radius)
                    .await?;

                if let Some(wanted) = carrier_filter {
                    signal_by_carrier.retain(|s| s.carrier == wanted);
                }
                if let Some(min) = min_signal_count {
                    signal_by_carrier.retain(|s| s.samples >= min);
                }

                Ok::<_, CoreError>(PlaceWithSignal {
                    place,
                    signal_by_carrier,
                })
            }
        }))
        .await?;
        Ok(enriched)
    }
}
