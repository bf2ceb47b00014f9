//! Per-carrier aggregation of historical signal readings at a matched
//! location, consumed by the place-enrichment feature.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::CoreResult;
use crate::geo::GeoMatcher;
use crate::signal::{SignalClassifier, SignalQuality};
use crate::store::Store;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarrierSignalSummary {
    pub carrier: String,
    pub avg_dbm: f64,
    pub quality: SignalQuality,
    #[serde(rename = "count")]
    pub samples: usize,
}

pub struct CarrierSignalAggregator<'a> {
    matcher: &'a GeoMatcher,
    classifier: &'a SignalClassifier,
}

impl<'a> CarrierSignalAggregator<'a> {
    pub fn new(matcher: &'a GeoMatcher, classifier: &'a SignalClassifier) -> Self {
        Self { matcher, classifier }
    }

    /// Mean dBm and quality per carrier for all readings taken at the
    /// location matching the point, carriers uppercased for grouping.
    /// Match-only: when no stored location lies within `max_distance_m`,
    /// the result is empty and nothing is created.
    pub async fn aggregate_by_carrier<S: Store + ?Sized>(
        &self,
        store: &S,
        latitude: f64,
        longitude: f64,
        max_distance_m: f64,
    ) -> CoreResult<Vec<CarrierSignalSummary>> {
        let location = match self
            .matcher
            .find_match(store, latitude, longitude, max_distance_m)
            .await?
        {
            Some(l) => l,
            None => return Ok(Vec::new()),
        };

        let readings = store.readings_at_location(location.location_id).await?;

        // BTreeMap keeps the output ordering stable across runs.
        let mut groups: BTreeMap<String, (f64, usize)> = BTreeMap::new();
        for reading in readings {
            let (carrier, dbm) = match (reading.carrier, reading.signal_dbm) {
                (Some(c), Some(d)) => (c, d),
                _ => continue,
            };
            let entry = groups.entry(carrier.to_uppercase()).or_insert((0.0, 0));
            entry.0 += dbm;
            entry.1 += 1;
        }

        Ok(groups
            .into_iter()
            .map(|(carrier, (sum, count))| {
                let avg_dbm = sum / count as f64;
                CarrierSignalSummary {
                    carrier,
                    avg_dbm,
                    quality: self.classifier.classify(avg_dbm),
                    samples: count,
                }
            })
            .collect())
    }
}
