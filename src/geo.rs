//! Fuzzy location deduplication: bounding-box pre-filter over stored
//! locations, refined by great-circle distance.

use tracing::debug;

use crate::config::GeoSettings;
use crate::error::CoreResult;
use crate::models::Location;
use crate::store::{GeoBox, Store};

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters between two lat/lon points, haversine
/// formula over a spherical Earth.
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

pub struct GeoMatcher {
    settings: GeoSettings,
}

impl GeoMatcher {
    pub fn new(settings: GeoSettings) -> Self {
        Self { settings }
    }

    pub fn match_radius_m(&self) -> f64 {
        self.settings.match_radius_m
    }

    fn bounds(&self, latitude: f64, longitude: f64) -> GeoBox {
        let delta = self.settings.box_delta_deg;
        GeoBox {
            min_lat: latitude - delta,
            max_lat: latitude + delta,
            min_lon: longitude - delta,
            max_lon: longitude + delta,
        }
    }

    /// Returns the first stored location within `max_distance_m` of the
    /// point, or `None`. Never creates anything.
    pub async fn find_match<S: Store + ?Sized>(
        &self,
        store: &S,
        latitude: f64,
        longitude: f64,
        max_distance_m: f64,
    ) -> CoreResult<Option<Location>> {
        let candidates = store.locations_in_box(self.bounds(latitude, longitude)).await?;
        for candidate in candidates {
            let distance =
                haversine_m(latitude, longitude, candidate.latitude, candidate.longitude);
            if distance <= max_distance_m {
                debug!(
                    location_id = %candidate.location_id,
                    distance_m = distance,
                    "matched existing location"
                );
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    /// Find-or-create at the configured canonical radius.
    ///
    /// The read-then-write sequence is not isolated against concurrent
    /// callers on the same point; two racing pings can each miss the other's
    /// in-flight insert and produce near-duplicate rows.
    pub async fn find_or_create<S: Store + ?Sized>(
        &self,
        store: &S,
        latitude: f64,
        longitude: f64,
        accuracy: Option<f64>,
    ) -> CoreResult<Location> {
        if let Some(existing) = self
            .find_match(store, latitude, longitude, self.settings.match_radius_m)
            .await?
        {
            return Ok(existing);
        }
        let created = store.insert_location(latitude, longitude, accuracy).await?;
        debug!(location_id = %created.location_id, latitude, longitude, "created location");
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_close_points() {
        // Roughly 1.4 m apart in central Cairo.
        let d = haversine_m(30.04440, 31.23570, 30.04441, 31.23571);
        assert!(d > 1.0 && d < 2.0, "got {d}");
    }

    #[test]
    fn haversine_distant_points() {
        let d = haversine_m(30.04440, 31.23570, 30.05000, 31.24000);
        assert!(d > 500.0, "got {d}");
    }

    #[test]
    fn haversine_zero_distance() {
        assert_eq!(haversine_m(30.0, 31.0, 30.0, 31.0), 0.0);
    }

    #[test]
    fn haversine_known_baseline() {
        // Paris to London is about 344 km.
        let d = haversine_m(48.8566, 2.3522, 51.5074, -0.1278);
        assert!((d - 344_000.0).abs() < 5_000.0, "got {d}");
    }
}
