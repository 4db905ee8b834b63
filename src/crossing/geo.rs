use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Whether both coordinates are finite and inside their degree ranges.
    /// Nothing in the crate rejects a point for failing this.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        distance_km(*self, *other)
    }

    /// GeoJSON position order.
    pub fn to_lon_lat(&self) -> Vec<f64> {
        vec![self.longitude, self.latitude]
    }
}

impl Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// Great-circle distance in kilometres (haversine).
///
/// Not clamped and not guarded: non-finite input yields NaN.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

#[test]
fn test_distance_same_point() {
    let a = GeoPoint::new(7.4, 79.84);
    assert_eq!(distance_km(a, a), 0.0);
}
