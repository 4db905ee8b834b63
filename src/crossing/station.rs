use serde::{Deserialize, Serialize};

use super::geo::GeoPoint;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub name: String,
    pub location: GeoPoint,
}

impl Station {
    pub fn new(name: impl Into<String>, location: GeoPoint) -> Self {
        Self {
            name: name.into(),
            location,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Train {
    pub id: String,
    pub location: GeoPoint,
}

impl Train {
    pub fn new(id: impl Into<String>, location: GeoPoint) -> Self {
        Self {
            id: id.into(),
            location,
        }
    }

    pub fn distance_to(&self, station: &Station) -> f64 {
        self.location.distance_km(&station.location)
    }
}

/// Returns the train closest to `station`, with its distance.
pub fn nearest_train<'a>(station: &Station, trains: &'a [Train]) -> Option<(&'a Train, f64)> {
    trains
        .iter()
        .map(|train| (train, train.distance_to(station)))
        .min_by(|(_, d1), (_, d2)| d1.total_cmp(d2))
}
