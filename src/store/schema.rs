//! Decoders from raw store nodes into crossing types.
//!
//! Missing fields fall back to `0.0`, `""` or `false`, so an absent
//! coordinate cannot be told apart from an explicit zero. Fields of the
//! wrong type are treated as missing.

use serde_json::Value;

use crate::crossing::{GeoPoint, Station, Train};

pub const STATION: &str = "station";
pub const GPS: &str = "gps";
pub const STATIONS: &str = "stations";
pub const TRAINS: &str = "trains";

pub const UNKNOWN_STATION: &str = "Unknown Station";

fn number(node: &Value, key: &str) -> f64 {
    match node.get(key) {
        None | Some(Value::Null) => 0.0,
        Some(value) => value.as_f64().unwrap_or_else(|| {
            log::debug!("field {key} is not a number ({value}), using 0.0");
            0.0
        }),
    }
}

fn text(node: &Value, key: &str) -> Option<String> {
    match node.get(key) {
        Some(Value::String(s)) => Some(s.to_string()),
        None | Some(Value::Null) => None,
        Some(value) => {
            log::debug!("field {key} is not a string ({value})");
            None
        }
    }
}

/// `station/{name, latitude, longitude}`.
pub fn station(node: &Value) -> Station {
    Station::new(
        text(node, "name").unwrap_or_else(|| UNKNOWN_STATION.to_string()),
        GeoPoint::new(number(node, "latitude"), number(node, "longitude")),
    )
}

/// Same node as [`station`], but a missing name reads as empty.
pub fn station_for_edit(node: &Value) -> Station {
    Station::new(
        text(node, "name").unwrap_or_default(),
        GeoPoint::new(number(node, "latitude"), number(node, "longitude")),
    )
}

/// `gps/{latitude, longitude}`.
pub fn gps(node: &Value) -> GeoPoint {
    GeoPoint::new(number(node, "latitude"), number(node, "longitude"))
}

pub fn control(node: &Value) -> bool {
    match node {
        Value::Bool(on) => *on,
        Value::Null => false,
        other => {
            log::debug!("control value is not a boolean ({other}), using false");
            false
        }
    }
}

/// `stations/{name}/{lat, lon}`. Some entries spell the longitude `lan`.
pub fn stations(node: &Value) -> Vec<Station> {
    let Some(entries) = node.as_object() else {
        return vec![];
    };

    entries
        .iter()
        .map(|(name, entry)| {
            let longitude = match entry.get("lon") {
                Some(Value::Null) | None => number(entry, "lan"),
                Some(_) => number(entry, "lon"),
            };
            Station::new(name.to_string(), GeoPoint::new(number(entry, "lat"), longitude))
        })
        .collect()
}

/// `trains/{id}/location/{lat, lng}`.
pub fn trains(node: &Value) -> Vec<Train> {
    let Some(entries) = node.as_object() else {
        return vec![];
    };

    entries
        .iter()
        .map(|(id, entry)| {
            let location = entry.get("location").unwrap_or(&Value::Null);
            let position = GeoPoint::new(number(location, "lat"), number(location, "lng"));
            Train::new(id.to_string(), position)
        })
        .collect()
}

/// Inverse of [`station`], for writing the single-crossing layout.
pub fn station_fields(station: &Station) -> [(&'static str, Value); 3] {
    [
        ("name", Value::from(station.name.to_string())),
        ("latitude", Value::from(station.location.latitude)),
        ("longitude", Value::from(station.location.longitude)),
    ]
}

/// Inverse of [`stations`] for one entry.
pub fn listing_fields(station: &Station) -> [(&'static str, Value); 2] {
    [
        ("lat", Value::from(station.location.latitude)),
        ("lon", Value::from(station.location.longitude)),
    ]
}
