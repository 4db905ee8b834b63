use crate::error::FormError;

use super::{geo::GeoPoint, station::Station};

/// Text fields of the station edit form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationForm {
    pub name: String,
    pub latitude: String,
    pub longitude: String,
}

impl StationForm {
    pub fn new(
        name: impl Into<String>,
        latitude: impl Into<String>,
        longitude: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            latitude: latitude.into(),
            longitude: longitude.into(),
        }
    }

    /// Parses the coordinates. An empty name is accepted.
    pub fn to_station(&self) -> Result<Station, FormError> {
        let latitude = parse_coordinate("latitude", &self.latitude, 90.0)?;
        let longitude = parse_coordinate("longitude", &self.longitude, 180.0)?;

        Ok(Station::new(self.name.to_string(), GeoPoint::new(latitude, longitude)))
    }

    /// Like [`to_station`](Self::to_station), but the name becomes a key under
    /// `stations`, so it must be a single non-empty key.
    pub fn to_listed_station(&self) -> Result<Station, FormError> {
        let name = self.name.trim();
        let reason = if name.is_empty() {
            Some("name is empty")
        } else if name.contains('/') {
            Some("name contains '/'")
        } else if name.contains(['.', '$', '#', '[', ']']) || name.chars().any(char::is_control) {
            Some("name contains a character keys may not hold")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(FormError::InvalidName {
                name: self.name.to_string(),
                reason,
            });
        }

        let mut station = self.to_station()?;
        station.name = name.to_string();
        Ok(station)
    }
}

impl From<&Station> for StationForm {
    fn from(value: &Station) -> Self {
        Self {
            name: value.name.to_string(),
            latitude: value.location.latitude.to_string(),
            longitude: value.location.longitude.to_string(),
        }
    }
}

fn parse_coordinate(field: &'static str, value: &str, limit: f64) -> Result<f64, FormError> {
    let parsed = value
        .trim()
        .parse::<f64>()
        .map_err(|_| FormError::InvalidNumber {
            field,
            value: value.to_string(),
        })?;

    if !parsed.is_finite() || parsed.abs() > limit {
        return Err(FormError::OutOfRange {
            field,
            value: parsed,
            min: -limit,
            max: limit,
        });
    }

    Ok(parsed)
}
