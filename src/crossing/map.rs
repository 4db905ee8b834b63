use geojson::{feature::Id, Feature, FeatureCollection, GeoJson, Geometry, Value};
use serde::{Deserialize, Serialize};
use serde_json::Map;

use super::{
    geo::GeoPoint,
    monitor::CrossingMonitor,
    station::{Station, Train},
};

pub const DEFAULT_ZOOM: f32 = 10.0;
pub const STATION_COLOR: &str = "#00FF00";
pub const TRAIN_COLOR: &str = "#FF0000";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub target: GeoPoint,
    pub zoom: f32,
}

/// Markers for a map view, as a GeoJSON feature collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossingMap {
    pub camera: Camera,
    pub features: FeatureCollection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkerKind {
    Station,
    Train,
}

impl MarkerKind {
    fn key(&self) -> &'static str {
        match self {
            MarkerKind::Station => "station",
            MarkerKind::Train => "train",
        }
    }

    fn color(&self) -> &'static str {
        match self {
            MarkerKind::Station => STATION_COLOR,
            MarkerKind::Train => TRAIN_COLOR,
        }
    }
}

impl CrossingMap {
    pub fn from_monitor(monitor: &CrossingMonitor) -> anyhow::Result<Self> {
        let features = vec![
            marker(MarkerKind::Station, None, "Station", monitor.station.location)?,
            marker(MarkerKind::Train, None, "Train", monitor.train)?,
        ];

        Ok(CrossingMap {
            camera: Camera {
                target: monitor.station.location,
                zoom: DEFAULT_ZOOM,
            },
            features: FeatureCollection {
                bbox: None,
                features,
                foreign_members: None,
            },
        })
    }

    /// One marker per station and train. The camera centres on `focus` when it
    /// names a listed station, otherwise on the first station.
    pub fn from_network(
        stations: &[Station],
        trains: &[Train],
        focus: Option<&str>,
    ) -> anyhow::Result<Self> {
        let mut features = Vec::with_capacity(stations.len() + trains.len());
        for station in stations {
            let id = Some(station.name.as_str());
            features.push(marker(MarkerKind::Station, id, &station.name, station.location)?);
        }
        for train in trains {
            let id = Some(train.id.as_str());
            features.push(marker(MarkerKind::Train, id, &train.id, train.location)?);
        }

        let target = focus
            .and_then(|name| stations.iter().find(|station| station.name == name))
            .or(stations.first())
            .map(|station| station.location)
            .unwrap_or_default();

        Ok(CrossingMap {
            camera: Camera {
                target,
                zoom: DEFAULT_ZOOM,
            },
            features: FeatureCollection {
                bbox: None,
                features,
                foreign_members: None,
            },
        })
    }

    pub fn to_geojson(&self) -> anyhow::Result<GeoJson> {
        let mut foreign = Map::new();
        foreign.insert("camera".to_string(), serde_json::to_value(self.camera)?);

        let mut collection = self.features.clone();
        collection.foreign_members = Some(foreign);

        Ok(GeoJson::FeatureCollection(collection))
    }

    pub fn to_geojson_string(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_geojson()?)?)
    }
}

fn marker(
    kind: MarkerKind,
    id: Option<&str>,
    title: &str,
    position: GeoPoint,
) -> anyhow::Result<Feature> {
    // Properties
    let mut props_map = Map::new();
    props_map.insert("title".to_string(), serde_json::to_value(title)?);
    props_map.insert("color".to_string(), serde_json::to_value(kind.color())?);
    props_map.insert("kind".to_string(), serde_json::to_value(kind.key())?);

    Ok(Feature {
        id: id.map(|id| Id::String(format!("{}_{}", kind.key(), id))),
        bbox: None,
        foreign_members: None,
        geometry: Some(Geometry::new(Value::Point(position.to_lon_lat()))),
        properties: Some(props_map),
    })
}
