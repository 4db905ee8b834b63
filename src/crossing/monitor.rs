use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::{
    control::{Control, ControlState},
    geo::{distance_km, GeoPoint},
    station::Station,
};

pub const DEFAULT_WARNING_RADIUS_KM: f64 = 5.0;

/// A single change observed in the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    Station(Station),
    Train(GeoPoint),
    /// Station and train moved together; the distance is recomputed once.
    Crossing(Station, GeoPoint),
    Control(Control, bool),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Alert {
    Approaching { distance_km: f64 },
}

impl Display for Alert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Alert::Approaching { distance_km } => write!(
                f,
                "Train is approaching ({distance_km:.1} km away)! \
                 Please close the gates immediately."
            ),
        }
    }
}

/// Latest view of the crossing: station, train, controls and the distance between them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossingMonitor {
    pub station: Station,
    pub train: GeoPoint,
    pub controls: ControlState,
    pub distance_km: f64,
    pub warning_radius_km: f64,
}

impl Default for CrossingMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_WARNING_RADIUS_KM)
    }
}

impl CrossingMonitor {
    pub fn new(warning_radius_km: f64) -> Self {
        Self {
            station: Station::new("Loading...", GeoPoint::default()),
            train: GeoPoint::default(),
            controls: ControlState::default(),
            distance_km: 0.0,
            warning_radius_km,
        }
    }

    pub fn apply(&mut self, update: Update) -> Vec<Alert> {
        match update {
            Update::Station(station) => {
                self.station = station;
                self.recompute()
            }
            Update::Train(location) => {
                self.train = location;
                self.recompute()
            }
            Update::Crossing(station, location) => {
                self.station = station;
                self.train = location;
                self.recompute()
            }
            Update::Control(control, on) => {
                self.controls.set(control, on);
                vec![]
            }
        }
    }

    fn recompute(&mut self) -> Vec<Alert> {
        self.distance_km = distance_km(self.train, self.station.location);

        // Zero is the unloaded 0,0 / 0,0 state.
        if self.distance_km > 0.0 && self.distance_km < self.warning_radius_km {
            log::warn!("train {:.1} km from {}", self.distance_km, self.station.name);
            vec![Alert::Approaching {
                distance_km: self.distance_km,
            }]
        } else {
            vec![]
        }
    }

    pub fn in_warning_zone(&self) -> bool {
        self.distance_km < self.warning_radius_km
    }

    pub fn format_distance(&self) -> String {
        format!("{:.1} km", self.distance_km)
    }
}

impl Display for CrossingMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.station.name)?;
        writeln!(f, "  station   {}", self.station.location)?;
        writeln!(f, "  train     {}", self.train)?;
        writeln!(f, "  distance  {}", self.format_distance())?;
        if self.in_warning_zone() {
            writeln!(f, "  Warning: Close the gates!")?;
        }
        for control in Control::ALL {
            let state = if self.controls.get(control) { "on" } else { "off" };
            writeln!(f, "  {:<15} {}", control.label(), state)?;
        }
        Ok(())
    }
}
