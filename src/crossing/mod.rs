//! The crossing in common form: positions, controls, live state and map export.

pub mod control;
pub mod form;
pub mod geo;
pub mod map;
pub mod monitor;
pub mod station;

pub use control::{Control, ControlState};
pub use form::StationForm;
pub use geo::{distance_km, GeoPoint, EARTH_RADIUS_KM};
pub use map::CrossingMap;
pub use monitor::{Alert, CrossingMonitor, Update};
pub use station::{nearest_train, Station, Train};
