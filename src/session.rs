//! Wires a realtime store to a [`CrossingMonitor`].

use std::{fmt::Display, future::Future};

use anyhow::{anyhow, Context};
use futures::{stream, StreamExt};
use serde_json::Value;

use crate::{
    config::{Config, Layout},
    crossing::{nearest_train, Alert, Control, CrossingMonitor, Station, StationForm, Train, Update},
    error::StoreResult,
    store::{schema, RealtimeStore, StorePath},
};

/// The node a watched value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Station,
    Gps,
    Stations,
    Trains,
    Control(Control),
}

impl Source {
    fn path(&self) -> &'static str {
        match self {
            Source::Station => schema::STATION,
            Source::Gps => schema::GPS,
            Source::Stations => schema::STATIONS,
            Source::Trains => schema::TRAINS,
            Source::Control(control) => control.path(),
        }
    }
}

impl Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Control(control) => write!(f, "{control} state"),
            other => write!(f, "{}", other.path()),
        }
    }
}

pub struct CrossingSession<S: RealtimeStore> {
    store: S,
    layout: Layout,
    station: Option<String>,
    monitor: CrossingMonitor,
    /// Last listings seen in the network layout.
    stations: Vec<Station>,
    trains: Vec<Train>,
}

impl<S: RealtimeStore> CrossingSession<S> {
    pub fn new(store: S, config: &Config) -> Self {
        Self::with_layout(store, config.layout, config.station.clone(), config.warning_radius_km)
    }

    pub fn with_layout(
        store: S,
        layout: Layout,
        station: Option<String>,
        warning_radius_km: f64,
    ) -> Self {
        Self {
            store,
            layout,
            station,
            monitor: CrossingMonitor::new(warning_radius_km),
            stations: vec![],
            trains: vec![],
        }
    }

    pub fn monitor(&self) -> &CrossingMonitor {
        &self.monitor
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    fn sources(&self) -> Vec<Source> {
        let mut sources = match self.layout {
            Layout::Single => vec![Source::Station, Source::Gps],
            Layout::Network => vec![Source::Stations, Source::Trains],
        };
        sources.extend(Control::ALL.map(Source::Control));
        sources
    }

    async fn read(&self, source: Source) -> anyhow::Result<Value> {
        let path = StorePath::parse(source.path())?;
        self.store
            .get(&path)
            .await
            .with_context(|| format!("Error fetching {source}"))
    }

    /// Reads every node once and returns the resulting state. A node that
    /// fails to read or decode is logged and keeps its last known value.
    pub async fn snapshot(&mut self) -> anyhow::Result<&CrossingMonitor> {
        for source in self.sources() {
            let value = match self.read(source).await {
                Ok(value) => value,
                Err(e) => {
                    log::error!("{e:#}");
                    continue;
                }
            };
            if let Err(e) = self.ingest(source, &value) {
                log::error!("{e:#}");
            }
        }
        Ok(&self.monitor)
    }

    /// Turns one node value into monitor updates.
    fn ingest(&mut self, source: Source, value: &Value) -> anyhow::Result<Vec<Alert>> {
        let mut alerts = Vec::new();
        match source {
            Source::Station => {
                alerts.extend(self.monitor.apply(Update::Station(schema::station(value))))
            }
            Source::Gps => alerts.extend(self.monitor.apply(Update::Train(schema::gps(value)))),
            Source::Control(control) => {
                alerts.extend(self.monitor.apply(Update::Control(control, schema::control(value))))
            }
            Source::Stations => {
                self.stations = schema::stations(value);
                let station = self.selected_station()?;
                alerts.extend(self.monitor.apply(self.station_update(station)));
            }
            Source::Trains => {
                self.trains = schema::trains(value);
                alerts.extend(self.track_nearest_train());
            }
        }
        Ok(alerts)
    }

    fn selected_station(&self) -> anyhow::Result<Station> {
        let station = match &self.station {
            Some(name) => self.stations.iter().find(|station| &station.name == name),
            None => self.stations.first(),
        };

        station.cloned().ok_or_else(|| match &self.station {
            Some(name) => anyhow!("station {name:?} is not listed under {}", schema::STATIONS),
            None => anyhow!("no stations listed under {}", schema::STATIONS),
        })
    }

    /// Moves the station together with the train nearest to it, if any.
    fn station_update(&self, station: Station) -> Update {
        match nearest_train(&station, &self.trains) {
            Some((train, _)) => {
                let location = train.location;
                Update::Crossing(station, location)
            }
            None => Update::Station(station),
        }
    }

    fn track_nearest_train(&mut self) -> Vec<Alert> {
        match nearest_train(&self.monitor.station, &self.trains) {
            Some((train, _)) => {
                let location = train.location;
                self.monitor.apply(Update::Train(location))
            }
            None => vec![],
        }
    }

    /// Writes a control cell. The local state changes even if the write fails.
    pub async fn set_control(&mut self, control: Control, on: bool) -> anyhow::Result<()> {
        self.monitor.apply(Update::Control(control, on));

        let path = StorePath::parse(control.path())?;
        self.store
            .set(&path, Value::Bool(on))
            .await
            .with_context(|| format!("Error writing {control} state"))?;

        log::info!("{control} set {}", if on { "on" } else { "off" });
        Ok(())
    }

    /// Current station as edit form fields.
    pub async fn load_station_form(&mut self) -> anyhow::Result<StationForm> {
        let station = match self.layout {
            Layout::Single => schema::station_for_edit(&self.read(Source::Station).await?),
            Layout::Network => {
                self.stations = schema::stations(&self.read(Source::Stations).await?);
                self.selected_station()?
            }
        };
        Ok(StationForm::from(&station))
    }

    /// Validates the form and writes the station fields.
    pub async fn save_station(&mut self, form: &StationForm) -> anyhow::Result<Station> {
        let station = match self.layout {
            Layout::Single => form.to_station()?,
            Layout::Network => form.to_listed_station()?,
        };

        match self.layout {
            Layout::Single => {
                let base = StorePath::parse(schema::STATION)?;
                for (key, value) in schema::station_fields(&station) {
                    self.store.set(&base.child(key)?, value).await?;
                }
            }
            Layout::Network => {
                let base = StorePath::parse(schema::STATIONS)?.child(&station.name)?;
                for (key, value) in schema::listing_fields(&station) {
                    self.store.set(&base.child(key)?, value).await?;
                }
                self.station = Some(station.name.to_string());
            }
        }

        log::info!("saved station {} at {}", station.name, station.location);
        let update = match self.layout {
            Layout::Single => Update::Station(station.clone()),
            Layout::Network => self.station_update(station.clone()),
        };
        self.monitor.apply(update);
        Ok(station)
    }

    pub async fn stations(&self) -> anyhow::Result<Vec<Station>> {
        Ok(schema::stations(&self.read(Source::Stations).await?))
    }

    pub async fn trains(&self) -> anyhow::Result<Vec<Train>> {
        Ok(schema::trains(&self.read(Source::Trains).await?))
    }

    /// Follows every node until `shutdown` resolves or all feeds end, calling
    /// `handler` after each change. Read errors are logged and the last known
    /// state is kept.
    pub async fn watch<H, F>(&mut self, mut handler: H, shutdown: F) -> anyhow::Result<()>
    where
        H: FnMut(&CrossingMonitor, &[Alert]),
        F: Future<Output = ()>,
    {
        let mut feeds = Vec::new();
        for source in self.sources() {
            let path = StorePath::parse(source.path())?;
            let subscription = self.store.subscribe(&path).await?;
            feeds.push(
                stream::unfold(subscription, move |mut subscription| async move {
                    let item: StoreResult<Value> = subscription.next().await?;
                    Some(((source, item), subscription))
                })
                .boxed(),
            );
        }
        let mut merged = stream::select_all(feeds);

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                item = merged.next() => {
                    let Some((source, result)) = item else {
                        log::info!("all feeds ended");
                        break;
                    };

                    let value = match result {
                        Ok(value) => value,
                        Err(e) => {
                            log::error!("Error fetching {source}: {e}");
                            continue;
                        }
                    };

                    match self.ingest(source, &value) {
                        Ok(alerts) => handler(&self.monitor, &alerts),
                        Err(e) => log::error!("{e:#}"),
                    }
                }
            }
        }

        Ok(())
    }
}
