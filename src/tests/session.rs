use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::Layout;
use crate::crossing::{Alert, Control, GeoPoint, StationForm};
use crate::error::{FormError, StoreError, StoreResult};
use crate::session::CrossingSession;
use crate::store::{MemoryStore, RealtimeStore, StorePath, Subscription};

/// Wraps a [`MemoryStore`], answering reads of one path with a 503. Its
/// subscription pushes the current value once, then the error.
#[derive(Clone)]
struct UnavailableAt {
    inner: MemoryStore,
    broken: StorePath,
}

fn unavailable() -> StoreError {
    StoreError::Remote {
        status: 503,
        message: "unavailable".to_string(),
    }
}

#[async_trait]
impl RealtimeStore for UnavailableAt {
    async fn get(&self, path: &StorePath) -> StoreResult<Value> {
        if path == &self.broken {
            return Err(unavailable());
        }
        self.inner.get(path).await
    }

    async fn set(&self, path: &StorePath, value: Value) -> StoreResult<()> {
        self.inner.set(path, value).await
    }

    async fn keys(&self, path: &StorePath) -> StoreResult<Vec<String>> {
        self.inner.keys(path).await
    }

    async fn subscribe(&self, path: &StorePath) -> StoreResult<Subscription> {
        if path != &self.broken {
            return self.inner.subscribe(path).await;
        }

        let current = self.inner.get(path).await?;
        Ok(Subscription::spawn(path.clone(), move |feed| async move {
            let _ = feed.send(Ok(current));
            tokio::time::sleep(Duration::from_millis(10)).await;
            let _ = feed.send(Err(unavailable()));
        }))
    }
}

fn path(s: &str) -> StorePath {
    StorePath::parse(s).unwrap()
}

fn single_store() -> MemoryStore {
    MemoryStore::new(json!({
        "station": {"name": "Ja-Ela", "latitude": 7.4, "longitude": 79.84},
        "gps": {"latitude": 7.45, "longitude": 79.85},
        "servo": {"servo1": true}
    }))
}

fn network_store() -> MemoryStore {
    MemoryStore::new(json!({
        "stations": {
            "Ja-Ela": {"lat": 7.4, "lon": 79.84},
            "Kandy": {"lat": 7.29, "lan": 80.63}
        },
        "trains": {
            "t1": {"location": {"lat": 7.5, "lng": 79.9}},
            "t2": {"location": {"lat": 7.43, "lng": 79.845}}
        }
    }))
}

#[tokio::test]
async fn test_snapshot_single_layout() {
    let mut session = CrossingSession::with_layout(single_store(), Layout::Single, None, 5.0);
    let monitor = session.snapshot().await.unwrap();

    assert_eq!(monitor.station.name, "Ja-Ela");
    assert_eq!(monitor.train, GeoPoint::new(7.45, 79.85));
    assert_eq!(monitor.format_distance(), "5.7 km");
    assert!(monitor.controls.gate);
    assert!(!monitor.controls.light);
    assert!(!monitor.controls.buzzer);
}

#[tokio::test]
async fn test_snapshot_empty_store_uses_defaults() {
    let store = MemoryStore::default();
    let mut session = CrossingSession::with_layout(store, Layout::Single, None, 5.0);
    let monitor = session.snapshot().await.unwrap();

    assert_eq!(monitor.station.name, "Unknown Station");
    assert_eq!(monitor.distance_km, 0.0);
}

#[tokio::test]
async fn test_snapshot_network_layout_tracks_nearest_train() {
    let station = Some("Ja-Ela".to_string());
    let mut session = CrossingSession::with_layout(network_store(), Layout::Network, station, 5.0);
    let monitor = session.snapshot().await.unwrap();

    assert_eq!(monitor.station.name, "Ja-Ela");
    assert_eq!(monitor.train, GeoPoint::new(7.43, 79.845));
    assert_eq!(monitor.format_distance(), "3.4 km");

    let stations = session.stations().await.unwrap();
    assert_eq!(stations[1].location, GeoPoint::new(7.29, 80.63));
    assert_eq!(session.trains().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_snapshot_network_layout_unknown_station() {
    let station = Some("Galle".to_string());
    let mut session = CrossingSession::with_layout(network_store(), Layout::Network, station, 5.0);
    let monitor = session.snapshot().await.unwrap();

    // Station stays unloaded, the rest is still read.
    assert_eq!(monitor.station.name, "Loading...");
    assert!(!monitor.controls.gate);
    assert!(session.load_station_form().await.unwrap_err().to_string().contains("Galle"));
}

#[tokio::test]
async fn test_snapshot_keeps_going_past_failed_reads() {
    let store = single_store();
    store.set(&path("led/led1"), json!(true)).await.unwrap();
    let broken = UnavailableAt {
        inner: store,
        broken: path("led/led1"),
    };
    let mut session = CrossingSession::with_layout(broken, Layout::Single, None, 5.0);

    let monitor = session.snapshot().await.unwrap();
    assert_eq!(monitor.station.name, "Ja-Ela");
    assert_eq!(monitor.train, GeoPoint::new(7.45, 79.85));
    assert!(monitor.controls.gate);
    assert!(!monitor.controls.light, "unread cell keeps its default");
}

#[tokio::test]
async fn test_set_control_writes_boolean() {
    let store = single_store();
    let mut session = CrossingSession::with_layout(store.clone(), Layout::Single, None, 5.0);

    session.set_control(Control::Light, true).await.unwrap();
    session.set_control(Control::Gate, false).await.unwrap();

    assert_eq!(store.get(&path("led/led1")).await.unwrap(), json!(true));
    assert_eq!(store.get(&path("servo/servo1")).await.unwrap(), json!(false));
    assert!(session.monitor().controls.light);
    assert!(!session.monitor().controls.gate);
}

#[tokio::test]
async fn test_station_form_round_trip_single_layout() {
    let store = single_store();
    let mut session = CrossingSession::with_layout(store.clone(), Layout::Single, None, 5.0);

    let form = session.load_station_form().await.unwrap();
    assert_eq!(form, StationForm::new("Ja-Ela", "7.4", "79.84"));

    let saved = session
        .save_station(&StationForm::new("Ragama", "7.03", "79.92"))
        .await
        .unwrap();
    assert_eq!(saved.name, "Ragama");
    assert_eq!(
        store.get(&path("station")).await.unwrap(),
        json!({"name": "Ragama", "latitude": 7.03, "longitude": 79.92})
    );
    assert_eq!(session.monitor().station, saved);
}

#[tokio::test]
async fn test_station_form_rejects_bad_input_without_writing() {
    let store = single_store();
    let mut session = CrossingSession::with_layout(store.clone(), Layout::Single, None, 5.0);

    assert!(session.save_station(&StationForm::new("X", "abc", "1")).await.is_err());
    assert_eq!(store.get(&path("station/name")).await.unwrap(), json!("Ja-Ela"));
}

#[tokio::test]
async fn test_save_station_network_layout() {
    let store = network_store();
    let mut session = CrossingSession::with_layout(store.clone(), Layout::Network, None, 5.0);

    session
        .save_station(&StationForm::new("Ragama", "7.03", "79.92"))
        .await
        .unwrap();
    assert_eq!(
        store.get(&path("stations/Ragama")).await.unwrap(),
        json!({"lat": 7.03, "lon": 79.92})
    );
    assert_eq!(session.load_station_form().await.unwrap().name, "Ragama");
}

#[tokio::test]
async fn test_watch_follows_updates_and_alerts() {
    let store = single_store();
    let writer = store.clone();
    let mut session = CrossingSession::with_layout(store, Layout::Single, None, 5.0);

    let (done_tx, done_rx) = tokio::sync::oneshot::channel::<()>();
    let feeder = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        writer
            .set(&path("gps"), json!({"latitude": 7.43, "longitude": 79.845}))
            .await
            .unwrap();
        writer.set(&path("buzzer/buzzer1"), json!(true)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        let _ = done_tx.send(());
    });

    let mut alerts = Vec::new();
    let mut updates = 0;
    session
        .watch(
            |_, new_alerts| {
                updates += 1;
                alerts.extend_from_slice(new_alerts);
            },
            async {
                let _ = done_rx.await;
            },
        )
        .await
        .unwrap();
    feeder.await.unwrap();

    // Five initial values, then the gps move and the buzzer.
    assert_eq!(updates, 7);
    assert!(matches!(alerts.as_slice(), [Alert::Approaching { .. }]));
    assert_eq!(session.monitor().train, GeoPoint::new(7.43, 79.845));
    assert!(session.monitor().controls.buzzer);
}

#[tokio::test]
async fn test_watch_ends_when_shutdown_resolves() {
    let mut session =
        CrossingSession::with_layout(MemoryStore::new(Value::Null), Layout::Network, None, 5.0);
    let result = session
        .watch(|_, _| {}, tokio::time::sleep(Duration::from_millis(20)))
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_save_station_network_layout_rejects_unusable_names() {
    let store = network_store();
    let before = store.snapshot();
    let mut session = CrossingSession::with_layout(store.clone(), Layout::Network, None, 5.0);

    for name in ["", "  ", "Ja-Ela/old", "Ja.Ela"] {
        let err = session
            .save_station(&StationForm::new(name, "7.03", "79.92"))
            .await
            .unwrap_err();
        assert!(
            matches!(err.downcast_ref::<FormError>(), Some(FormError::InvalidName { .. })),
            "{name:?}: {err}"
        );
    }

    assert_eq!(store.snapshot(), before);
    let names = session
        .stations()
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect::<Vec<_>>();
    assert_eq!(names, ["Ja-Ela", "Kandy"]);
}

#[tokio::test]
async fn test_save_station_single_layout_allows_empty_name() {
    let store = single_store();
    let mut session = CrossingSession::with_layout(store.clone(), Layout::Single, None, 5.0);

    session.save_station(&StationForm::new("", "7.03", "79.92")).await.unwrap();
    assert_eq!(
        store.get(&path("station")).await.unwrap(),
        json!({"name": "", "latitude": 7.03, "longitude": 79.92})
    );
}

#[tokio::test]
async fn test_watch_logs_feed_errors_and_keeps_state() {
    let store = single_store();
    store.set(&path("led/led1"), json!(true)).await.unwrap();
    let broken = UnavailableAt {
        inner: store.clone(),
        broken: path("led/led1"),
    };
    let mut session = CrossingSession::with_layout(broken, Layout::Single, None, 5.0);

    let writer = store.clone();
    let (done_tx, done_rx) = tokio::sync::oneshot::channel::<()>();
    let feeder = tokio::spawn(async move {
        // After the light feed has failed.
        tokio::time::sleep(Duration::from_millis(50)).await;
        writer.set(&path("buzzer/buzzer1"), json!(true)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        let _ = done_tx.send(());
    });

    let mut updates = 0;
    session
        .watch(
            |_, _| updates += 1,
            async {
                let _ = done_rx.await;
            },
        )
        .await
        .unwrap();
    feeder.await.unwrap();

    // Five initial values and the buzzer; the error is not an update.
    assert_eq!(updates, 6);
    assert!(session.monitor().controls.light);
    assert!(session.monitor().controls.buzzer);
    assert_eq!(session.monitor().station.name, "Ja-Ela");
}

#[tokio::test]
async fn test_watch_network_layout_alerts_once_per_change() {
    let store = MemoryStore::new(json!({
        "stations": {"A": {"lat": 7.0, "lon": 79.0}},
        "trains": {"t1": {"location": {"lat": 7.43, "lng": 79.845}}}
    }));
    let writer = store.clone();
    let station = Some("A".to_string());
    let mut session = CrossingSession::with_layout(store, Layout::Network, station, 5.0);

    let (done_tx, done_rx) = tokio::sync::oneshot::channel::<()>();
    let feeder = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        writer
            .set(&path("stations/A"), json!({"lat": 7.4, "lon": 79.84}))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        let _ = done_tx.send(());
    });

    let mut counts = Vec::new();
    session
        .watch(
            |_, alerts| counts.push(alerts.len()),
            async {
                let _ = done_rx.await;
            },
        )
        .await
        .unwrap();
    feeder.await.unwrap();

    // Five initial values, then the station move.
    assert_eq!(counts.len(), 6);
    assert_eq!(counts.last(), Some(&1));
    assert_eq!(counts.iter().sum::<usize>(), 1);
    assert_eq!(session.monitor().station.location, GeoPoint::new(7.4, 79.84));
    assert_eq!(session.monitor().train, GeoPoint::new(7.43, 79.845));
    assert_eq!(session.monitor().format_distance(), "3.4 km");
}

#[tokio::test]
async fn test_snapshot_reads_out_of_range_station() {
    let store = MemoryStore::new(json!({
        "station": {"name": "Ja-Ela", "latitude": 200.0, "longitude": 79.84}
    }));
    let mut session = CrossingSession::with_layout(store, Layout::Single, None, 5.0);

    let station = session.snapshot().await.unwrap().station.clone();
    assert_eq!(station.name, "Ja-Ela");
    assert_eq!(station.location, GeoPoint::new(200.0, 79.84));

    // Only the edit form refuses it.
    let form = session.load_station_form().await.unwrap();
    assert!(form.to_station().is_err());
}
