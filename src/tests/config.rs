use std::{collections::HashMap, io::Write};

use crate::config::{Config, FileConfig, Layout, DATABASE_URL, STATION, WARNING_RADIUS_KM};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> anyhow::Result<Option<String>> {
    let vars = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect::<HashMap<_, _>>();
    move |name: &str| Ok(vars.get(name).cloned())
}

#[test]
fn test_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "databaseUrl": "https://example-rtdb.firebaseio.com/",
            "layout": "network",
            "station": "Kandy",
            "warningRadiusKm": 2.5
        }}"#
    )
    .unwrap();

    let file_config = FileConfig::try_new_from_file(file.path()).unwrap();
    let config = Config::resolve(file_config, lookup(&[])).unwrap();

    assert_eq!(config.database_url, "https://example-rtdb.firebaseio.com/");
    assert_eq!(config.layout, Layout::Network);
    assert_eq!(config.station.as_deref(), Some("Kandy"));
    assert_eq!(config.warning_radius_km, 2.5);
    assert_eq!(config.auth_token, None);
}

#[test]
fn test_config_env_overrides_file() {
    let file_config = FileConfig {
        database_url: Some("https://file.example/".to_string()),
        station: Some("Kandy".to_string()),
        ..Default::default()
    };
    let config = Config::resolve(
        file_config,
        lookup(&[
            (DATABASE_URL, "https://env.example/"),
            (STATION, "Colombo"),
            (WARNING_RADIUS_KM, "1"),
        ]),
    )
    .unwrap();

    assert_eq!(config.database_url, "https://env.example/");
    assert_eq!(config.station.as_deref(), Some("Colombo"));
    assert_eq!(config.warning_radius_km, 1.0);
    assert_eq!(config.layout, Layout::Single);
}

#[test]
fn test_config_requires_database_url() {
    let err = Config::resolve(FileConfig::default(), lookup(&[])).unwrap_err();
    assert!(err.to_string().contains(DATABASE_URL));

    let err = Config::resolve(
        FileConfig::default(),
        lookup(&[(DATABASE_URL, "https://env.example/"), (WARNING_RADIUS_KM, "far")]),
    )
    .unwrap_err();
    assert!(err.to_string().contains(WARNING_RADIUS_KM));
}

#[test]
fn test_config_rejects_bad_json() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();
    assert!(FileConfig::try_new_from_file(file.path()).is_err());
    assert!(Config::load(Some(file.path())).is_err());
}

#[test]
fn test_config_rejects_unusable_radius() {
    for radius in ["NaN", "-1", "inf"] {
        let err = Config::resolve(
            FileConfig::default(),
            lookup(&[(DATABASE_URL, "https://env.example/"), (WARNING_RADIUS_KM, radius)]),
        )
        .unwrap_err();
        assert!(err.to_string().contains(WARNING_RADIUS_KM), "{radius}: {err:#}");
        assert!(format!("{err:#}").contains("non-negative"), "{radius}: {err:#}");
    }

    let file_config = FileConfig {
        database_url: Some("https://file.example/".to_string()),
        warning_radius_km: Some(-2.5),
        ..Default::default()
    };
    assert!(Config::resolve(file_config, lookup(&[])).is_err());

    let config = Config::resolve(
        FileConfig::default(),
        lookup(&[(DATABASE_URL, "https://env.example/"), (WARNING_RADIUS_KM, "0")]),
    )
    .unwrap();
    assert_eq!(config.warning_radius_km, 0.0);
}
