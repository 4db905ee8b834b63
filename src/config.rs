use std::{
    env::VarError,
    fs::File,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::crossing::monitor::DEFAULT_WARNING_RADIUS_KM;

pub const DATABASE_URL: &str = "SMARTRAIL_DATABASE_URL";
pub const AUTH_TOKEN: &str = "SMARTRAIL_AUTH_TOKEN";
pub const STATION: &str = "SMARTRAIL_STATION";
pub const WARNING_RADIUS_KM: &str = "SMARTRAIL_WARNING_RADIUS_KM";

pub const REQUIRED_VARIABLES: [&str; 1] = [DATABASE_URL];

/// Where station and train positions live in the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// One station under `station`, one train under `gps`.
    #[default]
    Single,
    /// A `stations` listing and a `trains` listing.
    Network,
}

/// Contents of `config.json`. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileConfig {
    pub database_url: Option<String>,
    pub auth_token: Option<String>,
    pub layout: Option<Layout>,
    pub station: Option<String>,
    pub warning_radius_km: Option<f64>,
}

impl FileConfig {
    pub fn try_new_from_file(file: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = file.as_ref();
        let config = serde_json::from_reader::<File, FileConfig>(
            File::open(path).with_context(|| format!("Could not open {}", path.display()))?,
        )
        .context("Invalid config json")?;

        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub auth_token: Option<String>,
    pub layout: Layout,
    /// Station to watch in the network layout.
    pub station: Option<String>,
    pub warning_radius_km: f64,
}

impl Config {
    /// `<config dir>/config.json` for this platform.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "singhastudios", "smartrail")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Reads the config file (explicit or default), then applies environment overrides.
    pub fn load(file: Option<&Path>) -> anyhow::Result<Self> {
        let file_config = match file {
            Some(path) => Some(FileConfig::try_new_from_file(path)?),
            None => match Self::default_path() {
                Some(path) if path.exists() => Some(FileConfig::try_new_from_file(path)?),
                _ => None,
            },
        };

        Self::resolve(file_config.unwrap_or_default(), env)
    }

    pub fn resolve(
        file: FileConfig,
        lookup: impl Fn(&str) -> anyhow::Result<Option<String>>,
    ) -> anyhow::Result<Self> {
        let database_url = lookup(DATABASE_URL)?
            .or(file.database_url)
            .ok_or_else(|| anyhow!("{DATABASE_URL} not set"))?;

        let warning_radius_km = match lookup(WARNING_RADIUS_KM)? {
            Some(value) => value
                .parse::<f64>()
                .with_context(|| format!("{WARNING_RADIUS_KM} is not a number: {value:?}"))?,
            None => file.warning_radius_km.unwrap_or(DEFAULT_WARNING_RADIUS_KM),
        };
        if !warning_radius_km.is_finite() || warning_radius_km < 0.0 {
            return Err(anyhow!(
                "warning radius must be a finite, non-negative number of km, \
                 got {warning_radius_km}"
            ))
            .context(format!("Check {WARNING_RADIUS_KM} or warningRadiusKm"));
        }

        Ok(Self {
            database_url,
            auth_token: lookup(AUTH_TOKEN)?.or(file.auth_token),
            layout: file.layout.unwrap_or_default(),
            station: lookup(STATION)?.or(file.station),
            warning_radius_km,
        })
    }

    pub fn log(&self) {
        log::info!("database: {}", self.database_url);
        log::info!(
            "auth token: {}",
            if self.auth_token.is_some() { "<redacted>" } else { "none" }
        );
        log::info!("layout: {:?}", self.layout);
        if let Some(station) = &self.station {
            log::info!("station: {station}");
        }
        log::info!("warning radius: {} km", self.warning_radius_km);
    }
}

fn env(name: &str) -> anyhow::Result<Option<String>> {
    match std::env::var(name) {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(anyhow!("{name} value is not valid unicode")),
    }
}
