use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use smartrail::config::{Config, Layout, REQUIRED_VARIABLES};
use smartrail::crossing::{nearest_train, Control, CrossingMap, StationForm};
use smartrail::session::CrossingSession;
use smartrail::store::FirebaseStore;

#[derive(Parser, Debug)]
#[command(name = "smartrail")]
#[command(about = "Level-crossing monitor for a realtime railway database")]
#[command(version)]
struct Args {
    /// Configuration file (defaults to the platform config dir)
    #[arg(short, long, env = "SMARTRAIL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current crossing state once
    Status,
    /// Follow the crossing until Ctrl-C
    Watch,
    /// Switch a control on or off
    Set {
        /// gate, light or buzzer
        control: Control,
        state: Switch,
    },
    /// Show or edit the station
    Station {
        #[command(subcommand)]
        action: StationAction,
    },
    /// List stations (network layout)
    Stations,
    /// List trains with their distance to the station (network layout)
    Trains,
    /// Export station and train markers as GeoJSON
    Map {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum StationAction {
    Show,
    Edit {
        #[arg(long)]
        name: String,
        #[arg(long, allow_hyphen_values = true)]
        latitude: String,
        #[arg(long, allow_hyphen_values = true)]
        longitude: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Switch {
    On,
    Off,
}

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(e) = run().await {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::load(args.config.as_deref()).inspect_err(|e| {
        log::error!(
            "config: {e}. Check all required environment variables ({}) are set.",
            REQUIRED_VARIABLES.join(", ")
        );
    })?;

    config.log();

    let store = FirebaseStore::new(&config.database_url, config.auth_token.clone())?;
    log::info!("Using realtime database ({})", store.base());

    let mut session = CrossingSession::new(store, &config);

    match args.command {
        Command::Status => {
            print!("{}", session.snapshot().await?);
        }
        Command::Watch => {
            session.snapshot().await?;
            print!("{}", session.monitor());

            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    log::error!("could not listen for Ctrl-C: {e}");
                }
            };
            session
                .watch(
                    |monitor, alerts| {
                        println!();
                        print!("{monitor}");
                        for alert in alerts {
                            println!("Warning! {alert}");
                        }
                    },
                    shutdown,
                )
                .await?;
        }
        Command::Set { control, state } => {
            let on = matches!(state, Switch::On);
            session.set_control(control, on).await?;
        }
        Command::Station { action } => match action {
            StationAction::Show => {
                let form = session.load_station_form().await?;
                println!("name       {}", form.name);
                println!("latitude   {}", form.latitude);
                println!("longitude  {}", form.longitude);
            }
            StationAction::Edit {
                name,
                latitude,
                longitude,
            } => {
                let form = StationForm::new(name, latitude, longitude);
                let station = session.save_station(&form).await?;
                println!("Saved {} ({})", station.name, station.location);
            }
        },
        Command::Stations => {
            for station in session.stations().await? {
                println!("{:<24} {}", station.name, station.location);
            }
        }
        Command::Trains => {
            let station = session.snapshot().await?.station.clone();
            let trains = session.trains().await?;
            for train in &trains {
                println!(
                    "{:<16} {}  {:.1} km",
                    train.id,
                    train.location,
                    train.distance_to(&station)
                );
            }
            if let Some((train, distance)) = nearest_train(&station, &trains) {
                println!("nearest to {}: {} ({distance:.1} km)", station.name, train.id);
            }
        }
        Command::Map { output } => {
            let map = match config.layout {
                Layout::Single => CrossingMap::from_monitor(session.snapshot().await?)?,
                Layout::Network => {
                    let stations = session.stations().await?;
                    let trains = session.trains().await?;
                    CrossingMap::from_network(&stations, &trains, config.station.as_deref())?
                }
            };

            let geojson = map.to_geojson_string()?;
            match output {
                Some(path) => std::fs::write(&path, geojson)
                    .with_context(|| format!("Could not write {}", path.display()))?,
                None => println!("{geojson}"),
            }
        }
    }

    Ok(())
}
