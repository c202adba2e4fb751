use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use cropsense::advisory::engine::{apply_advisory_rules, evaluate_advisories};
use cropsense::advisory::sink::{AdvisorySink, StdoutSink, WebhookSink};
use cropsense::config::{Config, ConfigOverrides};
use cropsense::engine::predictor::predict;
use cropsense::engine::profiles::crop_catalog;
use cropsense::engine::{PredictionResult, SoilReading, SoilType, WeatherReading};
use cropsense::output::csv::{alerts_to_csv, history_to_csv};
use cropsense::output::json::render_json;
use cropsense::output::table::{
    render_alerts_table, render_crops_table, render_diseases_table, render_history_table,
    render_prediction, render_profile_table,
};
use cropsense::server::run_server;
use cropsense::store::cache::HistoryCache;
use cropsense::store::client::TableStore;
use cropsense::store::{PredictionRecord, ProfileChanges};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(name = "cropsense", about = "Crop disease advisory from field readings")]
struct Cli {
    #[arg(short, long)]
    user: Option<String>,
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long)]
    region: Option<String>,
    #[arg(long = "store-url")]
    store_url: Option<String>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Predict {
        #[arg(long)]
        crop: String,
        #[arg(long)]
        temperature: f64,
        #[arg(long)]
        humidity: f64,
        #[arg(long, default_value_t = 0.0)]
        rainfall: f64,
        #[arg(long = "soil-type", default_value = "Loamy")]
        soil_type: String,
        #[arg(long = "soil-moisture", default_value_t = 50.0)]
        soil_moisture: f64,
        #[arg(long = "no-save")]
        no_save: bool,
    },
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long)]
        crop: Option<String>,
        #[arg(long)]
        local: bool,
        #[arg(long)]
        stats: bool,
        #[arg(long)]
        disease: Option<String>,
        #[arg(long)]
        delete: Option<String>,
    },
    Alerts {
        #[arg(long)]
        region: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    Crops,
    Diseases {
        #[arg(long)]
        crop: Option<String>,
    },
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long = "primary-crop")]
        primary_crop: Option<String>,
        #[arg(long = "farm-size")]
        farm_size: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 3002)]
        port: u16,
    },
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[derive(Debug, Serialize)]
struct PredictionReport {
    crop_type: String,
    result: PredictionResult,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    config.apply_overrides(ConfigOverrides {
        user_id: cli.user.clone(),
        region: cli.region.clone(),
        store_url: cli.store_url.clone(),
    });

    match &cli.command {
        Commands::Config { init, show } => {
            if *init {
                Config::write_template(&config_path)?;
                println!("Wrote config template to {}", config_path.display());
            }
            if *show || !*init {
                println!("{}", render_json(&config)?);
            }
        }
        Commands::Serve { host, port } => {
            let bind = format!("{host}:{port}");
            let addr: SocketAddr = bind
                .parse()
                .map_err(|e| anyhow!("invalid bind address {bind}: {e}"))?;
            run_server(config, addr).await?;
        }
        Commands::Crops => match cli.output {
            OutputFormat::Table => println!("{}", render_crops_table()),
            OutputFormat::Json => println!("{}", render_json(&crop_catalog())?),
            OutputFormat::Csv => {
                warn!("CSV output for crops not implemented, using JSON");
                println!("{}", render_json(&crop_catalog())?);
            }
        },
        Commands::Predict {
            crop,
            temperature,
            humidity,
            rainfall,
            soil_type,
            soil_moisture,
            no_save,
        } => {
            let soil_type = SoilType::from_str(soil_type)?;
            let weather = WeatherReading {
                temperature: *temperature,
                humidity: *humidity,
                rainfall: *rainfall,
            };
            let soil = SoilReading {
                soil_type,
                moisture: *soil_moisture,
            };
            run_predict(&config, crop, &weather, &soil, *no_save, cli.output).await?;
        }
        Commands::History {
            limit,
            crop,
            local,
            stats,
            disease,
            delete,
        } => {
            let user_id = require_user(&config)?;
            if let Some(id) = delete {
                if !store_configured(&config) {
                    return Err(anyhow!("remote store is not configured; delete needs it"));
                }
                let store = TableStore::new(&config.store)?;
                store.delete_prediction(id).await?;
                info!("deleted prediction {id}");
            } else if *stats {
                let total = if *local || !store_configured(&config) {
                    let cache = HistoryCache::open(&config.resolved_db_path())?;
                    cache.count_predictions(&user_id, disease.as_deref())?
                } else {
                    let store = TableStore::new(&config.store)?;
                    store.count_predictions(&user_id, disease.as_deref()).await?
                };
                match disease {
                    Some(disease) => println!("{total} predictions of {disease} for {user_id}"),
                    None => println!("{total} predictions for {user_id}"),
                }
            } else {
                let records = if *local || !store_configured(&config) {
                    let cache = HistoryCache::open(&config.resolved_db_path())?;
                    cache.load_history(&user_id, crop.as_deref(), (*limit).max(1))?
                } else {
                    let store = TableStore::new(&config.store)?;
                    store
                        .load_predictions(&user_id, crop.as_deref(), (*limit).max(1))
                        .await?
                };
                match cli.output {
                    OutputFormat::Table => println!("{}", render_history_table(&records)),
                    OutputFormat::Json => println!("{}", render_json(&records)?),
                    OutputFormat::Csv => println!("{}", history_to_csv(&records)?),
                }
            }
        }
        Commands::Diseases { crop } => {
            if !store_configured(&config) {
                return Err(anyhow!(
                    "remote store is not configured; disease info needs it"
                ));
            }
            let store = TableStore::new(&config.store)?;
            let entries = store.disease_info(crop.as_deref()).await?;
            match cli.output {
                OutputFormat::Table => println!("{}", render_diseases_table(&entries)),
                _ => println!("{}", render_json(&entries)?),
            }
        }
        Commands::Alerts { region, limit } => {
            if !store_configured(&config) {
                return Err(anyhow!("remote store is not configured; alerts need it"));
            }
            let store = TableStore::new(&config.store)?;
            let region = region
                .as_deref()
                .or_else(|| non_empty(&config.farmer.region));
            let alerts = store.active_alerts(region, (*limit).max(1)).await?;
            match cli.output {
                OutputFormat::Table => println!("{}", render_alerts_table(&alerts)),
                OutputFormat::Json => println!("{}", render_json(&alerts)?),
                OutputFormat::Csv => println!("{}", alerts_to_csv(&alerts)?),
            }
        }
        Commands::Profile {
            name,
            location,
            primary_crop,
            farm_size,
            phone,
        } => {
            let user_id = require_user(&config)?;
            if !store_configured(&config) {
                return Err(anyhow!("remote store is not configured; profile needs it"));
            }
            let store = TableStore::new(&config.store)?;
            let changes = ProfileChanges {
                full_name: name.clone(),
                location: location.clone(),
                primary_crop: primary_crop.clone(),
                farm_size: farm_size.clone(),
                phone: phone.clone(),
            };
            if changes.is_empty() {
                match store.load_profile(&user_id).await? {
                    Some(profile) => match cli.output {
                        OutputFormat::Table => println!("{}", render_profile_table(&profile)),
                        _ => println!("{}", render_json(&profile)?),
                    },
                    None => println!("No profile found for {user_id}"),
                }
            } else {
                store.update_profile(&user_id, &changes).await?;
                info!("profile updated for {user_id}");
            }
        }
    }

    Ok(())
}

async fn run_predict(
    config: &Config,
    crop: &str,
    weather: &WeatherReading,
    soil: &SoilReading,
    no_save: bool,
    output: OutputFormat,
) -> Result<()> {
    let result = predict(crop, weather, soil);

    match output {
        OutputFormat::Table => println!("{}", render_prediction(crop, &result)),
        OutputFormat::Json => {
            let report = PredictionReport {
                crop_type: crop.to_string(),
                result: result.clone(),
            };
            println!("{}", render_json(&report)?);
        }
        OutputFormat::Csv => {
            warn!("CSV output for predict not implemented, using JSON");
            let report = PredictionReport {
                crop_type: crop.to_string(),
                result: result.clone(),
            };
            println!("{}", render_json(&report)?);
        }
    }

    let user_id = config.farmer.user_id.trim().to_string();
    let cache = HistoryCache::open(&config.resolved_db_path())?;

    if !no_save {
        if user_id.is_empty() {
            warn!("no user id configured; prediction not saved");
        } else {
            let record = PredictionRecord::from_result(&user_id, crop, &result, weather, soil);
            cache
                .insert_prediction(&record)
                .context("failed caching prediction locally")?;
            if store_configured(config) {
                let store = TableStore::new(&config.store)?;
                store
                    .insert_prediction(&record)
                    .await
                    .context("failed persisting prediction to remote store")?;
            }
        }
    }

    let recent_history = if user_id.is_empty() {
        Vec::new()
    } else {
        cache.load_history(&user_id, None, 20).unwrap_or_default()
    };
    let regional_alerts = if store_configured(config) {
        let store = TableStore::new(&config.store)?;
        store
            .active_alerts(non_empty(&config.farmer.region), 10)
            .await
            .unwrap_or_else(|err| {
                warn!("failed fetching regional alerts: {err}");
                Vec::new()
            })
    } else {
        Vec::new()
    };

    let advisories = apply_advisory_rules(
        evaluate_advisories(crop, &result, &recent_history, &regional_alerts),
        config,
    );
    if !advisories.is_empty() {
        let mut sinks: Vec<Box<dyn AdvisorySink>> = Vec::new();
        if config.advisories.enable_stdout {
            sinks.push(Box::new(StdoutSink));
        }
        if !config.advisories.webhook_url.trim().is_empty() {
            sinks.push(Box::new(WebhookSink::new(
                config.advisories.webhook_url.clone(),
            )?));
        }
        for advisory in &advisories {
            for sink in &sinks {
                if let Err(err) = sink.send(advisory).await {
                    warn!("failed sending advisory: {err}");
                }
            }
        }
    }

    Ok(())
}

fn require_user(config: &Config) -> Result<String> {
    let user_id = config.farmer.user_id.trim();
    if user_id.is_empty() {
        return Err(anyhow!("user id is required (--user or config [farmer])"));
    }
    Ok(user_id.to_string())
}

fn store_configured(config: &Config) -> bool {
    config.store.enabled && !config.store.url.trim().is_empty()
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
