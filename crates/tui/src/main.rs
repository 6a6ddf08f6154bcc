mod app;

use anyhow::Result;
use std::fs::{self, OpenOptions};

use tracing_subscriber::{prelude::*, EnvFilter};
use worldnav_core::{
    config::{self, AppConfig},
    BlobStore, CityCatalog, CityStore, FileBlobStore, JsonCityStore, MemoryBlobStore,
    MemoryCityStore, ProgressionController, RankingStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    config::ensure_default_config()?;
    let config = AppConfig::load()?;

    let (city_store, blob_store): (Box<dyn CityStore>, Box<dyn BlobStore>) = if config.persist {
        (
            Box::new(JsonCityStore::in_dir(&config.data_dir)),
            Box::new(FileBlobStore::new(&config.data_dir)),
        )
    } else {
        (
            Box::new(MemoryCityStore::new()),
            Box::new(MemoryBlobStore::new()),
        )
    };

    let catalog = match CityCatalog::open(city_store.as_ref()) {
        Ok(catalog) => catalog,
        Err(err) => {
            tracing::error!("City store unavailable, using built-in cities: {err}");
            CityCatalog::open(&MemoryCityStore::new())?
        }
    };

    let rankings = RankingStore::load(blob_store);
    let controller = ProgressionController::with_system_clock(rankings);

    let mut app = app::WorldNavApp::new(controller, catalog, config.rng());
    app.run().await
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("worldnav.log");

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // The terminal UI owns stdout, so logs only go to the file.
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
