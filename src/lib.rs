pub mod channels;    // Inter-component communication channels
pub mod config;      // Configuration management
pub mod coordinator; // Poll orchestration and metric emission
pub mod energy;      // Energy accumulation and persistence
pub mod error;       // Poll failure taxonomy
pub mod marstek;     // Marstek CT meter protocol implementation
pub mod options;     // Command line options parsing
pub mod prelude;     // Common imports and types
pub mod scheduler;   // Tick loop driving the coordinator

const CARGO_PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

use crate::coordinator::{ChannelData, Coordinator};
use crate::prelude::*;
use crate::scheduler::Scheduler;
use std::io::Write;

/// Main application entry point: load config, wire the components together
/// and run until the shutdown signal arrives.
pub async fn app(mut shutdown_rx: broadcast::Receiver<()>, options: Options) -> Result<()> {
    let config = Config::new(options.config_file.clone()).unwrap_or_else(|err| {
        eprintln!("Failed to load config {}: {:?}", options.config_file, err);
        std::process::exit(255);
    });

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.loglevel()),
    )
    .format(|buf, record| {
        writeln!(
            buf,
            "[{} {} {}] {}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
            record.level(),
            record.module_path().unwrap_or(""),
            record.args()
        )
    })
    .write_style(env_logger::WriteStyle::Never)
    .init();

    info!(
        "marstek-bridge {} starting with config file: {}",
        CARGO_PKG_VERSION, options.config_file
    );
    info!(
        "polling meter at {}:{} ({} / {}) every {}s",
        config.host(),
        config.port(),
        config.device_type,
        config.ct_type,
        config.refresh_interval
    );

    let channels = Channels::new();

    let coordinator = Coordinator::new(&config, channels.clone());
    let scheduler = Scheduler::new(channels.clone());
    let scheduler_handle = tokio::spawn(async move {
        if let Err(e) = scheduler.start(coordinator).await {
            error!("Scheduler task failed: {}", e);
        }
    });

    let reporter_channels = channels.clone();
    let reporter_handle = tokio::spawn(async move {
        readings_reporter(reporter_channels).await;
    });

    let _ = shutdown_rx.recv().await;

    info!("Shutdown signal received, stopping components...");
    let _ = channels.readings.send(ChannelData::Shutdown);

    if let Err(e) = scheduler_handle.await {
        error!("Error waiting for scheduler task: {}", e);
    }
    if let Err(e) = reporter_handle.await {
        error!("Error waiting for reporter task: {}", e);
    }

    info!("Shutdown complete");
    Ok(())
}

/// In-process stand-in for the host platform's sensor entities: subscribes
/// to the readings channel and logs each value. An MQTT or HA publisher
/// would attach at this seam.
async fn readings_reporter(channels: Channels) {
    let mut receiver = channels.readings.subscribe();

    while let Ok(data) = receiver.recv().await {
        match data {
            ChannelData::Reading(reading) => info!("{} = {}", reading.name, reading.value),
            ChannelData::Shutdown => break,
        }
    }
}
