use slotflow::{
    CsvTableStore, ExplorerConfig, HttpSlotSource, SlotExplorer, TrackerService,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config = ExplorerConfig::from_env();
    if let Ok(path) = std::env::var("SLOTFLOW_SETTINGS_FILE") {
        config.apply_settings_file(&path)?;
    }

    log::info!("Starting slotflow...");
    log::info!("Configuration:");
    log::info!("   RPC URL: {}", config.rpc_url);
    log::info!("   Windows per run: {}", config.n_batches_to_explore);
    log::info!("   Jump: {} slots", config.jump);
    log::info!("   Tolerance window: {}s", config.seconds_per_batch);
    log::info!("   Table: {}", config.table_path);

    let source = HttpSlotSource::new(config.rpc_url.clone())?;
    let store = CsvTableStore::new(&config.table_path);
    let explorer = SlotExplorer::new(source, config);
    let service = Arc::new(TrackerService::new(explorer, store));

    let updater = service.spawn();

    // Stand-in for the dashboard: periodically report the snapshot the
    // presentation layer would render.
    let mut timer = tokio::time::interval(Duration::from_secs(30));
    let reporter = {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            loop {
                timer.tick().await;
                let snapshot = service.snapshot().await;
                match snapshot.cursor {
                    Some(cursor) => log::info!(
                        "Table: {} rows, last examined slot #{}, latest validated #{}",
                        snapshot.rows.len(),
                        cursor,
                        snapshot.latest_validated
                    ),
                    None => log::info!("Fetching data from RPC endpoint..."),
                }
            }
        })
    };

    let _ = tokio::try_join!(updater, reporter)?;
    Ok(())
}
