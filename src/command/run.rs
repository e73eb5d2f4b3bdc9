use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use kvstore::KVDb;
use tokio::net::TcpListener;

use crate::{
    argsets::RunArgs,
    constants::{defaults, envvars},
    data_mgmt::{ConfigStore, ReadingStore, SqliteReadingStore},
    interfaces::{
        http_api::{self, AppState},
        kvpath,
    },
    readers::serial_json::{IngestionLoop, LoopTiming, SerialConnector, SerialDeviceConfig},
};

/// Run the serial ingestion loop and the HTTP API until interrupted
pub fn run(args: RunArgs) -> Result<()> {
    let device = SerialDeviceConfig::from_env(args.port, args.baud)?;
    let listen_addr = args
        .listen
        .or_else(|| env::var(envvars::LISTEN_ADDR).ok())
        .unwrap_or_else(|| defaults::LISTEN_ADDR.to_string());

    // Missing stores are fatal; nothing after this point is
    let kvs = KVDb::new(kvpath::SQLITE_STORE.as_path())
        .with_context(|| format!("opening settings store {}", kvpath::SQLITE_STORE.display()))?;
    let settings = Arc::new(ConfigStore::load_or_default(kvs)?);
    let readings: Arc<dyn ReadingStore> = Arc::new(
        SqliteReadingStore::open(kvpath::SQLITE_READINGS.as_path()).with_context(|| {
            format!("opening reading store {}", kvpath::SQLITE_READINGS.display())
        })?,
    );

    let ingestion = IngestionLoop::new(
        SerialConnector::new(device),
        Arc::clone(&settings),
        Arc::clone(&readings),
        LoopTiming::default(),
    )
    .spawn()?;

    let runtime = tokio::runtime::Runtime::new()?;
    let served: std::io::Result<()> = runtime.block_on(async {
        let listener = TcpListener::bind(&listen_addr).await?;
        http_api::serve(listener, AppState { settings, readings }, shutdown_signal()).await
    });

    log::info!("Shutting down");
    ingestion.stop();
    served.with_context(|| format!("serving API on {listen_addr}"))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
