use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use env_logger::Env;
use gdrive::DriveClient;

use image_server::{
    config::Config,
    db::{self, tables::DB},
    import::{InMemoryImporter, Staging},
    router,
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = Config::from_env().context("invalid environment")?;
    log::info!("Environment: {:?}", &config);
    if config.google_api_key.is_none() {
        log::warn!("GOOGLE_API_KEY is not set, Drive imports will fail");
    }

    // Generate a managed connection for the SQLite DB.
    let mut conn = DB::open(&config.db_path).context("failed to load DB")?;
    db::migrate(&mut conn).context("failed to migrate DB")?;
    let db = Arc::new(DB::new(conn));

    let staging = match &config.storage_dir {
        Some(root_dir) => Staging::Disk {
            root_dir: root_dir.clone(),
            public_url: config.public_url(),
        },
        None => Staging::Linked,
    };
    let drive = DriveClient::with_api_url(&config.drive_api_url, config.google_api_key.clone());
    let importer = InMemoryImporter::new(Arc::clone(&db), Arc::new(drive), staging);

    let state = AppState {
        db,
        importer: Arc::new(importer),
    };
    let app = router::app(state, config.storage_dir.as_deref());

    let listen_addr = SocketAddr::from((config.host, config.port));
    log::info!("Listening on {}", listen_addr);
    axum::Server::bind(&listen_addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("failed to start axum server")?;

    log::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("failed to install Ctrl+C handler: {}", err);
        std::future::pending::<()>().await;
    }
    log::info!("Received Ctrl+C, shutting down");
}
