use actix_web::web;
use server::config::ServerConfig;
use server::state::AppState;
use std::fs;
use tracing::info;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing with env filter
    // Filter out actix-server worker shutdown messages
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,actix_server::worker=warn,actix_server::accept=warn")
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting case service (PID: {})", std::process::id());

    let config = ServerConfig::load()?;

    if !config.data_dir.exists() {
        fs::create_dir_all(&config.data_dir)?;
    }
    info!("Storing dumps under {:?}", config.data_dir);
    info!(
        "Simulated pipeline: queued for {:?}, processing for {:?}",
        config.pipeline.queue(),
        config.pipeline.processing()
    );

    let state = web::Data::new(AppState::new(config.data_dir.clone(), config.pipeline));
    let bind_address = config.bind_address();
    let (server, addresses) = server::bind(state, bind_address.as_str())?;

    for address in addresses {
        info!("Server bound successfully to http://{}", address);
    }

    // Runs until the server receives a shutdown signal
    server.await
}
