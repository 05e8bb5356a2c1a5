// src/main.rs
use load_planner::api;
use load_planner::config::AppConfig;
use log::{LevelFilter, info, warn};

#[tokio::main]
async fn main() {
    // .env may carry RUST_LOG, so it is read before the logger starts
    let dotenv_result = dotenvy::dotenv();

    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(err) = dotenv_result {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            warn!("Could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();
    info!("Load planner starting...");
    api::start_api_server(app_config.api, app_config.optimizer, app_config.container).await;
}
