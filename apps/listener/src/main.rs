mod config;
mod error;
mod firebase;
mod gateway;
mod main_lib;

use config::Config;
use main_lib::{build_listener, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);
    let listener = build_listener(&config).await?;
    tracing::info!(
        "Listening for Studio changes, gateway at {}",
        config.gateway_addr
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");
    listener.shutdown().await;
    Ok(())
}
