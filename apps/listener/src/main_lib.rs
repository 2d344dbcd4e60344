use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use canvas_studio_core::gateway::reply_channel;
use canvas_studio_core::status::StatusSink;
use canvas_studio_core::Scheduler;

use crate::config::{Config, LogFormat};
use crate::firebase::{ChangeFeed, FirebaseSession, FirebaseStatusSink};
use crate::gateway::TcpGatewayClient;

/// Installs the subscriber. `RUST_LOG` filters, `info` by default; `log`
/// records from the core crate are bridged in by `init()`.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init(),
    }
}

/// The running listener: scheduler plus the change feed feeding it.
pub struct Listener {
    scheduler: Scheduler,
    feed: JoinHandle<()>,
    feed_shutdown: watch::Sender<bool>,
}

pub async fn build_listener(config: &Config) -> anyhow::Result<Listener> {
    let session = FirebaseSession::new(&config.firebase_url, config.firebase_secret.clone())?;
    tracing::info!("Studio database: {}", session.base_url());

    let (reply_tx, reply_rx) = reply_channel();
    let gateway = TcpGatewayClient::connect(&config.gateway_addr, reply_tx).await?;
    let sink: Arc<dyn StatusSink> = Arc::new(FirebaseStatusSink::new(
        session.clone(),
        config.request_timeout,
    ));

    let scheduler = Scheduler::start(config.scheduler.clone(), Arc::new(gateway), reply_rx, sink)?;

    let (feed_shutdown, feed_shutdown_rx) = watch::channel(false);
    let feed = ChangeFeed::new(session, scheduler.handle(), config.feed_backoff)
        .spawn(feed_shutdown_rx);

    Ok(Listener {
        scheduler,
        feed,
        feed_shutdown,
    })
}

impl Listener {
    /// Stops the feed first so nothing new reaches the scheduler, then the
    /// scheduler itself.
    pub async fn shutdown(mut self) {
        self.feed_shutdown.send_replace(true);
        if let Err(e) = (&mut self.feed).await {
            tracing::warn!("Change feed ended abnormally: {}", e);
        }
        self.scheduler.stop().await;
    }
}
