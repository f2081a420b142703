//! garagelib-bot - GarageLib chat bot
//!
//! Users upload audio, save it to a personal catalog or publish it to the
//! common playlist under one of their artist cards; other users are told
//! about new common tracks.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

use garagelib_bot::config::{Args, BotSettings};
use garagelib_bot::dispatch::{Dispatcher, UserQueues};
use garagelib_bot::runner::run_polling;
use garagelib_bot::services::{announce_version, CatalogBrowser, PublishPipeline};
use garagelib_bot::transport::{TelegramClient, Transport};
use garagelib_bot::workflow::{SessionStore, UploadWorkflow};
use garagelib_bot::AppState;
use garagelib_common::config::{ensure_root_folder, resolve_root_folder, TomlConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = TomlConfig::load_or_default(args.config.as_deref())
        .context("Failed to load config file")?;
    let settings = BotSettings::resolve(&args, &toml_config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .init();

    info!(
        "Starting GarageLib bot (garagelib-bot) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Bot version: {}", settings.bot_version);

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &toml_config);
    let db_path = ensure_root_folder(&root_folder).context("Failed to initialize root folder")?;
    info!("Database: {}", db_path.display());

    let db = garagelib_common::db::init_database(&db_path)
        .await
        .context("Failed to open catalog database")?;
    info!("✓ Catalog database ready");

    let client = Arc::new(TelegramClient::new(
        &settings.bot_token,
        settings.api_base_url.as_deref(),
        settings.poll_timeout_secs,
    )?);
    let transport: Arc<dyn Transport> = client.clone();

    match announce_version(
        &db,
        transport.as_ref(),
        &settings.bot_version,
        settings.release_notes.as_deref(),
        settings.notify_delay,
    )
    .await
    {
        Ok(Some(report)) => info!("Announced {}: {}", settings.bot_version, report),
        Ok(None) => {}
        Err(e) => warn!(error = %e, "Version announcement failed"),
    }

    let sessions = SessionStore::new();
    let pipeline = PublishPipeline::new(
        db.clone(),
        transport.clone(),
        settings.storage_chat_id,
        settings.notify_delay,
    );
    let workflow = UploadWorkflow::new(db.clone(), sessions.clone(), pipeline);
    let browser = CatalogBrowser::new(
        db.clone(),
        transport.clone(),
        settings.storage_chat_id,
        settings.bot_version.clone(),
    );
    let queues = UserQueues::new(Arc::new(Dispatcher::new(workflow, browser, transport)));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    if let Some(max_idle) = settings.session_idle_expiry {
        info!("Idle sessions expire after {}s", max_idle.as_secs());
        let sessions = sessions.clone();
        let mut shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(max_idle / 2);
            loop {
                tokio::select! {
                    _ = interval.tick() => { sessions.sweep_idle(max_idle).await; }
                    _ = shutdown.changed() => break,
                }
            }
        });
    }

    if let Some(port) = settings.health_port {
        let app = garagelib_bot::build_router(AppState::new(
            db.clone(),
            sessions.clone(),
            settings.bot_version.clone(),
        ));
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .context("Failed to bind health port")?;
        info!("Health check: http://{}/health", addr);

        let mut shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown.changed().await;
                })
                .await;
            if let Err(e) = served {
                error!(error = %e, "Health server failed");
            }
        });
    }

    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    run_polling(client.as_ref(), &queues, settings.poll_timeout_secs, shutdown_rx).await;

    queues.close().await;
    db.close().await;
    info!("Shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
