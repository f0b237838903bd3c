use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use printer_monitor::config::AppConfig;
use printer_monitor::handlers::AppState;
use printer_monitor::routes::create_router;
use printer_monitor::scheduler::{RefreshScheduler, SnmpPoller};
use printer_monitor::store::{PrinterStore, StateStore};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::load()?;
    info!(
        printers = config.printers.len(),
        bind = %config.http.bind,
        state_file = ?config.storage.state_file,
        "конфигурация загружена"
    );

    let store: Arc<dyn PrinterStore> = match &config.storage.state_file {
        Some(path) => Arc::new(StateStore::open(
            path,
            config.printers.clone(),
            config.refresh.interval_minutes,
        )?),
        None => Arc::new(StateStore::in_memory(
            config.printers.clone(),
            config.refresh.interval_minutes,
        )),
    };

    let poller = Arc::new(SnmpPoller::new(&config.snmp));
    let scheduler = Arc::new(RefreshScheduler::new(
        Arc::clone(&store),
        poller,
        config.refresh.max_parallel,
    ));
    scheduler.start().await;

    let app = create_router(AppState {
        store,
        scheduler: Arc::clone(&scheduler),
    });

    let listener = tokio::net::TcpListener::bind(&config.http.bind)
        .await
        .context(format!("Не удалось занять адрес {}", config.http.bind))?;
    info!(bind = %config.http.bind, "HTTP сервер запущен");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP сервер завершился с ошибкой")?;

    scheduler.stop().await;
    info!("остановлено");
    Ok(())
}

/// RUST_LOG, если задан и корректен; иначе info
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "не удалось подписаться на Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("получен сигнал остановки");
}
