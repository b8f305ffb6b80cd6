use clap::Parser;
use evcc_collector::{
    api::{create_router, data_path},
    cli::Cli,
    config::Config,
    distribute::{Distributor, SnapshotStore, WebhookClient},
    evcc::EvccClient,
    scheduler::{Scheduler, SystemClock},
};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let config = match Config::load(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };

    info!("evcc collector v{}", env!("CARGO_PKG_VERSION"));
    info!(
        evcc_url = %config.evcc_url,
        interval = config.interval,
        max_loadpoints = config.max_loadpoints,
        webhook = config.webhook.is_some(),
        serve = config.serve.enabled,
        "configuration loaded"
    );

    let source = EvccClient::new(&config.evcc_url)?;
    let webhook = config.webhook.as_deref().map(WebhookClient::new).transpose()?;
    let store = config.serve.enabled.then(SnapshotStore::new);
    let distributor = Distributor::new(webhook, store.clone()).with_dry_run(config.dry_run);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let server = match store {
        Some(store) => {
            if config.interval == 0 {
                warn!("serve mode with interval 0 exits after the single run");
            }
            let addr = config.serve_addr();
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!("HTTP server listening on {} (data at {})", addr, data_path());

            let app = create_router(store);
            let rx = shutdown_rx.clone();
            Some(tokio::spawn(async move {
                if let Err(e) = axum::serve(listener, app)
                    .with_graceful_shutdown(wait_for_shutdown(rx))
                    .await
                {
                    error!("HTTP server error: {}", e);
                }
            }))
        }
        None => None,
    };

    if config.interval > 0 {
        info!(
            "running continuously with {}s interval (Ctrl+C to stop)",
            config.interval
        );
    }

    let mut scheduler = Scheduler::new(
        source,
        distributor,
        config.build_options()?,
        SystemClock,
        config.interval(),
    );
    let summary = scheduler.run(wait_for_shutdown(shutdown_rx)).await;

    info!(
        cycles = summary.cycles,
        failures = summary.failures,
        "collector stopped"
    );

    if config.interval == 0 {
        if !summary.last_succeeded {
            anyhow::bail!("collection failed");
        }
        return Ok(());
    }

    if let Some(server) = server {
        server.await?;
        info!("Server shutdown complete");
    }

    Ok(())
}

async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            return;
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully");
        },
    }
}
