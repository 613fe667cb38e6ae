use crate::assets::HttpAssetSource;
use crate::config::Config;
use crate::inference::GradioClient;
use crate::preview::PreviewRegistry;
use crate::server::{HttpServer, SharedState};
use crate::session::{expire_idle_sessions, SessionStore};
use crate::telemetry::Metrics;

use std::{error::Error, sync::Arc};
use tokio::{signal, sync::broadcast};

pub async fn start_app(config: Config) -> Result<(), Box<dyn Error>> {
    let inference = match GradioClient::from_config(&config.inference) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::error!("Failed to initialize inference client: {:?}", e);
            return Err(Box::new(e));
        }
    };
    tracing::info!(
        "Classifying through {} with a {}s budget",
        config.inference.base_url,
        config.inference.timeout_secs
    );

    let assets = match HttpAssetSource::from_config(&config.assets) {
        Ok(source) => Arc::new(source),
        Err(e) => {
            tracing::error!("Failed to initialize asset loader: {:?}", e);
            return Err(Box::new(e));
        }
    };

    let previews = PreviewRegistry::new();
    let sessions = Arc::new(SessionStore::new(inference, assets, previews.clone()));

    let state = SharedState {
        sessions: sessions.clone(),
        previews,
        assets_dir: config.assets.dir.clone(),
        metrics: Arc::new(Metrics::new()?),
    };

    let server = HttpServer::new(state, &config.server).await?;

    let (shutdown_tx, _) = broadcast::channel(1);
    let server_shutdown_rx = shutdown_tx.subscribe();

    let server_handle = server.run(server_shutdown_rx).await?;

    tracing::info!(
        "Sessions expire after {}s without use",
        config.sessions.idle_timeout_secs
    );
    let sweeper_handle = tokio::spawn(expire_idle_sessions(
        sessions.clone(),
        config.sessions.get_idle_timeout(),
        config.sessions.get_sweep_interval(),
        shutdown_tx.subscribe(),
    ));

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown.");

    let _ = shutdown_tx.send(());
    let _ = server_handle.await;
    let _ = sweeper_handle.await;
    sessions.shutdown_all();

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
