// Startup: validate config, bind, serve until Ctrl-C / SIGTERM

use std::sync::Arc;
use tokio::net::TcpListener;

use crate::auth::ApiKeyGate;
use crate::config::AppConfig;
use crate::routes;
use crate::sysinfo_repo::SysinfoRepo;

/// Validates `config` and serves until a shutdown signal arrives.
///
/// Fails before binding anything when the secret is empty or the bind/path settings
/// are invalid.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    config.validate()?;
    let addr = config.listen_addr()?;
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("bind {}: {}", addr, e))?;
    serve(listener, config, shutdown_signal()).await
}

/// Serves on an already-bound listener until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    config: AppConfig,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let gate = ApiKeyGate::new(config.auth.apikey.clone())?;
    let repo = Arc::new(SysinfoRepo::new(config.collection.clone()));
    let app = routes::app(repo, gate, &config.server.path, config.server.debug);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        path = %config.server.path,
        "Listening on http://{}",
        listener.local_addr()?
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    tracing::info!("Received shutdown signal");
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    tracing::info!("Received shutdown signal");
}
