use anyhow::Context;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use admitrack::db::init_app_state;
use admitrack::logging::{init_tracing, shutdown_tracer};
use admitrack::metrics::{init_metrics, metrics_app};
use admitrack::router::init_router;
use admitrack_config::{DatabaseConfig, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing().context("Failed to initialize logging")?;

    let server_config = ServerConfig::from_env();

    match init_metrics() {
        Ok(Some(handle)) => {
            let metrics_address = server_config.metrics_address();
            let listener = TcpListener::bind(&metrics_address)
                .await
                .with_context(|| format!("Failed to bind metrics listener on {metrics_address}"))?;
            info!(address = %metrics_address, "Metrics available at /metrics");
            tokio::spawn(async move {
                if let Err(e) = axum::serve(listener, metrics_app(handle)).await {
                    error!(error = %e, "Metrics server stopped");
                }
            });
        }
        Ok(None) => info!("Observability disabled, metrics not exported"),
        Err(e) => error!(error = %e, "Failed to install Prometheus recorder"),
    }

    let state = init_app_state(&DatabaseConfig::from_env()).await?;
    let app = init_router(state);

    let address = server_config.address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!(address = %address, "Server running");
    info!("Swagger UI available at http://{address}/swagger-ui");
    info!("Scalar UI available at http://{address}/scalar");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    shutdown_tracer().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Failed to install terminate handler");
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
