use std::future::pending;

use services::AppServices;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use crate::cli::ServeArgs;

/// Bind and serve the API until Ctrl+C or SIGTERM.
///
/// # Errors
///
/// Returns an I/O error if the address cannot be bound or serving fails.
pub async fn serve(services: AppServices, args: &ServeArgs) -> std::io::Result<()> {
    let app = api::router(services);

    let address = format!("{}:{}", args.host, args.port);
    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {err}");
            pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                error!("Failed to install signal handler: {err}");
                pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
