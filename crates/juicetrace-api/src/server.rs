//! Listener setup and graceful shutdown.

use std::future::Future;
use std::net::SocketAddr;

use juicetrace_core::{Result, TraceEngine};
use tokio::net::TcpListener;
use tracing::info;

use crate::routes::router;

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn serve<F>(engine: TraceEngine, addr: SocketAddr, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    serve_listener(engine, listener, shutdown).await
}

/// Serve on an already bound listener until `shutdown` resolves.
///
/// In-flight requests are allowed to finish before this returns.
pub async fn serve_listener<F>(engine: TraceEngine, listener: TcpListener, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(addr = %listener.local_addr()?, "Juice Trace API listening");
    axum::serve(listener, router(engine))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("Juice Trace API stopped");
    Ok(())
}
