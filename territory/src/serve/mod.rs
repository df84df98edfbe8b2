//! HTTP surface.
//!
//! `GET /clipped-polygons?tier=coarse|fine` serves a tier's collection with
//! a weak `ETag` derived from the artifact's size and mtime and answers
//! matching `If-None-Match` requests with `304`. `PATCH /target/:id` moves a
//! site. Both are also mounted under `/api/v1`.

mod routes;
mod validator;

use std::io;
use std::net::SocketAddr;

use tracing::info;

pub use routes::{router, AppState, API_PREFIX, CACHE_CONTROL_VALUE};
pub use validator::WeakValidator;

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: SocketAddr, state: AppState) -> io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Territory server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
}
