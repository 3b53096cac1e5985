use std::{net::SocketAddrV4, sync::Arc, time::Duration};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use eyre::Result;
use tokio::{net::TcpListener, time::timeout};
use tracing::info;

use crate::db::TransferSink;
use crate::provider::EventSource;

/// Liveness probes must answer in bounded time.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct AppState {
    pub sink: Arc<dyn TransferSink>,
    pub source: Arc<dyn EventSource>,
}

pub fn make_router(state: AppState) -> Router {
    Router::new()
        .route("/healthcheck", get(healthcheck))
        .with_state(state)
}

pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let app = make_router(state);

    let addr = SocketAddrV4::new(std::net::Ipv4Addr::new(0, 0, 0, 0), port);
    let listener = TcpListener::bind(addr).await?;
    info!("API server running on {}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    Ok(())
}

pub(crate) async fn healthcheck(State(state): State<AppState>) -> Response {
    match probe(&state).await {
        Ok(()) => (StatusCode::OK, "ok").into_response(),
        Err(reason) => (StatusCode::INTERNAL_SERVER_ERROR, reason).into_response(),
    }
}

/// Both adapters must be reachable for a healthy verdict.
async fn probe(state: &AppState) -> Result<(), String> {
    match timeout(PROBE_TIMEOUT, state.sink.ping()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(format!("sink unreachable: {e}")),
        Err(_) => return Err("sink probe timed out".to_owned()),
    }

    match timeout(PROBE_TIMEOUT, state.source.current_block_number()).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => return Err(format!("node unreachable: {e}")),
        Err(_) => return Err("node probe timed out".to_owned()),
    }

    Ok(())
}
