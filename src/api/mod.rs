//! Loopback REST API for momsync.
//!
//! The HTTP surface is the app's control panel: session start/stop/reset,
//! live status for an elapsed-time display, the generated minutes, and the
//! mic privacy controls.

pub mod error;
pub mod routes;

use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tracing::info;

pub use routes::session::{ApiCommand, SessionApiState};

pub struct ApiServer {
    port: u16,
    session_state: SessionApiState,
}

impl ApiServer {
    pub fn new(port: u16, session_state: SessionApiState) -> Self {
        Self {
            port,
            session_state,
        }
    }

    pub async fn start(self) -> Result<()> {
        let app = Router::new()
            .route("/", get(status))
            .route("/version", get(version))
            .merge(routes::session::router(self.session_state))
            .layer(ServiceBuilder::new());

        let listener = tokio::net::TcpListener::bind(&format!("127.0.0.1:{}", self.port)).await?;

        info!("API server listening on http://127.0.0.1:{}", self.port);
        info!("Endpoints:");
        info!("  GET  /             - Service info");
        info!("  GET  /version      - Version info");
        info!("  POST /start        - Start a capture session");
        info!("  POST /stop         - Stop and generate minutes");
        info!("  POST /reset        - Clear the result or error");
        info!("  GET  /status       - Session phase and mic state");
        info!("  GET  /minutes      - Generated minutes (JSON)");
        info!("  POST /mic          - Toggle microphone capture");
        info!("  POST /sensitivity  - Set voice gate sensitivity (1-50)");

        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn status() -> Json<Value> {
    Json(json!({
        "service": "momsync",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn version() -> Json<Value> {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "name": "momsync"
    }))
}
