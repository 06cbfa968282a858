//! HTTP layer: the streamed search, selection re-rendering and the static UI.

pub mod routes;
pub mod types;

use std::{net::SocketAddr, path::PathBuf};

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;

use crate::{config::Settings, pipeline::Pipeline};

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    /// Shared by every request for its HTTP connection pool; each search connection
    /// takes its own ticket, so searches from different clients run independently.
    pub pipeline: Pipeline,
}

impl AppState {
    pub fn new(settings: Settings) -> Result<Self> {
        let pipeline = Pipeline::new(&settings)?;
        Ok(Self { settings, pipeline })
    }
}

pub fn router(state: AppState, static_dir: PathBuf) -> Router {
    Router::new()
        .route("/api/search", get(routes::search))
        .route("/api/render", post(routes::render_selection))
        .route("/api/edges", post(routes::edges))
        .route("/api/tools", get(routes::list_tools))
        .route("/api/studies/:nct_id", get(routes::study))
        .fallback_service(ServeDir::new(static_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn serve(settings: Settings, host: String, port: u16, static_dir: PathBuf) -> Result<()> {
    let router = router(AppState::new(settings)?, static_dir);

    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    info!(%addr, "serving trial-scope");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;
    Ok(())
}
