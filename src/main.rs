//! Ambient health/readiness surface. The valuation API itself is a library
//! consumed by an external HTTP layer (out of scope here, per system
//! scope) — this binary only proves the process is alive and the spatial
//! store is reachable, in the same shape as the teacher's original server.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use moscow_valuation::config::Settings;
use moscow_valuation::db::PgSpatialStore;
use serde::Serialize;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[derive(Clone)]
struct AppState {
    store: PgSpatialStore,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("🏠 starting moscow-valuation health surface...");
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;

    tracing::info!("📦 connecting to spatial store...");
    let store = PgSpatialStore::connect(&settings.database_url, settings.db_max_connections).await?;
    tracing::info!("✅ spatial store connected");

    let state = AppState { store };

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 3001));
    tracing::info!("🚀 listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn readiness_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, StatusCode> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.store.pool)
        .await
        .map_err(|e| {
            tracing::error!("readiness probe failed: {e}");
            StatusCode::SERVICE_UNAVAILABLE
        })?;
    Ok(Json(HealthResponse { status: "ready" }))
}
