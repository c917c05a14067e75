//! Daily grid-aggregate batch recompute. Walks every known property segment
//! and upserts a fresh top-level aggregate row, same orchestration shape as
//! the old data-ingestion pipeline binary this was ported from: config from
//! env, numbered steps, a ✓/✗ status line per unit of work.

use anyhow::Result;
use moscow_valuation::config::Settings;
use moscow_valuation::db::PgSpatialStore;
use moscow_valuation::grid;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_target(false).with_level(true).init();

    info!("Starting grid aggregate refresh");

    let settings = Settings::from_env()?;
    info!("Configuration loaded");

    let store = PgSpatialStore::connect(&settings.database_url, settings.db_max_connections).await?;
    info!("Database connected");

    info!("Step 1/2: loading known segments...");
    let segments = store.list_all_segments().await?;
    info!("✓ loaded {} segments", segments.len());

    info!("Step 2/2: recomputing aggregates...");
    match grid::recompute_all_segments(&store, &segments).await {
        Ok(updated) => info!("✓ refresh complete: {updated}/{} segments updated", segments.len()),
        Err(e) => {
            error!("✗ refresh failed: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}
