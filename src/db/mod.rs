//! Spatial store: the Postgres-backed repository layer. Business logic
//! never issues raw queries directly — it calls through the narrow
//! `SpatialStore` trait so the scoring/aggregation code can be exercised
//! against a fake in unit tests without a live database.

mod duplicates;
mod grid;
mod listings;
mod regions;
mod transactions;
mod valuations;

pub use duplicates::*;
pub use grid::*;
pub use listings::*;
pub use regions::*;
pub use transactions::*;
pub use valuations::*;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::error::CoreResult;

#[derive(Clone)]
pub struct PgSpatialStore {
    pub pool: PgPool,
}

impl PgSpatialStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> CoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(PgSpatialStore { pool })
    }
}
