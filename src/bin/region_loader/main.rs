//! Bulk loader for region polygons: reads a directory of single-feature
//! GeoJSON files and upserts each into the `regions` table, in the
//! teacher's fetch/parse/write split — here collapsed into one pass since
//! there is no remote fetch step, only local file parsing and a write.

use anyhow::{Context, Result};
use moscow_valuation::config::Settings;
use moscow_valuation::db::PgSpatialStore;
use moscow_valuation::geo_utils;
use moscow_valuation::segment::polygon_from_geojson;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct RegionProperties {
    #[serde(default)]
    id: Option<Uuid>,
    name: String,
    level: i32,
    #[serde(default)]
    parent_id: Option<Uuid>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_target(false).with_level(true).init();

    info!("Starting region loader");

    let settings = Settings::from_env()?;
    let store = PgSpatialStore::connect(&settings.database_url, settings.db_max_connections).await?;
    info!("Database connected");

    let dir = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "./regions".to_string());
    let dir = PathBuf::from(dir);

    info!("Step 1/2: scanning {:?} for region features...", dir);
    let files = list_geojson_files(&dir)?;
    info!("✓ found {} region files", files.len());

    info!("Step 2/2: parsing and upserting regions...");
    let mut loaded = 0;
    for path in files {
        match load_region_file(&path, &store).await {
            Ok(name) => {
                info!("✓ {}: {}", path.display(), name);
                loaded += 1;
            }
            Err(e) => error!("✗ {}: {}", path.display(), e),
        }
    }
    info!("Region loading complete: {loaded} loaded");

    Ok(())
}

fn list_geojson_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("reading {:?}", dir))? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("geojson") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

async fn load_region_file(path: &Path, store: &PgSpatialStore) -> Result<String> {
    let text = std::fs::read_to_string(path)?;
    let parsed: geojson::GeoJson = text.parse()?;

    let feature = match parsed {
        geojson::GeoJson::Feature(f) => f,
        other => anyhow::bail!("expected a single Feature, got {:?}", geojson_kind(&other)),
    };

    let geometry = feature
        .geometry
        .ok_or_else(|| anyhow::anyhow!("feature has no geometry"))?;
    let geometry_text = serde_json::to_string(&geometry)?;
    let polygon = polygon_from_geojson(&geometry_text).map_err(|e| anyhow::anyhow!(e))?;

    let props: RegionProperties = feature
        .properties
        .clone()
        .map(serde_json::Value::Object)
        .map(serde_json::from_value)
        .transpose()?
        .ok_or_else(|| anyhow::anyhow!("feature has no properties"))?;

    let id = props.id.unwrap_or_else(Uuid::new_v4);
    let (centroid_lat, centroid_lon) = geo_utils::centroid(&polygon);

    if props.level < 0 {
        warn!("{}: negative level {}, loading anyway", path.display(), props.level);
    }

    store
        .upsert_region(id, &props.name, props.level, props.parent_id, &geometry_text, centroid_lat, centroid_lon)
        .await?;

    Ok(props.name)
}

fn geojson_kind(g: &geojson::GeoJson) -> &'static str {
    match g {
        geojson::GeoJson::Geometry(_) => "Geometry",
        geojson::GeoJson::Feature(_) => "Feature",
        geojson::GeoJson::FeatureCollection(_) => "FeatureCollection",
    }
}
