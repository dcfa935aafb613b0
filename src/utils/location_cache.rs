use anyhow::Result;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::Arc;
use std::time::Duration;

use crate::model::location::Location;

const ACTIVE_KEY: &str = "active";

/// Snapshot of the active locations, shared by every clock operation.
/// TTL-bounded so admin edits show up within a minute even if a mutation
/// path forgets to invalidate.
static LOCATION_CACHE: Lazy<Cache<&'static str, Arc<Vec<Location>>>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(1)
        .time_to_live(Duration::from_secs(60))
        .build()
});

/// The active-location snapshot, from cache or the database.
/// Ordered by id so nearest-location tie-breaks stay deterministic.
pub async fn active_locations(pool: &MySqlPool) -> Result<Arc<Vec<Location>>> {
    if let Some(snapshot) = LOCATION_CACHE.get(ACTIVE_KEY).await {
        return Ok(snapshot);
    }

    let locations = sqlx::query_as::<_, Location>(
        r#"
        SELECT id, name, address, latitude, longitude, radius, is_active
        FROM locations
        WHERE is_active = TRUE
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    let snapshot = Arc::new(locations);
    LOCATION_CACHE.insert(ACTIVE_KEY, snapshot.clone()).await;
    Ok(snapshot)
}

/// Drop the snapshot after any location mutation.
pub async fn invalidate() {
    LOCATION_CACHE.invalidate(ACTIVE_KEY).await;
}

/// Pre-load the snapshot at startup.
pub async fn warmup_location_cache(pool: &MySqlPool) -> Result<()> {
    let snapshot = active_locations(pool).await?;
    tracing::info!(
        count = snapshot.len(),
        "Location cache warmup complete"
    );
    Ok(())
}
