use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// An office location with its geofence circle.
///
/// Read-only snapshot during a clock operation; coordinates are WGS-84
/// decimal degrees, radius is meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "name": "Head Office",
        "address": "Jl. Jend. Sudirman No. 1, Jakarta",
        "latitude": -6.2087634,
        "longitude": 106.8455990,
        "radius": 100.0,
        "is_active": true
    })
)]
pub struct Location {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Head Office")]
    pub name: String,

    #[schema(example = "Jl. Jend. Sudirman No. 1, Jakarta")]
    pub address: String,

    /// Latitude in [-90, 90]
    #[schema(example = -6.2087634)]
    pub latitude: f64,

    /// Longitude in [-180, 180]
    #[schema(example = 106.8455990)]
    pub longitude: f64,

    /// Valid attendance radius in meters, always > 0
    #[schema(example = 100.0)]
    pub radius: f64,

    #[schema(example = true)]
    pub is_active: bool,
}
