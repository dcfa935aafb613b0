use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Position {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Software Engineer")]
    pub name: String,

    #[schema(example = "Builds and maintains internal systems", nullable = true)]
    pub description: Option<String>,

    #[schema(example = 1250.0, nullable = true)]
    pub salary: Option<f64>,

    #[schema(example = true)]
    pub is_active: bool,
}
