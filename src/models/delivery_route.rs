// src/models/delivery_route.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DeliveryRoute {
    pub id: i32,
    #[serde(rename = "nombre")]
    #[schema(example = "Ruta Norte")]
    pub name: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RoutePayload {
    #[validate(
        required(message = "El nombre de la ruta es obligatorio."),
        length(min = 1, max = 150, message = "El nombre de la ruta es obligatorio.")
    )]
    pub nombre: Option<String>,
}
