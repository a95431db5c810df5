// src/models/municipality.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Municipality {
    pub id: i32,
    #[serde(rename = "nombre")]
    #[schema(example = "Tepatitlán")]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct MunicipalityPayload {
    #[validate(
        required(message = "El nombre del municipio es obligatorio."),
        length(min = 1, max = 150, message = "El nombre del municipio es obligatorio.")
    )]
    pub nombre: Option<String>,
}
