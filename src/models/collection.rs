// src/models/collection.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

// Cobranza com dados do pedido para listagens
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Collection {
    pub id: i32,
    #[serde(rename = "idPedido")]
    pub order_id: i32,
    #[serde(rename = "nombreArchivo")]
    pub file_name: String,
    #[serde(rename = "urlArchivo")]
    pub file_url: String,
    #[serde(rename = "arpillasCantidad")]
    pub arpillas_quantity: i32,
    #[serde(rename = "arpillasImporte")]
    #[schema(value_type = f64)]
    pub arpillas_amount: Decimal,
    #[serde(rename = "excedentes")]
    pub surplus_quantity: i32,
    #[serde(rename = "excedentesImporte")]
    #[schema(value_type = f64)]
    pub surplus_amount: Decimal,
    #[serde(rename = "totalRecuperado")]
    #[schema(value_type = f64)]
    pub total_recovered: Decimal,
    #[serde(rename = "generadoPor")]
    pub generated_by: Option<i32>,
    #[serde(rename = "fechaGeneracion")]
    pub generated_at: DateTime<Utc>,
    #[serde(rename = "fechaEntrega")]
    pub delivery_date: Option<NaiveDate>,
    #[serde(rename = "nombreRuta")]
    pub route_name: Option<String>,
    pub username: Option<String>,
}

fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.message = Some("El importe no puede ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

// Extras informados no momento de gerar o recibo
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCollectionPayload {
    #[serde(default)]
    #[validate(range(min = 0, message = "La cantidad de arpillas no puede ser negativa."))]
    pub arpillas_cantidad: i32,
    #[serde(default)]
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = f64)]
    pub arpillas_importe: Decimal,
    #[serde(default)]
    #[validate(range(min = 0, message = "Los excedentes no pueden ser negativos."))]
    pub excedentes: i32,
    #[serde(default)]
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = f64)]
    pub excedentes_importe: Decimal,
}

// Registro a ser inserido depois do upload
#[derive(Debug, Clone)]
pub struct NewCollection {
    pub order_id: i32,
    pub file_name: String,
    pub file_url: String,
    pub arpillas_quantity: i32,
    pub arpillas_amount: Decimal,
    pub surplus_quantity: i32,
    pub surplus_amount: Decimal,
    pub total_recovered: Decimal,
    pub generated_by: i32,
}
