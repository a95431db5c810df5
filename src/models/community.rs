// src/models/community.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

// Cuota padrão por despensa quando a comunidade não define outra
pub const DEFAULT_PACKAGE_COST: Decimal = Decimal::from_parts(17000, 0, 0, false, 2);

// Comunidade já com os nomes de ruta e municipio (JOIN)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Community {
    pub id: i32,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "jefa")]
    pub leader_name: Option<String>,
    #[serde(rename = "contacto")]
    pub contact: Option<String>,
    #[serde(rename = "direccion")]
    pub address: Option<String>,
    #[serde(rename = "costoPaquete")]
    #[schema(value_type = f64, example = 170.0)]
    pub package_cost: Decimal,
    #[serde(rename = "notas")]
    pub notes: Option<String>,
    #[serde(rename = "idRuta")]
    pub route_id: i32,
    #[serde(rename = "idMunicipio")]
    pub municipality_id: i32,
    #[serde(rename = "nombreRuta")]
    pub route_name: Option<String>,
    #[serde(rename = "nombreMunicipio")]
    pub municipality_name: Option<String>,
}

fn validate_cost(cost: &Decimal) -> Result<(), ValidationError> {
    if cost.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.message = Some("El costo del paquete no puede ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommunityPayload {
    #[validate(
        required(message = "El nombre es obligatorio."),
        length(min = 1, max = 150, message = "El nombre es obligatorio.")
    )]
    pub nombre: Option<String>,
    #[validate(required(message = "La ruta es obligatoria."))]
    pub id_ruta: Option<i32>,
    #[validate(required(message = "El municipio es obligatorio."))]
    pub id_municipio: Option<i32>,
    pub jefa: Option<String>,
    pub contacto: Option<String>,
    pub direccion: Option<String>,
    #[validate(custom(function = "validate_cost"))]
    #[schema(value_type = Option<f64>)]
    pub costo_paquete: Option<Decimal>,
    pub notas: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommunityPayload {
    #[validate(length(min = 1, max = 150, message = "El nombre no puede estar vacío."))]
    pub nombre: Option<String>,
    pub id_ruta: Option<i32>,
    pub id_municipio: Option<i32>,
    pub jefa: Option<String>,
    pub contacto: Option<String>,
    pub direccion: Option<String>,
    #[validate(custom(function = "validate_cost"))]
    #[schema(value_type = Option<f64>)]
    pub costo_paquete: Option<Decimal>,
    pub notas: Option<String>,
}

// Dados normalizados para INSERT/UPDATE
#[derive(Debug, Clone)]
pub struct CommunityInput {
    pub name: String,
    pub leader_name: Option<String>,
    pub contact: Option<String>,
    pub address: Option<String>,
    pub package_cost: Decimal,
    pub notes: Option<String>,
    pub route_id: i32,
    pub municipality_id: i32,
}

impl CommunityInput {
    // Campos ausentes no PATCH mantêm o valor atual
    pub fn merged(current: &Community, patch: UpdateCommunityPayload) -> Self {
        Self {
            name: patch.nombre.unwrap_or_else(|| current.name.clone()),
            leader_name: patch.jefa.or_else(|| current.leader_name.clone()),
            contact: patch.contacto.or_else(|| current.contact.clone()),
            address: patch.direccion.or_else(|| current.address.clone()),
            package_cost: patch.costo_paquete.unwrap_or(current.package_cost),
            notes: patch.notas.or_else(|| current.notes.clone()),
            route_id: patch.id_ruta.unwrap_or(current.route_id),
            municipality_id: patch.id_municipio.unwrap_or(current.municipality_id),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct CommunityListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct CommunitySearchQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommunityPage {
    pub comunidades: Vec<Community>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec170() -> Decimal {
        Decimal::new(17000, 2)
    }

    fn sample() -> Community {
        Community {
            id: 5,
            name: "San José".into(),
            leader_name: Some("María".into()),
            contact: None,
            address: None,
            package_cost: dec170(),
            notes: None,
            route_id: 1,
            municipality_id: 2,
            route_name: Some("Ruta Norte".into()),
            municipality_name: Some("Arandas".into()),
        }
    }

    #[test]
    fn default_cost_is_170() {
        assert_eq!(DEFAULT_PACKAGE_COST, dec170());
    }

    #[test]
    fn merge_keeps_untouched_fields() {
        let patch = UpdateCommunityPayload {
            contacto: Some("3312345678".into()),
            id_ruta: Some(9),
            ..Default::default()
        };

        let merged = CommunityInput::merged(&sample(), patch);

        assert_eq!(merged.name, "San José");
        assert_eq!(merged.leader_name.as_deref(), Some("María"));
        assert_eq!(merged.contact.as_deref(), Some("3312345678"));
        assert_eq!(merged.route_id, 9);
        assert_eq!(merged.municipality_id, 2);
    }

    #[test]
    fn create_payload_requires_route_and_municipality() {
        let payload: CreateCommunityPayload =
            serde_json::from_value(serde_json::json!({ "nombre": "La Loma" })).unwrap();

        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("id_ruta"));
        assert!(fields.contains_key("id_municipio"));
    }

    #[test]
    fn negative_cost_is_rejected() {
        let payload: CreateCommunityPayload = serde_json::from_value(serde_json::json!({
            "nombre": "La Loma", "idRuta": 1, "idMunicipio": 1, "costoPaquete": -1.0
        }))
        .unwrap();

        assert!(payload.validate().is_err());
    }
}
