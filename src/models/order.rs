// src/models/order.rs

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pendiente,
    Creado,
    Finalizado,
}

// Cabeçalho do pedido com os nomes de trabalhador e ruta
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct OrderSummary {
    pub id: i32,
    #[serde(rename = "idTs")]
    pub user_id: Option<i32>,
    #[serde(rename = "idRuta")]
    pub route_id: Option<i32>,
    #[serde(rename = "fechaEntrega")]
    pub delivery_date: NaiveDate,
    #[serde(rename = "estado")]
    pub status: OrderStatus,
    #[serde(rename = "devoluciones")]
    pub returns: i32,
    #[serde(rename = "horaLlegada")]
    pub arrival_time: Option<String>,
    #[serde(rename = "cobranzaGenerada")]
    pub collection_generated: bool,
    #[serde(rename = "urlCobranza")]
    pub collection_url: Option<String>,
    pub username: Option<String>,
    #[serde(rename = "nombreRuta")]
    pub route_name: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

// Linha pedido x comunidade, com os dados da comunidade
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct OrderLine {
    #[serde(rename = "idPedido")]
    pub order_id: i32,
    #[serde(rename = "idComunidad")]
    pub community_id: i32,
    #[serde(rename = "despensasCosto")]
    pub full_cost: i32,
    #[serde(rename = "despensasMedioCosto")]
    pub half_cost: i32,
    #[serde(rename = "despensasSinCosto")]
    pub no_cost: i32,
    #[serde(rename = "despensasApadrinadas")]
    pub sponsored: i32,
    pub comite: i32,
    #[serde(rename = "arpilladas")]
    pub arpillas: bool,
    #[serde(rename = "observaciones")]
    pub notes: String,
    #[serde(rename = "nombreComunidad")]
    pub community_name: String,
    #[serde(rename = "jefa")]
    pub leader_name: Option<String>,
    #[serde(rename = "contacto")]
    pub contact: Option<String>,
    #[serde(rename = "costoPaquete")]
    #[schema(value_type = f64)]
    pub package_cost: Decimal,
    #[serde(rename = "municipio")]
    pub municipality_name: Option<String>,
}

impl OrderLine {
    pub fn packages(&self) -> i64 {
        i64::from(self.full_cost) + i64::from(self.half_cost) + i64::from(self.no_cost) + i64::from(self.sponsored)
    }

    // Só cuota completa e meia cuota geram receita
    pub fn amount(&self) -> Decimal {
        let full = self.package_cost * Decimal::from(self.full_cost);
        let half = self.package_cost / Decimal::TWO * Decimal::from(self.half_cost);
        full + half
    }
}

/// Total a recuperar do pedido, arredondado a centavos.
pub fn order_total(lines: &[OrderLine]) -> Decimal {
    lines
        .iter()
        .map(OrderLine::amount)
        .sum::<Decimal>()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: OrderSummary,
    #[serde(rename = "comunidades")]
    pub lines: Vec<OrderLine>,
    #[schema(value_type = f64)]
    pub total: Decimal,
}

impl OrderDetail {
    pub fn new(order: OrderSummary, lines: Vec<OrderLine>) -> Self {
        let total = order_total(&lines);
        Self { order, lines, total }
    }
}

// --- Payloads ---

fn validate_not_negative(val: i32) -> Result<(), ValidationError> {
    if val < 0 {
        let mut err = ValidationError::new("range");
        err.message = Some("Las cantidades no pueden ser negativas.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineInput {
    pub id_comunidad: i32,
    #[serde(default)]
    #[validate(custom(function = "validate_not_negative"))]
    pub despensas_costo: i32,
    #[serde(default)]
    #[validate(custom(function = "validate_not_negative"))]
    pub despensas_medio_costo: i32,
    #[serde(default)]
    #[validate(custom(function = "validate_not_negative"))]
    pub despensas_sin_costo: i32,
    #[serde(default)]
    #[validate(custom(function = "validate_not_negative"))]
    pub despensas_apadrinadas: i32,
    #[serde(default)]
    #[validate(custom(function = "validate_not_negative"))]
    pub comite: i32,
    #[serde(default)]
    pub arpilladas: bool,
    #[serde(default)]
    pub observaciones: String,
}

fn validate_unique_communities(lines: &[OrderLineInput]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    if lines.iter().all(|line| seen.insert(line.id_comunidad)) {
        Ok(())
    } else {
        let mut err = ValidationError::new("duplicate");
        err.message = Some("Una comunidad no puede repetirse en el mismo pedido.".into());
        Err(err)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderPayload {
    pub id_ts: Option<i32>,
    #[validate(required(message = "La ruta es obligatoria."))]
    pub id_ruta: Option<i32>,
    #[validate(required(message = "La fecha de entrega es obligatoria."))]
    pub fecha_entrega: Option<NaiveDate>,
    #[validate(
        length(min = 1, message = "El pedido debe incluir al menos una comunidad."),
        custom(function = "validate_unique_communities"),
        nested
    )]
    #[serde(default)]
    pub comunidades: Vec<OrderLineInput>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderPayload {
    pub fecha_entrega: Option<NaiveDate>,
    #[validate(range(min = 0, message = "Las devoluciones no pueden ser negativas."))]
    pub devoluciones: Option<i32>,
    pub hora_llegada: Option<String>,
    pub estado: Option<OrderStatus>,
    #[validate(custom(function = "validate_unique_communities"), nested)]
    pub pedido_comunidad: Option<Vec<OrderLineInput>>,
}

// Cabeçalho normalizado para INSERT
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: i32,
    pub route_id: i32,
    pub delivery_date: NaiveDate,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    /// Usernames separados por vírgula
    pub trabajadores: Option<String>,
    /// Nomes de ruta separados por vírgula
    pub rutas: Option<String>,
    pub estatus: Option<String>,
    pub fecha_inicio: Option<NaiveDate>,
    pub fecha_fin: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportOrdersPayload {
    #[serde(default)]
    pub usuarios: Vec<String>,
    #[serde(default)]
    pub rutas: Vec<String>,
    #[serde(default)]
    pub estatus_pedido: Vec<OrderStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

// Filtro comum à listagem paginada e à exportação
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub usernames: Option<Vec<String>>,
    pub route_names: Option<Vec<String>>,
    pub statuses: Option<Vec<OrderStatus>>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderPage {
    pub pedidos: Vec<OrderSummary>,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn line(full: i32, half: i32, no_cost: i32, sponsored: i32, cost: Decimal) -> OrderLine {
        OrderLine {
            order_id: 1,
            community_id: 1,
            full_cost: full,
            half_cost: half,
            no_cost,
            sponsored,
            comite: 0,
            arpillas: false,
            notes: String::new(),
            community_name: "Comunidad".into(),
            leader_name: None,
            contact: None,
            package_cost: cost,
            municipality_name: None,
        }
    }

    #[test]
    fn total_counts_full_and_half_cost_only() {
        let lines = vec![
            line(10, 4, 3, 2, Decimal::new(170, 0)),
            line(1, 1, 0, 0, Decimal::new(12550, 2)),
        ];

        // 10*170 + 4*85 + 125.50 + 62.75
        assert_eq!(order_total(&lines), Decimal::new(222825, 2));
        assert_eq!(lines[0].packages(), 19);
    }

    #[test]
    fn total_rounds_half_cents_away_from_zero() {
        // 100.01 / 2 = 50.005
        let lines = vec![line(0, 1, 0, 0, Decimal::new(10001, 2))];
        assert_eq!(order_total(&lines), Decimal::new(5001, 2));
    }

    #[test]
    fn create_payload_rejects_repeated_communities() {
        let payload: CreateOrderPayload = serde_json::from_value(json!({
            "idRuta": 1,
            "fechaEntrega": "2025-03-01",
            "comunidades": [
                { "idComunidad": 4, "despensasCosto": 2 },
                { "idComunidad": 4, "despensasCosto": 1 }
            ]
        }))
        .unwrap();

        assert!(payload.validate().is_err());
    }

    #[test]
    fn create_payload_rejects_negative_counts() {
        let payload: CreateOrderPayload = serde_json::from_value(json!({
            "idRuta": 1,
            "fechaEntrega": "2025-03-01",
            "comunidades": [{ "idComunidad": 4, "despensasSinCosto": -1 }]
        }))
        .unwrap();

        assert!(payload.validate().is_err());
    }

    #[test]
    fn update_payload_checks_replacement_lines() {
        let repeated: UpdateOrderPayload = serde_json::from_value(json!({
            "pedidoComunidad": [{ "idComunidad": 2 }, { "idComunidad": 2 }]
        }))
        .unwrap();
        assert!(repeated.validate().is_err());

        let negative: UpdateOrderPayload = serde_json::from_value(json!({
            "pedidoComunidad": [{ "idComunidad": 2, "comite": -3 }]
        }))
        .unwrap();
        assert!(negative.validate().is_err());

        let fine: UpdateOrderPayload = serde_json::from_value(json!({
            "pedidoComunidad": [{ "idComunidad": 2, "comite": 1 }, { "idComunidad": 3 }]
        }))
        .unwrap();
        assert!(fine.validate().is_ok());
    }

    #[test]
    fn line_counts_default_to_zero() {
        let payload: CreateOrderPayload = serde_json::from_value(json!({
            "idRuta": 1,
            "fechaEntrega": "2025-03-01",
            "comunidades": [{ "idComunidad": 4 }]
        }))
        .unwrap();

        assert!(payload.validate().is_ok());
        let first = &payload.comunidades[0];
        assert_eq!(first.despensas_costo + first.despensas_apadrinadas, 0);
        assert_eq!(first.observaciones, "");
    }

    #[test]
    fn status_uses_lowercase_spanish_names() {
        assert_eq!(serde_json::to_value(OrderStatus::Pendiente).unwrap(), "pendiente");
        let parsed: OrderStatus = serde_json::from_value(json!("finalizado")).unwrap();
        assert_eq!(parsed, OrderStatus::Finalizado);
    }
}
