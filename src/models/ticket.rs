// src/models/ticket.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "ticket_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Abierto,
    EnProceso,
    Cerrado,
    Cancelado,
}

impl TicketStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TicketStatus::Abierto => "Abierto",
            TicketStatus::EnProceso => "En proceso",
            TicketStatus::Cerrado => "Cerrado",
            TicketStatus::Cancelado => "Cancelado",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "ticket_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TicketPriority {
    Baja,
    Media,
    Alta,
}

// Ticket com os dados do solicitante
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Ticket {
    pub id: i32,
    #[serde(rename = "idUsuario")]
    pub user_id: i32,
    #[serde(rename = "estatus")]
    pub status: TicketStatus,
    #[serde(rename = "prioridad")]
    pub priority: TicketPriority,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "comentarios")]
    pub comments: Option<String>,
    pub username: String,
    pub email: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketPayload {
    #[validate(
        required(message = "La descripción es obligatoria."),
        length(min = 1, max = 5000, message = "La descripción es obligatoria.")
    )]
    pub descripcion: Option<String>,
    pub prioridad: Option<TicketPriority>,
    /// Só a Dirección pode abrir tickets em nome de outro usuário
    pub id_usuario: Option<i32>,
}

// Status e prioridade chegam como texto para devolver 400 com mensagem própria
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateTicketPayload {
    pub estatus: Option<String>,
    pub prioridad: Option<String>,
    pub comentarios: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct TicketChanges {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub comments: Option<String>,
}

impl UpdateTicketPayload {
    pub fn parse(self) -> Result<TicketChanges, String> {
        let status = self
            .estatus
            .map(|raw| {
                serde_json::from_value::<TicketStatus>(serde_json::Value::String(raw.clone()))
                    .map_err(|_| format!("Estatus inválido: '{}'. Valores permitidos: abierto, en_proceso, cerrado, cancelado.", raw))
            })
            .transpose()?;

        let priority = self
            .prioridad
            .map(|raw| {
                serde_json::from_value::<TicketPriority>(serde_json::Value::String(raw.clone()))
                    .map_err(|_| format!("Prioridad inválida: '{}'. Valores permitidos: baja, media, alta.", raw))
            })
            .transpose()?;

        if status.is_none() && priority.is_none() && self.comentarios.is_none() {
            return Err("No se enviaron campos para actualizar.".to_string());
        }

        Ok(TicketChanges { status, priority, comments: self.comentarios })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_changes() {
        let payload = UpdateTicketPayload {
            estatus: Some("en_proceso".into()),
            prioridad: Some("alta".into()),
            comentarios: None,
        };

        let changes = payload.parse().unwrap();
        assert_eq!(changes.status, Some(TicketStatus::EnProceso));
        assert_eq!(changes.priority, Some(TicketPriority::Alta));
    }

    #[test]
    fn rejects_unknown_status_and_priority() {
        let bad_status = UpdateTicketPayload { estatus: Some("resuelto".into()), ..Default::default() };
        let bad_priority = UpdateTicketPayload { prioridad: Some("urgente".into()), ..Default::default() };

        assert!(bad_status.parse().unwrap_err().contains("resuelto"));
        assert!(bad_priority.parse().unwrap_err().contains("urgente"));
    }

    #[test]
    fn rejects_empty_update() {
        assert!(UpdateTicketPayload::default().parse().is_err());
    }
}
