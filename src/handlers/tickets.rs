// src/handlers/tickets.rs

use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    common::{
        db_utils::parse_id,
        error::{ApiError, AppError},
        extract::Json,
        response::ApiResponse,
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{Admin, RequireRole},
    },
    models::ticket::{CreateTicketPayload, Ticket, UpdateTicketPayload},
};

#[utoipa::path(
    post,
    path = "/tickets",
    tag = "Tickets",
    request_body = CreateTicketPayload,
    responses(
        (status = 201, description = "Ticket aberto", body = Ticket),
        (status = 400, description = "Descrição ausente")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_ticket(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    Json(payload): Json<CreateTicketPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let ticket = app_state
        .ticket_service
        .create(&caller, payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::created(ticket))
}

// Dirección vê todos; os demais, só os próprios
#[utoipa::path(
    get,
    path = "/tickets",
    tag = "Tickets",
    responses((status = 200, description = "Tickets, mais recentes primeiro", body = Vec<Ticket>)),
    security(("api_jwt" = []))
)]
pub async fn list_tickets(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let tickets = app_state
        .ticket_service
        .list(&caller)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(tickets))
}

#[utoipa::path(
    get,
    path = "/tickets/{id}",
    tag = "Tickets",
    params(("id" = i32, Path, description = "ID do ticket")),
    responses(
        (status = 200, description = "Ticket", body = Ticket),
        (status = 403, description = "Nem dono nem Dirección"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_ticket(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    let ticket = app_state
        .ticket_service
        .get(&caller, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(ticket))
}

#[utoipa::path(
    patch,
    path = "/tickets/{id}",
    tag = "Tickets",
    params(("id" = i32, Path, description = "ID do ticket")),
    request_body = UpdateTicketPayload,
    responses(
        (status = 200, description = "Ticket atualizado", body = Ticket),
        (status = 400, description = "Estatus ou prioridade inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_ticket(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<Admin>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateTicketPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    let ticket = app_state
        .ticket_service
        .update(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(ticket))
}
