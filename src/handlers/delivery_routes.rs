// src/handlers/delivery_routes.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
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
        i18n::Locale,
        rbac::{Leadership, RequireRole},
    },
    models::delivery_route::{DeliveryRoute, RoutePayload},
};

// POST /rutas
#[utoipa::path(
    post,
    path = "/rutas",
    tag = "Rutas",
    request_body = RoutePayload,
    responses(
        (status = 201, description = "Ruta criada", body = DeliveryRoute),
        (status = 400, description = "Nome ausente")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_route(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<Leadership>,
    Json(payload): Json<RoutePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let route = app_state
        .catalog_service
        .create_route(payload.nombre)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::created(route))
}

// GET /rutas
#[utoipa::path(
    get,
    path = "/rutas",
    tag = "Rutas",
    responses((status = 200, description = "Rutas ordenadas por nome", body = Vec<DeliveryRoute>)),
    security(("api_jwt" = []))
)]
pub async fn list_routes(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let routes = app_state
        .catalog_service
        .list_routes()
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(routes))
}

// GET /rutas/{id}
#[utoipa::path(
    get,
    path = "/rutas/{id}",
    tag = "Rutas",
    params(("id" = i32, Path, description = "ID da ruta")),
    responses(
        (status = 200, description = "Ruta", body = DeliveryRoute),
        (status = 400, description = "ID inválido"),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_route(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    let route = app_state
        .catalog_service
        .get_route(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(route))
}

// PATCH /rutas/{id}
#[utoipa::path(
    patch,
    path = "/rutas/{id}",
    tag = "Rutas",
    params(("id" = i32, Path, description = "ID da ruta")),
    request_body = RoutePayload,
    responses(
        (status = 200, description = "Ruta atualizada", body = DeliveryRoute),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_route(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<Leadership>,
    Path(id): Path<String>,
    Json(payload): Json<RoutePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let route = app_state
        .catalog_service
        .update_route(id, payload.nombre)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(route))
}

// DELETE /rutas/{id}
#[utoipa::path(
    delete,
    path = "/rutas/{id}",
    tag = "Rutas",
    params(("id" = i32, Path, description = "ID da ruta")),
    responses(
        (status = 204, description = "Ruta excluída"),
        (status = 404, description = "Não encontrada"),
        (status = 409, description = "Ainda usada por comunidades ou pedidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_route(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<Leadership>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    app_state
        .catalog_service
        .delete_route(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(StatusCode::NO_CONTENT)
}
