// src/handlers/municipalities.rs

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
        i18n::Locale,
        rbac::{Leadership, RequireRole},
    },
    models::municipality::{Municipality, MunicipalityPayload},
};

#[utoipa::path(
    get,
    path = "/municipios",
    tag = "Municipios",
    responses((status = 200, description = "Municipios por nome", body = Vec<Municipality>)),
    security(("api_jwt" = []))
)]
pub async fn list_municipalities(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let municipalities = app_state
        .catalog_service
        .list_municipalities()
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(municipalities))
}

#[utoipa::path(
    get,
    path = "/municipios/{id}",
    tag = "Municipios",
    params(("id" = i32, Path, description = "ID do municipio")),
    responses(
        (status = 200, description = "Municipio", body = Municipality),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_municipality(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    let municipality = app_state
        .catalog_service
        .get_municipality(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(municipality))
}

#[utoipa::path(
    post,
    path = "/municipios",
    tag = "Municipios",
    request_body = MunicipalityPayload,
    responses(
        (status = 201, description = "Municipio criado", body = Municipality),
        (status = 422, description = "Nome duplicado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_municipality(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<Leadership>,
    Json(payload): Json<MunicipalityPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let municipality = app_state
        .catalog_service
        .create_municipality(payload.nombre)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::created(municipality))
}
