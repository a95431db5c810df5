// src/handlers/communities.rs

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
        extract::{Json, Query},
        response::ApiResponse,
    },
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{Leadership, RequireRole},
    },
    models::community::{
        Community, CommunityListQuery, CommunityPage, CommunitySearchQuery, CreateCommunityPayload,
        UpdateCommunityPayload,
    },
};

#[utoipa::path(
    post,
    path = "/comunidades",
    tag = "Comunidades",
    request_body = CreateCommunityPayload,
    responses(
        (status = 201, description = "Comunidade criada", body = Community),
        (status = 400, description = "Campos obrigatórios ausentes"),
        (status = 404, description = "Ruta ou municipio inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_community(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<Leadership>,
    Json(payload): Json<CreateCommunityPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let community = app_state
        .catalog_service
        .create_community(payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::created(community))
}

// GET /comunidades?page&limit
#[utoipa::path(
    get,
    path = "/comunidades",
    tag = "Comunidades",
    params(CommunityListQuery),
    responses((status = 200, description = "Comunidades com nomes de ruta e municipio", body = Vec<Community>)),
    security(("api_jwt" = []))
)]
pub async fn list_communities(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<CommunityListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let communities = app_state
        .catalog_service
        .list_communities(&query)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(communities))
}

#[utoipa::path(
    get,
    path = "/comunidades/paginado",
    tag = "Comunidades",
    params(CommunitySearchQuery),
    responses((status = 200, description = "Página de comunidades", body = CommunityPage)),
    security(("api_jwt" = []))
)]
pub async fn search_communities(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<CommunitySearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = app_state
        .catalog_service
        .search_communities(&query)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(page))
}

#[utoipa::path(
    get,
    path = "/comunidades/ruta/{id}",
    tag = "Comunidades",
    params(("id" = i32, Path, description = "ID da ruta")),
    responses((status = 200, description = "Comunidades da ruta", body = Vec<Community>)),
    security(("api_jwt" = []))
)]
pub async fn communities_by_route(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    let communities = app_state
        .catalog_service
        .communities_by_route(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(communities))
}

// GET /comunidades/ciudad/{municipio}: ID numérico ou nome
#[utoipa::path(
    get,
    path = "/comunidades/ciudad/{municipio}",
    tag = "Comunidades",
    params(("municipio" = String, Path, description = "ID ou nome do municipio")),
    responses((status = 200, description = "Comunidades do municipio", body = Vec<Community>)),
    security(("api_jwt" = []))
)]
pub async fn communities_by_municipality(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(municipio): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let communities = app_state
        .catalog_service
        .communities_by_municipality(&municipio)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(communities))
}

#[utoipa::path(
    get,
    path = "/comunidades/{id}",
    tag = "Comunidades",
    params(("id" = i32, Path, description = "ID da comunidade")),
    responses(
        (status = 200, description = "Comunidade", body = Community),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_community(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    let community = app_state
        .catalog_service
        .get_community(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(community))
}

#[utoipa::path(
    patch,
    path = "/comunidades/{id}",
    tag = "Comunidades",
    params(("id" = i32, Path, description = "ID da comunidade")),
    request_body = UpdateCommunityPayload,
    responses(
        (status = 200, description = "Comunidade atualizada", body = Community),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_community(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<Leadership>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateCommunityPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let community = app_state
        .catalog_service
        .update_community(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(community))
}

#[utoipa::path(
    delete,
    path = "/comunidades/{id}",
    tag = "Comunidades",
    params(("id" = i32, Path, description = "ID da comunidade")),
    responses(
        (status = 204, description = "Comunidade excluída"),
        (status = 409, description = "Usada por pedidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_community(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<Leadership>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    app_state
        .catalog_service
        .delete_community(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(StatusCode::NO_CONTENT)
}
