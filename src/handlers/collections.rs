// src/handlers/collections.rs

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
};
use serde::Serialize;
use utoipa::ToSchema;
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
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{Finance, RequireRole},
    },
    models::collection::{Collection, GenerateCollectionPayload},
};

#[derive(Debug, Serialize, ToSchema)]
pub struct GeneratedCollectionResponse {
    pub cobranza: Collection,
    pub url: String,
}

// POST /cobranzas/generar/{idPedido}
#[utoipa::path(
    post,
    path = "/cobranzas/generar/{idPedido}",
    tag = "Cobranzas",
    params(("idPedido" = i32, Path, description = "ID do pedido")),
    request_body = GenerateCollectionPayload,
    responses(
        (status = 201, description = "Recibo gerado e publicado", body = GeneratedCollectionResponse),
        (status = 404, description = "Pedido inexistente"),
        (status = 409, description = "Cobranza já gerada"),
        (status = 502, description = "Falha ao publicar o PDF")
    ),
    security(("api_jwt" = []))
)]
pub async fn generate_collection(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    _guard: RequireRole<Finance>,
    Path(order_id): Path<String>,
    Json(payload): Json<GenerateCollectionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let order_id = parse_id(&order_id).map_err(|e| e.to_api_error(&locale))?;
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let generated = app_state
        .collection_service
        .generate(order_id, &caller, payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(ApiResponse::created(GeneratedCollectionResponse {
        cobranza: generated.collection,
        url: generated.url,
    }))
}

// GET /cobranzas/preview/{idPedido}: PDF inline, nada é gravado
#[utoipa::path(
    get,
    path = "/cobranzas/preview/{idPedido}",
    tag = "Cobranzas",
    params(
        ("idPedido" = i32, Path, description = "ID do pedido"),
        ("arpillasCantidad" = Option<i32>, Query, description = "Arpillas"),
        ("arpillasImporte" = Option<f64>, Query, description = "Importe das arpillas"),
        ("excedentes" = Option<i32>, Query, description = "Excedentes"),
        ("excedentesImporte" = Option<f64>, Query, description = "Importe dos excedentes")
    ),
    responses(
        (status = 200, description = "PDF do recibo", body = Vec<u8>, content_type = "application/pdf"),
        (status = 404, description = "Pedido inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn preview_collection(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<Finance>,
    Path(order_id): Path<String>,
    Query(extras): Query<GenerateCollectionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let order_id = parse_id(&order_id).map_err(|e| e.to_api_error(&locale))?;
    extras
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let pdf = app_state
        .collection_service
        .preview(order_id, extras)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"preview_pedido_{}.pdf\"", order_id),
            ),
        ],
        pdf,
    ))
}

#[utoipa::path(
    get,
    path = "/cobranzas",
    tag = "Cobranzas",
    responses((status = 200, description = "Todas as cobranzas", body = Vec<Collection>)),
    security(("api_jwt" = []))
)]
pub async fn list_collections(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let collections = app_state
        .collection_service
        .list()
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(collections))
}

#[utoipa::path(
    get,
    path = "/cobranzas/{id}",
    tag = "Cobranzas",
    params(("id" = i32, Path, description = "ID da cobranza")),
    responses(
        (status = 200, description = "Cobranza", body = Collection),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_collection(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    let collection = app_state
        .collection_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(collection))
}

#[utoipa::path(
    get,
    path = "/cobranzas/pedido/{id}",
    tag = "Cobranzas",
    params(("id" = i32, Path, description = "ID do pedido")),
    responses((status = 200, description = "Cobranzas do pedido", body = Vec<Collection>)),
    security(("api_jwt" = []))
)]
pub async fn collections_by_order(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    let collections = app_state
        .collection_service
        .by_order(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(collections))
}

#[utoipa::path(
    delete,
    path = "/cobranzas/{id}",
    tag = "Cobranzas",
    params(("id" = i32, Path, description = "ID da cobranza")),
    responses(
        (status = 204, description = "Cobranza excluída"),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_collection(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<Finance>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    app_state
        .collection_service
        .delete(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(StatusCode::NO_CONTENT)
}
