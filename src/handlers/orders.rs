// src/handlers/orders.rs

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
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{Admin, Leadership, OrderCreators, RequireRole},
    },
    models::order::{
        CreateOrderPayload, ExportOrdersPayload, OrderDetail, OrderListQuery, OrderPage,
        OrderSummary, UpdateOrderPayload,
    },
};

// POST /pedidos
#[utoipa::path(
    post,
    path = "/pedidos",
    tag = "Pedidos",
    request_body = CreateOrderPayload,
    responses(
        (status = 201, description = "Pedido criado com as comunidades", body = OrderDetail),
        (status = 400, description = "Comunidades repetidas ou quantidades negativas"),
        (status = 403, description = "Almacén não cria pedidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_order(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    _guard: RequireRole<OrderCreators>,
    Json(payload): Json<CreateOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let order = app_state
        .order_service
        .create(&caller, payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::created(order))
}

// GET /pedidos
#[utoipa::path(
    get,
    path = "/pedidos",
    tag = "Pedidos",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Página de pedidos, id desc", body = OrderPage),
        (status = 400, description = "Estatus desconhecido")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<OrderListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = app_state
        .order_service
        .list(&query)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(page))
}

// GET /pedidos/{id}
#[utoipa::path(
    get,
    path = "/pedidos/{id}",
    tag = "Pedidos",
    params(("id" = i32, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido com linhas e total", body = OrderDetail),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    let order = app_state
        .order_service
        .get_detail(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(order))
}

// PATCH /pedidos/{id}
#[utoipa::path(
    patch,
    path = "/pedidos/{id}",
    tag = "Pedidos",
    params(("id" = i32, Path, description = "ID do pedido")),
    request_body = UpdateOrderPayload,
    responses(
        (status = 200, description = "Pedido atualizado", body = OrderDetail),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_order(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<OrderCreators>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let order = app_state
        .order_service
        .update(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(order))
}

// DELETE /pedidos/{id}
#[utoipa::path(
    delete,
    path = "/pedidos/{id}",
    tag = "Pedidos",
    params(("id" = i32, Path, description = "ID do pedido")),
    responses(
        (status = 204, description = "Pedido, linhas e cobranzas excluídos"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_order(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<Admin>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    app_state
        .order_service
        .delete(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/pedidos/ruta/{id}",
    tag = "Pedidos",
    params(("id" = i32, Path, description = "ID da ruta")),
    responses((status = 200, description = "Pedidos da ruta", body = Vec<OrderSummary>)),
    security(("api_jwt" = []))
)]
pub async fn orders_by_route(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    let orders = app_state
        .order_service
        .by_route(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(orders))
}

#[utoipa::path(
    get,
    path = "/pedidos/ts/{id}",
    tag = "Pedidos",
    params(("id" = i32, Path, description = "ID do trabalhador social")),
    responses((status = 200, description = "Pedidos do trabalhador", body = Vec<OrderSummary>)),
    security(("api_jwt" = []))
)]
pub async fn orders_by_user(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    let orders = app_state
        .order_service
        .by_user(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(orders))
}

// POST /pedidos/export
#[utoipa::path(
    post,
    path = "/pedidos/export",
    tag = "Pedidos",
    request_body = ExportOrdersPayload,
    responses((status = 200, description = "Pedidos completos para exportação", body = Vec<OrderDetail>)),
    security(("api_jwt" = []))
)]
pub async fn export_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<ExportOrdersPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let orders = app_state
        .order_service
        .export(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(orders))
}

// PATCH /pedidos/rollback/{id}
#[utoipa::path(
    patch,
    path = "/pedidos/rollback/{id}",
    tag = "Pedidos",
    params(("id" = i32, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido volta a pendiente e libera nova cobranza", body = OrderSummary),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn rollback_order(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<Leadership>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    let order = app_state
        .order_service
        .rollback(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(order))
}
