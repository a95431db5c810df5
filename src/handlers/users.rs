// src/handlers/users.rs

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
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{ensure_self_or_admin, Admin, RequireRole},
    },
    models::auth::{UpdateUserPayload, User, VerifyUserPayload},
};

// GET /usuarios
#[utoipa::path(
    get,
    path = "/usuarios",
    tag = "Usuarios",
    responses(
        (status = 200, description = "Todos os usuários", body = Vec<User>),
        (status = 403, description = "Apenas Dirección")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<Admin>,
) -> Result<impl IntoResponse, ApiError> {
    let users = app_state
        .user_service
        .list()
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(users))
}

// GET /usuarios/{id}
#[utoipa::path(
    get,
    path = "/usuarios/{id}",
    tag = "Usuarios",
    params(("id" = i32, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Usuário", body = User),
        (status = 400, description = "ID inválido"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_user(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    ensure_self_or_admin(&caller, id).map_err(|e| e.to_api_error(&locale))?;

    let user = app_state
        .user_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(user))
}

// PATCH /usuarios/{id}
#[utoipa::path(
    patch,
    path = "/usuarios/{id}",
    tag = "Usuarios",
    params(("id" = i32, Path, description = "ID do usuário")),
    request_body = UpdateUserPayload,
    responses(
        (status = 200, description = "Usuário atualizado", body = User),
        (status = 400, description = "Corpo vazio ou inválido"),
        (status = 403, description = "Só o próprio usuário ou a Dirección")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_user(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    ensure_self_or_admin(&caller, id).map_err(|e| e.to_api_error(&locale))?;
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let user = app_state
        .user_service
        .update(id, payload, caller.is_admin())
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(user))
}

// DELETE /usuarios/{id}
#[utoipa::path(
    delete,
    path = "/usuarios/{id}",
    tag = "Usuarios",
    params(("id" = i32, Path, description = "ID do usuário")),
    responses(
        (status = 204, description = "Usuário desativado"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_user(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<Admin>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    app_state
        .user_service
        .deactivate(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(StatusCode::NO_CONTENT)
}

// PATCH /usuarios/{id}/verificar
#[utoipa::path(
    patch,
    path = "/usuarios/{id}/verificar",
    tag = "Usuarios",
    params(("id" = i32, Path, description = "ID do usuário")),
    request_body = VerifyUserPayload,
    responses(
        (status = 200, description = "Estado de verificação alterado", body = User),
        (status = 400, description = "verificado não é booleano")
    ),
    security(("api_jwt" = []))
)]
pub async fn verify_user(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<Admin>,
    Path(id): Path<String>,
    Json(payload): Json<VerifyUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    let verified = payload.verified_flag().ok_or_else(|| {
        AppError::BadRequest("El campo 'verificado' debe ser booleano.".into()).to_api_error(&locale)
    })?;

    let user = app_state
        .user_service
        .verify(id, verified)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(user))
}

// GET /usuarios/todos/pendientes
#[utoipa::path(
    get,
    path = "/usuarios/todos/pendientes",
    tag = "Usuarios",
    responses((status = 200, description = "Usuários ativos ainda não verificados", body = Vec<User>)),
    security(("api_jwt" = []))
)]
pub async fn pending_users(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<Admin>,
) -> Result<impl IntoResponse, ApiError> {
    let users = app_state
        .user_service
        .pending()
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(users))
}

// GET /usuarios/todos/conPedidos
#[utoipa::path(
    get,
    path = "/usuarios/todos/conPedidos",
    tag = "Usuarios",
    responses((status = 200, description = "Usuários com ao menos um pedido", body = Vec<User>)),
    security(("api_jwt" = []))
)]
pub async fn users_with_orders(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let users = app_state
        .user_service
        .with_orders()
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(users))
}
