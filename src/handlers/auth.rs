// src/handlers/auth.rs

use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    CookieJar,
};
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        extract::Json,
        response::{ApiResponse, MessageData},
    },
    config::AppState,
    middleware::{
        auth::{AuthenticatedUser, AUTH_COOKIE},
        i18n::Locale,
    },
    models::auth::{
        ForgotPasswordPayload, LoginResponse, LoginUserPayload, RegisterResponse,
        RegisterUserPayload, ResetPasswordPayload, User,
    },
};

const FORGOT_PASSWORD_MESSAGE: &str =
    "Si el correo está registrado, recibirás un enlace para restablecer tu contraseña.";

fn auth_cookie(token: String, production: bool, maxage_hours: i64) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Strict)
        .path("/")
        .secure(production)
        .max_age(time::Duration::hours(maxage_hours))
        .build()
}

// POST /auth/registro
#[utoipa::path(
    post,
    path = "/auth/registro",
    tag = "Auth",
    request_body = RegisterUserPayload,
    responses(
        (status = 201, description = "Usuário criado, pendente de verificação", body = RegisterResponse),
        (status = 400, description = "Senha curta, senhas diferentes ou campos inválidos"),
        (status = 422, description = "Senha ausente ou e-mail já cadastrado")
    )
)]
pub async fn register(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<RegisterUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let user = app_state
        .auth_service
        .register_user(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(ApiResponse::created(RegisterResponse {
        message: "Usuario registrado. Un administrador debe verificar la cuenta.".into(),
        user_id: user.id,
    }))
}

// POST /auth/login
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Login efetuado; cookie jwt definido", body = LoginResponse),
        (status = 403, description = "Conta não verificada"),
        (status = 422, description = "Credenciais incorretas")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    locale: Locale,
    jar: CookieJar,
    Json(payload): Json<LoginUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    // E-mail ou senha vazios caem na mesma resposta de credenciais
    if payload.validate().is_err() {
        return Err(AppError::InvalidCredentials.to_api_error(&locale));
    }

    let (user, token) = app_state
        .auth_service
        .login_user(&payload.email, &payload.password)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let cookie = auth_cookie(
        token.clone(),
        app_state.config.production,
        app_state.auth_service.jwt_maxage_hours(),
    );

    tracing::info!("🔓 Login do usuário {}", user.id);
    Ok((
        jar.add(cookie),
        ApiResponse::success(LoginResponse { user, access_token: token }),
    ))
}

// POST /auth/logout
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Auth",
    responses((status = 200, description = "Cookie removido", body = MessageData))
)]
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    // Sempre emite o cookie expirado, mesmo para clientes que usam o header
    let expired = Cookie::build((AUTH_COOKIE, ""))
        .http_only(true)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    (
        jar.add(expired),
        ApiResponse::success(MessageData::new("Sesión cerrada.")),
    )
}

// GET /auth/me
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Usuário autenticado", body = User),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []), ("cookie_jwt" = []))
)]
pub async fn get_me(AuthenticatedUser(user): AuthenticatedUser) -> impl IntoResponse {
    ApiResponse::success(user)
}

// POST /auth/forgot-password
#[utoipa::path(
    post,
    path = "/auth/forgot-password",
    tag = "Auth",
    request_body = ForgotPasswordPayload,
    responses((status = 200, description = "Resposta idêntica exista ou não o e-mail", body = MessageData))
)]
pub async fn forgot_password(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<ForgotPasswordPayload>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.validate().is_ok() {
        app_state
            .auth_service
            .forgot_password(&payload.email)
            .await
            .map_err(|e| e.to_api_error(&locale))?;
    }
    Ok(ApiResponse::success(MessageData::new(FORGOT_PASSWORD_MESSAGE)))
}

// POST /auth/reset-password/{token}
#[utoipa::path(
    post,
    path = "/auth/reset-password/{token}",
    tag = "Auth",
    params(("token" = String, Path, description = "Token recebido por e-mail")),
    request_body = ResetPasswordPayload,
    responses(
        (status = 200, description = "Senha redefinida", body = MessageData),
        (status = 400, description = "Token inválido/expirado ou senha rejeitada")
    )
)]
pub async fn reset_password(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(token): Path<String>,
    Json(payload): Json<ResetPasswordPayload>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .auth_service
        .reset_password(
            &token,
            payload.password.as_deref(),
            payload.confirm_password.as_deref(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(ApiResponse::success(MessageData::new("Contraseña actualizada.")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_cookie_flags() {
        let cookie = auth_cookie("abc".into(), true, 2);

        assert_eq!(cookie.name(), "jwt");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::hours(2)));
    }
}
