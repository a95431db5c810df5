// src/middleware/auth.rs

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use crate::{common::error::AppError, config::AppState, models::auth::User};

pub const AUTH_COOKIE: &str = "jwt";
const TOKEN_HEADER: &str = "token";

/// Procura o token no cookie `jwt`, depois no header `token` e por fim no `Authorization`.
/// Headers precisam vir como `Bearer <token>`.
pub fn extract_token(jar: &CookieJar, headers: &HeaderMap) -> Result<String, AppError> {
    if let Some(cookie) = jar.get(AUTH_COOKIE).filter(|c| !c.value().is_empty()) {
        return Ok(cookie.value().to_string());
    }

    let raw = headers
        .get(TOKEN_HEADER)
        .or_else(|| headers.get(header::AUTHORIZATION))
        .ok_or(AppError::TokenMissing)?
        .to_str()
        .map_err(|_| AppError::TokenMalformed)?;

    raw.strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .ok_or(AppError::TokenMalformed)
}

// Valida o token e deixa o usuário nas extensions da requisição
pub async fn auth_guard(
    State(app_state): State<AppState>,
    jar: CookieJar,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(&jar, request.headers())?;
    let user = app_state.auth_service.validate_token(&token).await?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

// Extrator para obter o usuário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::TokenMissing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum_extra::extract::cookie::Cookie;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn cookie_wins_over_headers() {
        let jar = CookieJar::new().add(Cookie::new(AUTH_COOKIE, "from-cookie"));
        let token = extract_token(&jar, &headers(&[("authorization", "Bearer from-header")])).unwrap();

        assert_eq!(token, "from-cookie");
    }

    #[test]
    fn token_header_is_checked_before_authorization() {
        let map = headers(&[("token", "Bearer legacy"), ("authorization", "Bearer standard")]);

        assert_eq!(extract_token(&CookieJar::new(), &map).unwrap(), "legacy");
    }

    #[test]
    fn missing_token_and_bad_scheme() {
        let jar = CookieJar::new();

        assert!(matches!(extract_token(&jar, &HeaderMap::new()), Err(AppError::TokenMissing)));
        assert!(matches!(
            extract_token(&jar, &headers(&[("authorization", "Basic abc")])),
            Err(AppError::TokenMalformed)
        ));
        assert!(matches!(
            extract_token(&jar, &headers(&[("authorization", "Bearer ")])),
            Err(AppError::TokenMalformed)
        ));
    }
}
