// src/common/extract.rs
//
// Json e Query do axum com rejeições no envelope de erro da API.

use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::{
    common::error::{ApiError, AppError},
    middleware::i18n::Locale,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let locale = Locale::from_headers(req.headers());
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Json(value)),
            Err(rejection) => {
                tracing::debug!("JSON rejeitado: {}", rejection.body_text());
                Err(AppError::InvalidBody(rejection.body_text()).to_api_error(&locale))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Query<T>(pub T);

impl<S, T> FromRequestParts<S> for Query<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Query::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Query(value)) => Ok(Query(value)),
            Err(rejection) => {
                let locale = Locale::from_headers(&parts.headers);
                Err(AppError::InvalidQuery(rejection.body_text()).to_api_error(&locale))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::header};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Payload {
        nombre: String,
    }

    #[derive(Debug, Deserialize)]
    struct Filters {
        page: Option<i64>,
    }

    fn json_request(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn accepts_well_formed_json() {
        let Json(payload) = Json::<Payload>::from_request(json_request(r#"{"nombre":"Ruta Norte"}"#), &())
            .await
            .unwrap();
        assert_eq!(payload.nombre, "Ruta Norte");
    }

    #[tokio::test]
    async fn broken_json_becomes_bad_request() {
        let err = Json::<Payload>::from_request(json_request("{not json"), &()).await.unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "INVALID_BODY");
        assert!(err.details.is_some());
    }

    #[tokio::test]
    async fn wrong_field_type_becomes_bad_request() {
        let err = Json::<Payload>::from_request(json_request(r#"{"nombre":123}"#), &()).await.unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "INVALID_BODY");
    }

    #[tokio::test]
    async fn non_numeric_query_becomes_bad_request() {
        let (mut parts, _) = Request::builder()
            .uri("/?page=abc")
            .header(header::ACCEPT_LANGUAGE, "en")
            .body(Body::empty())
            .unwrap()
            .into_parts();

        let err = Query::<Filters>::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "INVALID_QUERY");
        assert_eq!(err.message, "The query parameters are invalid.");
    }

    #[tokio::test]
    async fn missing_query_params_stay_optional() {
        let (mut parts, _) = Request::builder().uri("/").body(Body::empty()).unwrap().into_parts();
        let Query(filters) = Query::<Filters>::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(filters.page, None);
    }
}
