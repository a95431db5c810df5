// src/common/error.rs

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::{common::response::Meta, middleware::i18n::Locale};

// Erros de domínio. A tradução para HTTP acontece em `to_api_error`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Campo obrigatório ausente: {0}")]
    MissingField(String),

    #[error("Requisição inválida: {0}")]
    BadRequest(String),

    #[error("ID inválido")]
    InvalidId,

    #[error("Corpo da requisição inválido: {0}")]
    InvalidBody(String),

    #[error("Parâmetros de consulta inválidos: {0}")]
    InvalidQuery(String),

    #[error("Recurso não encontrado: {0}")]
    NotFound(&'static str),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Conta não verificada")]
    AccountNotVerified,

    #[error("Token ausente")]
    TokenMissing,

    #[error("Formato de token inválido")]
    TokenMalformed,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não existe mais")]
    UserNoLongerExists,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Token de recuperação inválido ou expirado")]
    InvalidResetToken,

    #[error("Cobrança já gerada para o pedido {0}")]
    CollectionAlreadyGenerated(i32),

    #[error("Recurso em uso: {0}")]
    ResourceInUse(&'static str),

    #[error("Erro ao gerar PDF: {0}")]
    PdfError(String),

    #[error("Erro de armazenamento: {0}")]
    StorageError(String),

    #[error("Erro de e-mail: {0}")]
    MailError(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// Erro pronto para a resposta HTTP, já traduzido
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "status": "error",
            "error": ErrorBody {
                code: self.code,
                message: &self.message,
                details: self.details.as_ref(),
            },
            "meta": Meta::now(),
        }));
        (self.status, body).into_response()
    }
}

// Extratores e middlewares sem acesso ao Locale caem no espanhol
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default()).into_response()
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::BadRequest(_)
            | AppError::InvalidId
            | AppError::InvalidBody(_)
            | AppError::InvalidQuery(_)
            | AppError::InvalidResetToken => StatusCode::BAD_REQUEST,
            AppError::MissingField(_)
            | AppError::EmailAlreadyExists
            | AppError::UniqueConstraintViolation(_)
            | AppError::InvalidCredentials => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::TokenMissing | AppError::TokenMalformed | AppError::UserNoLongerExists => {
                StatusCode::UNAUTHORIZED
            }
            AppError::AccountNotVerified | AppError::InvalidToken | AppError::Forbidden => {
                StatusCode::FORBIDDEN
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::CollectionAlreadyGenerated(_) | AppError::ResourceInUse(_) => {
                StatusCode::CONFLICT
            }
            AppError::StorageError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::MissingField(_) => "MISSING_FIELD",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::InvalidId => "INVALID_ID",
            AppError::InvalidBody(_) => "INVALID_BODY",
            AppError::InvalidQuery(_) => "INVALID_QUERY",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",
            AppError::UniqueConstraintViolation(_) => "DUPLICATE",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::AccountNotVerified => "ACCOUNT_NOT_VERIFIED",
            AppError::TokenMissing => "TOKEN_MISSING",
            AppError::TokenMalformed => "TOKEN_MALFORMED",
            AppError::InvalidToken => "INVALID_TOKEN",
            AppError::UserNoLongerExists => "USER_NO_LONGER_EXISTS",
            AppError::Forbidden => "FORBIDDEN",
            AppError::InvalidResetToken => "INVALID_RESET_TOKEN",
            AppError::CollectionAlreadyGenerated(_) => "COLLECTION_ALREADY_GENERATED",
            AppError::ResourceInUse(_) => "RESOURCE_IN_USE",
            AppError::StorageError(_) => "STORAGE_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }

    fn message(&self, locale: &Locale) -> String {
        let en = locale.is_english();
        match self {
            AppError::ValidationError(_) => pick(en, "Uno o más campos son inválidos.", "One or more fields are invalid."),
            AppError::MissingField(field) => {
                if en { format!("The field '{}' is required.", field) } else { format!("El campo '{}' es obligatorio.", field) }
            }
            AppError::BadRequest(msg) => msg.clone(),
            AppError::InvalidId => pick(en, "ID inválido.", "Invalid ID."),
            AppError::InvalidBody(_) => pick(en, "El cuerpo de la solicitud no es un JSON válido.", "The request body is not valid JSON."),
            AppError::InvalidQuery(_) => pick(en, "Los parámetros de la consulta son inválidos.", "The query parameters are invalid."),
            AppError::NotFound(resource) => {
                if en { format!("{} not found.", resource) } else { format!("{} no encontrado.", resource) }
            }
            AppError::EmailAlreadyExists => pick(en, "El correo ya está registrado.", "Email is already registered."),
            AppError::UniqueConstraintViolation(_) => pick(en, "El registro ya existe.", "The record already exists."),
            AppError::InvalidCredentials => pick(en, "Credenciales incorrectas", "Invalid credentials"),
            AppError::AccountNotVerified => pick(en, "La cuenta aún no ha sido verificada.", "The account has not been verified yet."),
            AppError::TokenMissing => pick(en, "No autorizado: token no proporcionado.", "Unauthorized: token not provided."),
            AppError::TokenMalformed => pick(en, "No autorizado: formato de token inválido.", "Unauthorized: malformed token."),
            AppError::InvalidToken => pick(en, "Token inválido o expirado.", "Invalid or expired token."),
            AppError::UserNoLongerExists => pick(en, "El usuario ya no existe.", "The user no longer exists."),
            AppError::Forbidden => pick(en, "No tienes permiso para realizar esta acción.", "You are not allowed to perform this action."),
            AppError::InvalidResetToken => pick(en, "El enlace de recuperación es inválido o expiró.", "The reset link is invalid or has expired."),
            AppError::CollectionAlreadyGenerated(id) => {
                if en { format!("The collection for order {} was already generated.", id) } else { format!("La cobranza del pedido {} ya fue generada.", id) }
            }
            AppError::ResourceInUse(resource) => {
                if en { format!("{} is still referenced by other records.", resource) } else { format!("{} todavía está en uso por otros registros.", resource) }
            }
            AppError::StorageError(_) => pick(en, "No se pudo subir el archivo.", "The file could not be uploaded."),
            _ => pick(en, "Ocurrió un error inesperado.", "An unexpected error occurred."),
        }
    }

    pub fn to_api_error(&self, locale: &Locale) -> ApiError {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        // Detalhes campo a campo, como no validator
        let details = match self {
            AppError::ValidationError(errors) => {
                let mut details: HashMap<String, Vec<String>> = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                Some(json!(details))
            }
            AppError::InvalidBody(cause) | AppError::InvalidQuery(cause) => Some(json!({ "causa": cause })),
            _ => None,
        };

        ApiError {
            status,
            code: self.code(),
            message: self.message(locale),
            details,
        }
    }
}

fn pick(en: bool, es: &str, english: &str) -> String {
    if en { english.to_string() } else { es.to_string() }
}

// Postgres devolve o nome da constraint em violações de unicidade
pub fn unique_violation(e: &sqlx::Error) -> Option<String> {
    match e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            Some(db_err.constraint().unwrap_or_default().to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::MissingField("password".into()), StatusCode::UNPROCESSABLE_ENTITY)]
    #[case(AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST)]
    #[case(AppError::EmailAlreadyExists, StatusCode::UNPROCESSABLE_ENTITY)]
    #[case(AppError::InvalidCredentials, StatusCode::UNPROCESSABLE_ENTITY)]
    #[case(AppError::AccountNotVerified, StatusCode::FORBIDDEN)]
    #[case(AppError::TokenMissing, StatusCode::UNAUTHORIZED)]
    #[case(AppError::TokenMalformed, StatusCode::UNAUTHORIZED)]
    #[case(AppError::InvalidToken, StatusCode::FORBIDDEN)]
    #[case(AppError::InvalidId, StatusCode::BAD_REQUEST)]
    #[case(AppError::NotFound("Ruta"), StatusCode::NOT_FOUND)]
    #[case(AppError::CollectionAlreadyGenerated(3), StatusCode::CONFLICT)]
    #[case(AppError::PdfError("font".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn maps_errors_to_status(#[case] error: AppError, #[case] expected: StatusCode) {
        assert_eq!(error.to_api_error(&Locale::default()).status, expected);
    }

    #[test]
    fn login_failure_message_is_localized() {
        let es = AppError::InvalidCredentials.to_api_error(&Locale("es".into()));
        let en = AppError::InvalidCredentials.to_api_error(&Locale("en".into()));

        assert_eq!(es.message, "Credenciales incorrectas");
        assert_eq!(en.message, "Invalid credentials");
    }

    #[test]
    fn internal_errors_hide_their_cause() {
        let api_error = AppError::InternalServerError(anyhow::anyhow!("segredo")).to_api_error(&Locale::default());

        assert_eq!(api_error.code, "INTERNAL_ERROR");
        assert!(!api_error.message.contains("segredo"));
    }

    #[test]
    fn validation_errors_carry_field_details() {
        let mut errors = validator::ValidationErrors::new();
        let mut err = validator::ValidationError::new("required");
        err.message = Some("El nombre es obligatorio.".into());
        errors.add("nombre", err);

        let api_error = AppError::ValidationError(errors).to_api_error(&Locale::default());
        let details = api_error.details.expect("details");

        assert_eq!(details["nombre"][0], "El nombre es obligatorio.");
    }
}
