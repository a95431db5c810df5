// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role")]
pub enum UserRole {
    Direccion,
    Almacen,
    Ts,
    Coordinadora,
    Consejo,
    Contabilidad,
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,

    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub password_hash: String,

    #[serde(rename = "rol")]
    pub role: UserRole,
    #[serde(rename = "verificado")]
    pub verified: bool,
    #[serde(rename = "activo")]
    pub active: bool,

    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub reset_token: Option<String>,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub reset_token_expires_at: Option<DateTime<Utc>>,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Direccion
    }
}

// Senha e confirmação chegam opcionais: a ausência é 422, o resto é 400
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserPayload {
    #[validate(length(min = 1, max = 100, message = "El nombre de usuario es obligatorio."))]
    #[serde(default)]
    pub username: String,
    #[validate(email(message = "El correo no es válido."))]
    #[serde(default)]
    pub email: String,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(email(message = "El correo no es válido."))]
    #[serde(default)]
    pub email: String,
    #[validate(length(min = 1, message = "La contraseña es obligatoria."))]
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: String,
    pub user_id: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: User,
    pub access_token: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordPayload {
    #[validate(email(message = "El correo no es válido."))]
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordPayload {
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,
    pub rol: UserRole,
    pub exp: usize,
    pub iat: usize,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUserPayload {
    #[validate(length(min = 1, max = 100, message = "El nombre de usuario no puede estar vacío."))]
    pub username: Option<String>,
    #[validate(email(message = "El correo no es válido."))]
    pub email: Option<String>,
    #[validate(length(min = 6, message = "La contraseña debe tener al menos 6 caracteres."))]
    pub password: Option<String>,
    pub rol: Option<UserRole>,
    pub verificado: Option<bool>,
    pub activo: Option<bool>,
}

impl UpdateUserPayload {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.rol.is_none()
            && self.verificado.is_none()
            && self.activo.is_none()
    }

    pub fn touches_admin_fields(&self) -> bool {
        self.rol.is_some() || self.verificado.is_some() || self.activo.is_some()
    }
}

// Alterações já normalizadas (senha em hash) para o repositório
#[derive(Debug, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<UserRole>,
    pub verified: Option<bool>,
    pub active: Option<bool>,
}

// Aceita qualquer JSON para responder 400 (e não 422) quando não for booleano
#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyUserPayload {
    // Ausente vale true; null explícito chega como Value::Null e é rejeitado
    #[serde(default = "verified_by_default")]
    #[schema(value_type = Option<bool>)]
    pub verificado: Value,
}

fn verified_by_default() -> Value {
    Value::Bool(true)
}

impl VerifyUserPayload {
    pub fn verified_flag(&self) -> Option<bool> {
        self.verificado.as_bool()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_serialization_hides_secrets() {
        let now = Utc::now();
        let user = User {
            id: 1,
            username: "ana".into(),
            email: "ana@bamx.org".into(),
            password_hash: "hash".into(),
            role: UserRole::Ts,
            verified: true,
            active: true,
            reset_token: Some("abc".into()),
            reset_token_expires_at: Some(now),
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["rol"], "Ts");
        assert!(value.get("password_hash").is_none());
        assert!(value.get("reset_token").is_none());
    }

    #[test]
    fn verify_payload_defaults_to_true_and_rejects_non_booleans() {
        let empty: VerifyUserPayload = serde_json::from_value(json!({})).unwrap();
        let off: VerifyUserPayload = serde_json::from_value(json!({ "verificado": false })).unwrap();
        let text: VerifyUserPayload = serde_json::from_value(json!({ "verificado": "si" })).unwrap();

        assert_eq!(empty.verified_flag(), Some(true));
        assert_eq!(off.verified_flag(), Some(false));
        assert_eq!(text.verified_flag(), None);
    }

    #[test]
    fn verify_payload_rejects_explicit_null() {
        let null: VerifyUserPayload = serde_json::from_value(json!({ "verificado": null })).unwrap();
        let number: VerifyUserPayload = serde_json::from_value(json!({ "verificado": 1 })).unwrap();

        assert_eq!(null.verified_flag(), None);
        assert_eq!(number.verified_flag(), None);
    }

    #[test]
    fn update_payload_detects_admin_fields() {
        let own: UpdateUserPayload = serde_json::from_value(json!({ "username": "nuevo" })).unwrap();
        let promote: UpdateUserPayload = serde_json::from_value(json!({ "rol": "Direccion" })).unwrap();

        assert!(!own.touches_admin_fields());
        assert!(promote.touches_admin_fields());
        assert!(UpdateUserPayload::default().is_empty());
    }
}
