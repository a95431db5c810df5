// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{Claims, RegisterUserPayload, User, UserRole},
    services::mail_service::{notify, MailService},
};

pub const MIN_PASSWORD_LEN: usize = 6;
const RESET_TOKEN_TTL_HOURS: i64 = 1;

// Hash em thread separada: bcrypt é CPU-bound
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password_clone = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password_clone = password.to_owned();
    let hash_clone = password_hash.to_owned();
    let valid = tokio::task::spawn_blocking(move || verify(&password_clone, &hash_clone))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;
    Ok(valid)
}

/// Regras de senha no cadastro e no reset: ausente é 422, curta ou diferente é 400.
pub fn check_new_password(
    password: Option<&str>,
    confirm_password: Option<&str>,
) -> Result<String, AppError> {
    let password = password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::MissingField("password".into()))?;
    let confirm = confirm_password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::MissingField("confirmPassword".into()))?;

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "La contraseña debe tener al menos {} caracteres.",
            MIN_PASSWORD_LEN
        )));
    }
    if password != confirm {
        return Err(AppError::BadRequest("Las contraseñas no coinciden.".into()));
    }
    Ok(password.to_string())
}

pub fn create_token(user: &User, secret: &str, maxage_hours: i64) -> Result<String, AppError> {
    let now = Utc::now();
    let expires_at = now + chrono::Duration::hours(maxage_hours);

    let claims = Claims {
        sub: user.id,
        rol: user.role,
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?)
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::InvalidToken)
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    mail: MailService,
    jwt_secret: String,
    jwt_maxage_hours: i64,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        mail: MailService,
        jwt_secret: String,
        jwt_maxage_hours: i64,
    ) -> Self {
        Self { user_repo, mail, jwt_secret, jwt_maxage_hours }
    }

    pub fn jwt_maxage_hours(&self) -> i64 {
        self.jwt_maxage_hours
    }

    // Novo cadastro fica pendente até a Dirección verificar
    pub async fn register_user(&self, payload: &RegisterUserPayload) -> Result<User, AppError> {
        let password = check_new_password(payload.password.as_deref(), payload.confirm_password.as_deref())?;
        let hashed_password = hash_password(&password).await?;

        let user = self
            .user_repo
            .create_user(
                self.user_repo.pool(),
                payload.username.trim(),
                &payload.email.trim().to_lowercase(),
                &hashed_password,
                UserRole::Almacen,
            )
            .await?;

        tracing::info!("👤 Usuário {} registrado (pendente de verificação)", user.id);
        Ok(user)
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<(User, String), AppError> {
        let user = self
            .user_repo
            .find_by_email(email.trim())
            .await?
            .filter(|u| u.active)
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }
        if !user.verified {
            return Err(AppError::AccountNotVerified);
        }

        let token = create_token(&user, &self.jwt_secret, self.jwt_maxage_hours)?;
        Ok((user, token))
    }

    // Token válido + usuário ainda ativo
    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = decode_token(token, &self.jwt_secret)?;

        self.user_repo
            .find_by_id(claims.sub)
            .await?
            .filter(|u| u.active)
            .ok_or(AppError::UserNoLongerExists)
    }

    // Sempre responde igual para não revelar quais e-mails existem
    pub async fn forgot_password(&self, email: &str) -> Result<(), AppError> {
        let Some(user) = self
            .user_repo
            .find_by_email(email.trim())
            .await?
            .filter(|u| u.active && u.verified)
        else {
            tracing::warn!("Pedido de recuperação para e-mail desconhecido");
            return Ok(());
        };

        let token = Uuid::new_v4().simple().to_string();
        let expires_at = Utc::now() + chrono::Duration::hours(RESET_TOKEN_TTL_HOURS);
        self.user_repo.set_reset_token(user.id, &token, expires_at).await?;

        notify(self.mail.send_password_reset(&user, &token).await, "reset de senha");
        Ok(())
    }

    pub async fn reset_password(
        &self,
        token: &str,
        password: Option<&str>,
        confirm_password: Option<&str>,
    ) -> Result<(), AppError> {
        let password = check_new_password(password, confirm_password)?;

        let user = self
            .user_repo
            .find_by_reset_token(token)
            .await?
            .ok_or(AppError::InvalidResetToken)?;

        let hashed = hash_password(&password).await?;
        self.user_repo.reset_password(user.id, &hashed).await?;

        tracing::info!("🔑 Senha redefinida para o usuário {}", user.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn user(role: UserRole) -> User {
        let now = Utc::now();
        User {
            id: 42,
            username: "maria".into(),
            email: "maria@bamx.org".into(),
            password_hash: String::new(),
            role,
            verified: true,
            active: true,
            reset_token: None,
            reset_token_expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[rstest]
    #[case(None, Some("123456"), 422)]
    #[case(Some("123456"), None, 422)]
    #[case(Some("123"), Some("123"), 400)]
    #[case(Some("1234567"), Some("7654321"), 400)]
    fn rejects_bad_passwords(
        #[case] password: Option<&str>,
        #[case] confirm: Option<&str>,
        #[case] status: u16,
    ) {
        let err = check_new_password(password, confirm).unwrap_err();
        assert_eq!(err.status().as_u16(), status);
    }

    #[test]
    fn accepts_matching_password() {
        assert_eq!(check_new_password(Some("secreta"), Some("secreta")).unwrap(), "secreta");
    }

    #[test]
    fn token_round_trip_keeps_subject_and_role() {
        let token = create_token(&user(UserRole::Coordinadora), "segredo", 1).unwrap();
        let claims = decode_token(&token, "segredo").unwrap();

        assert_eq!(claims.sub, 42);
        assert_eq!(claims.rol, UserRole::Coordinadora);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let token = create_token(&user(UserRole::Ts), "segredo", 1).unwrap();

        assert!(matches!(decode_token(&token, "outro"), Err(AppError::InvalidToken)));
        assert!(matches!(decode_token("lixo", "segredo"), Err(AppError::InvalidToken)));
    }

    #[test]
    fn expired_token_is_invalid() {
        let token = create_token(&user(UserRole::Ts), "segredo", -2).unwrap();
        assert!(matches!(decode_token(&token, "segredo"), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn hashes_verify_against_plain_password() {
        let hashed = hash_password("secreta").await.unwrap();

        assert!(verify_password("secreta", &hashed).await.unwrap());
        assert!(!verify_password("errada", &hashed).await.unwrap());
    }
}
