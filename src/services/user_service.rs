// src/services/user_service.rs

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{UpdateUserPayload, User, UserChanges},
    services::{
        auth::hash_password,
        mail_service::{notify, MailService},
    },
};

#[derive(Clone)]
pub struct UserService {
    repo: UserRepository,
    mail: MailService,
}

impl UserService {
    pub fn new(repo: UserRepository, mail: MailService) -> Self {
        Self { repo, mail }
    }

    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        self.repo.find_all().await
    }

    pub async fn get(&self, id: i32) -> Result<User, AppError> {
        self.repo.find_by_id(id).await?.ok_or(AppError::NotFound("Usuario"))
    }

    pub async fn pending(&self) -> Result<Vec<User>, AppError> {
        self.repo.find_pending().await
    }

    pub async fn with_orders(&self) -> Result<Vec<User>, AppError> {
        self.repo.find_with_orders().await
    }

    /// Atualização parcial. `is_admin` decide se rol/verificado/activo podem ser alterados.
    pub async fn update(
        &self,
        id: i32,
        payload: UpdateUserPayload,
        is_admin: bool,
    ) -> Result<User, AppError> {
        if payload.is_empty() {
            return Err(AppError::BadRequest("No se enviaron campos para actualizar.".into()));
        }
        if payload.touches_admin_fields() && !is_admin {
            return Err(AppError::Forbidden);
        }

        let before = self.get(id).await?;

        let password_hash = match payload.password.as_deref() {
            Some(password) => Some(hash_password(password).await?),
            None => None,
        };
        let changes = UserChanges {
            username: payload.username.map(|u| u.trim().to_string()),
            email: payload.email.map(|e| e.trim().to_lowercase()),
            password_hash,
            role: payload.rol,
            verified: payload.verificado,
            active: payload.activo,
        };

        let user = self
            .repo
            .update_user(id, &changes)
            .await?
            .ok_or(AppError::NotFound("Usuario"))?;

        if user.verified && !before.verified {
            notify(self.mail.send_account_verified(&user).await, "verificação de conta");
        }

        tracing::info!("✏️ Usuário {} atualizado", id);
        Ok(user)
    }

    pub async fn verify(&self, id: i32, verified: bool) -> Result<User, AppError> {
        let changes = UserChanges { verified: Some(verified), ..Default::default() };
        let user = self
            .repo
            .update_user(id, &changes)
            .await?
            .ok_or(AppError::NotFound("Usuario"))?;

        if verified {
            notify(self.mail.send_account_verified(&user).await, "verificação de conta");
        }
        tracing::info!("✅ Usuário {} verificado={}", id, verified);
        Ok(user)
    }

    // Exclusão lógica: o histórico de pedidos continua apontando para o usuário
    pub async fn deactivate(&self, id: i32) -> Result<(), AppError> {
        let changes = UserChanges { active: Some(false), ..Default::default() };
        self.repo
            .update_user(id, &changes)
            .await?
            .ok_or(AppError::NotFound("Usuario"))?;

        tracing::info!("🗑️ Usuário {} desativado", id);
        Ok(())
    }
}
