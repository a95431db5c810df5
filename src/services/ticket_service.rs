// src/services/ticket_service.rs

use crate::{
    common::error::AppError,
    db::{TicketRepository, UserRepository},
    models::{
        auth::User,
        ticket::{CreateTicketPayload, Ticket, TicketPriority, UpdateTicketPayload},
    },
    services::mail_service::{notify, MailService},
};

#[derive(Clone)]
pub struct TicketService {
    repo: TicketRepository,
    user_repo: UserRepository,
    mail: MailService,
}

impl TicketService {
    pub fn new(repo: TicketRepository, user_repo: UserRepository, mail: MailService) -> Self {
        Self { repo, user_repo, mail }
    }

    pub async fn create(&self, caller: &User, payload: CreateTicketPayload) -> Result<Ticket, AppError> {
        let description = payload
            .descripcion
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .ok_or_else(|| AppError::BadRequest("La descripción es obligatoria.".into()))?;

        // Só a Dirección abre ticket em nome de outra pessoa
        let user_id = match payload.id_usuario {
            Some(id) if id != caller.id && !caller.is_admin() => return Err(AppError::Forbidden),
            Some(id) => id,
            None => caller.id,
        };
        if user_id != caller.id && self.user_repo.find_by_id(user_id).await?.is_none() {
            return Err(AppError::NotFound("Usuario"));
        }

        let ticket = self
            .repo
            .create(user_id, &description, payload.prioridad.unwrap_or(TicketPriority::Baja))
            .await?;

        notify(self.mail.send_ticket_notification(&ticket, true).await, "ticket criado");
        tracing::info!("🎫 Ticket {} aberto por {}", ticket.id, caller.id);
        Ok(ticket)
    }

    pub async fn list(&self, caller: &User) -> Result<Vec<Ticket>, AppError> {
        if caller.is_admin() {
            self.repo.find_all().await
        } else {
            self.repo.find_by_user(caller.id).await
        }
    }

    pub async fn get(&self, caller: &User, id: i32) -> Result<Ticket, AppError> {
        let ticket = self.repo.find_by_id(id).await?.ok_or(AppError::NotFound("Ticket"))?;
        if !caller.is_admin() && ticket.user_id != caller.id {
            return Err(AppError::Forbidden);
        }
        Ok(ticket)
    }

    pub async fn update(&self, id: i32, payload: UpdateTicketPayload) -> Result<Ticket, AppError> {
        let changes = payload.parse().map_err(AppError::BadRequest)?;

        let ticket = self
            .repo
            .update(id, &changes)
            .await?
            .ok_or(AppError::NotFound("Ticket"))?;

        notify(self.mail.send_ticket_notification(&ticket, false).await, "ticket atualizado");
        tracing::info!("🎫 Ticket {} atualizado para {}", id, ticket.status.label());
        Ok(ticket)
    }
}

// Contra um Postgres real: DATABASE_URL definido e `cargo test -- --ignored`
#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::auth::UserRole, services::mail_service::LogMailer};
    use sqlx::PgPool;
    use std::sync::Arc;

    async fn setup(pool: &PgPool) -> (TicketService, User, User) {
        let users = UserRepository::new(pool.clone());
        let director = users
            .create_user(pool, "direccion", "direccion@bamx.org", "x", UserRole::Direccion)
            .await
            .unwrap();
        let worker = users
            .create_user(pool, "ts", "ts@bamx.org", "x", UserRole::Ts)
            .await
            .unwrap();
        let mail = MailService::new(Arc::new(LogMailer), "http://localhost:5173".into());
        let service = TicketService::new(TicketRepository::new(pool.clone()), users, mail);
        (service, director, worker)
    }

    fn payload(id_usuario: Option<i32>) -> CreateTicketPayload {
        CreateTicketPayload {
            descripcion: Some("La impresora no funciona".into()),
            prioridad: Some(TicketPriority::Alta),
            id_usuario,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requer Postgres (DATABASE_URL)"]
    async fn director_opens_ticket_for_another_user(pool: PgPool) {
        let (service, director, worker) = setup(&pool).await;

        let ticket = service.create(&director, payload(Some(worker.id))).await.unwrap();
        assert_eq!(ticket.user_id, worker.id);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requer Postgres (DATABASE_URL)"]
    async fn ticket_for_unknown_user_is_not_found(pool: PgPool) {
        let (service, director, _) = setup(&pool).await;

        let err = service.create(&director, payload(Some(999_999))).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("Usuario")));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requer Postgres (DATABASE_URL)"]
    async fn worker_cannot_open_ticket_for_someone_else(pool: PgPool) {
        let (service, director, worker) = setup(&pool).await;

        let err = service.create(&worker, payload(Some(director.id))).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }
}
