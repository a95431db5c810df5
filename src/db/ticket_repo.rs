// src/db/ticket_repo.rs

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    models::ticket::{Ticket, TicketChanges, TicketPriority},
};

const TICKET_SELECT: &str = r#"
    SELECT
        t.id, t.user_id, t.status, t.priority, t.description, t.comments,
        u.username, u.email,
        t.created_at, t.updated_at
    FROM tickets t
    JOIN users u ON u.id = t.user_id
"#;

#[derive(Clone)]
pub struct TicketRepository {
    pool: PgPool,
}

impl TicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user_id: i32,
        description: &str,
        priority: TicketPriority,
    ) -> Result<Ticket, AppError> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO tickets (user_id, description, priority) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(user_id)
        .bind(description)
        .bind(priority)
        .fetch_one(&self.pool)
        .await?;

        self.find_by_id(id).await?.ok_or(AppError::NotFound("Ticket"))
    }

    pub async fn find_all(&self) -> Result<Vec<Ticket>, AppError> {
        let sql = format!("{} ORDER BY t.created_at DESC", TICKET_SELECT);
        let tickets = sqlx::query_as::<_, Ticket>(&sql).fetch_all(&self.pool).await?;
        Ok(tickets)
    }

    pub async fn find_by_user(&self, user_id: i32) -> Result<Vec<Ticket>, AppError> {
        let sql = format!("{} WHERE t.user_id = $1 ORDER BY t.created_at DESC", TICKET_SELECT);
        let tickets = sqlx::query_as::<_, Ticket>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(tickets)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Ticket>, AppError> {
        let sql = format!("{} WHERE t.id = $1", TICKET_SELECT);
        let ticket = sqlx::query_as::<_, Ticket>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(ticket)
    }

    pub async fn update(&self, id: i32, changes: &TicketChanges) -> Result<Option<Ticket>, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE tickets SET
                status = COALESCE($2, status),
                priority = COALESCE($3, priority),
                comments = COALESCE($4, comments),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(changes.status)
        .bind(changes.priority)
        .bind(changes.comments.as_deref())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }
}
